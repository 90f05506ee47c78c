use anyhow::{anyhow, Context, Result};
use flate2::read::GzDecoder;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

static TYPE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(artists|releases|masters|labels)").unwrap());
static DATE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"discogs_(\d{4})(\d{2})").unwrap());

/// Which entity type a dump file contains, and therefore which tables it
/// feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DumpType {
    Artists,
    Labels,
    Masters,
    Releases,
}

impl DumpType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Artists => "artists",
            Self::Labels => "labels",
            Self::Masters => "masters",
            Self::Releases => "releases",
        }
    }
}

impl fmt::Display for DumpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The basename of a monthly dump, e.g. `discogs_202403_artists.xml.gz`.
#[derive(Debug, Clone)]
pub struct DumpFilename(String);

impl DumpFilename {
    pub fn new(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self(name)
    }

    pub fn gzipped(&self) -> bool {
        self.0.ends_with(".gz")
    }

    pub fn dump_type(&self) -> Result<DumpType> {
        let captures = TYPE_PATTERN
            .captures(&self.0)
            .ok_or_else(|| anyhow!("cannot determine dump type from filename: {}", self.0))?;
        Ok(match &captures[1] {
            "artists" => DumpType::Artists,
            "labels" => DumpType::Labels,
            "masters" => DumpType::Masters,
            "releases" => DumpType::Releases,
            _ => unreachable!(),
        })
    }

    pub fn year(&self) -> Option<&str> {
        DATE_PATTERN
            .captures(&self.0)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
    }

    pub fn month(&self) -> Option<&str> {
        DATE_PATTERN
            .captures(&self.0)
            .and_then(|c| c.get(2))
            .map(|m| m.as_str())
    }
}

impl fmt::Display for DumpFilename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A dump file opened for reading. Inflates transparently when the filename
/// ends in `.gz`. Forward-only; the decoder owns it for the whole run.
pub struct DumpFile {
    inner: Box<dyn Read + Send>,
}

impl fmt::Debug for DumpFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DumpFile").finish_non_exhaustive()
    }
}

impl DumpFile {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("could not open dump file: {}", path.display()))?;

        let inner: Box<dyn Read + Send> = if DumpFilename::new(path).gzipped() {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };

        Ok(Self { inner })
    }
}

impl Read for DumpFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}
