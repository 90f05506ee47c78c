//! Pull-based entity decoder for Discogs dumps.
//!
//! `EntityReader` drives a streaming XML tokenizer over the (possibly
//! gzipped) dump and yields one typed entity per top-level `artist`,
//! `label`, `master` or `release` element. Each recognized element is
//! deserialized by recursive descent over its subtree; anything else at the
//! outer level (the root wrapper, whitespace, comments) is passed over, and
//! unknown children inside an entity are skipped. Entities come out already
//! normalized (empty text and sentinel zeros collapsed to absent).

use crate::dump::DumpFile;
use crate::models::{
    Artist, Company, ExtraArtist, Format, Identifier, Label, Master, MasterArtist, NameRef,
    Release, ReleaseLabel, Serie, SubTrack, Track, Video,
};
use anyhow::{bail, Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One top-level record from a dump.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Artist(Artist),
    Label(Label),
    Master(Master),
    Release(Release),
}

/// Lazy iterator of entities over a byte stream.
pub struct EntityReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
}

impl EntityReader<BufReader<DumpFile>> {
    /// Open a dump file (gzip-inflating by extension) and decode it.
    pub fn open(path: &Path) -> Result<Self> {
        let dump = DumpFile::open(path)?;
        Ok(Self::from_reader(BufReader::new(dump)))
    }
}

impl<R: BufRead> EntityReader<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader: Reader::from_reader(reader),
            buf: Vec::with_capacity(1024),
        }
    }

    fn next_entity(&mut self) -> Result<Option<Entity>> {
        loop {
            self.buf.clear();
            let event = read_event(&mut self.reader, &mut self.buf)?;
            match event {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"artist" => {
                        let mut artist = parse_artist(&mut self.reader)?;
                        artist.normalize();
                        return Ok(Some(Entity::Artist(artist)));
                    }
                    b"label" => {
                        let mut label = parse_label(&mut self.reader)?;
                        label.normalize();
                        return Ok(Some(Entity::Label(label)));
                    }
                    b"master" => {
                        let mut master = parse_master(&mut self.reader, &e)?;
                        master.normalize();
                        return Ok(Some(Entity::Master(master)));
                    }
                    b"release" => {
                        let mut release = parse_release(&mut self.reader, &e)?;
                        release.normalize();
                        return Ok(Some(Entity::Release(release)));
                    }
                    // Root wrapper (<artists>, <releases>, ...) or an
                    // unrecognized element: descend and keep scanning.
                    _ => {}
                },
                Event::Eof => return Ok(None),
                _ => {}
            }
        }
    }
}

impl<R: BufRead> Iterator for EntityReader<R> {
    type Item = Result<Entity>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entity().transpose()
    }
}

// ---------------------------------------------------------------------------
// Event helpers
// ---------------------------------------------------------------------------

fn read_event<'b, R: BufRead>(reader: &mut Reader<R>, buf: &'b mut Vec<u8>) -> Result<Event<'b>> {
    match reader.read_event_into(buf) {
        Ok(event) => Ok(event),
        Err(e) => {
            let position = reader.buffer_position();
            bail!("XML parse error at byte {position}: {e}")
        }
    }
}

/// Consume events up to and including the end tag of the element the reader
/// is currently inside.
fn skip_to_end<R: BufRead>(reader: &mut Reader<R>) -> Result<()> {
    let mut depth = 1usize;
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match read_event(reader, &mut buf)? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            Event::Eof => bail!("unexpected end of input"),
            _ => {}
        }
    }
}

/// Accumulated character data of the current element.
fn read_text<R: BufRead>(reader: &mut Reader<R>) -> Result<String> {
    let mut text = String::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match read_event(reader, &mut buf)? {
            Event::Text(e) => text.push_str(&e.unescape().context("invalid XML text")?),
            Event::CData(e) => text.push_str(&String::from_utf8_lossy(&e)),
            Event::Start(_) => skip_to_end(reader)?,
            Event::End(_) => return Ok(text),
            Event::Eof => bail!("unexpected end of input inside a text element"),
            _ => {}
        }
    }
}

fn read_i64<R: BufRead>(reader: &mut Reader<R>) -> Result<i64> {
    let text = read_text(reader)?;
    text.trim()
        .parse()
        .with_context(|| format!("expected an integer, got {text:?}"))
}

fn read_opt_i64<R: BufRead>(reader: &mut Reader<R>) -> Result<Option<i64>> {
    let text = read_text(reader)?;
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    let parsed = text
        .parse()
        .with_context(|| format!("expected an integer, got {text:?}"))?;
    Ok(Some(parsed))
}

fn read_opt_i32<R: BufRead>(reader: &mut Reader<R>) -> Result<Option<i32>> {
    let text = read_text(reader)?;
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    let parsed = text
        .parse()
        .with_context(|| format!("expected an integer, got {text:?}"))?;
    Ok(Some(parsed))
}

fn attr_text(e: &BytesStart, name: &str) -> Result<Option<String>> {
    let attr = e
        .try_get_attribute(name)
        .with_context(|| format!("malformed attribute {name:?}"))?;
    match attr {
        Some(attr) => {
            let value = attr
                .unescape_value()
                .with_context(|| format!("invalid value for attribute {name:?}"))?;
            Ok(Some(value.into_owned()))
        }
        None => Ok(None),
    }
}

fn attr_i64(e: &BytesStart, name: &str) -> Result<Option<i64>> {
    match attr_text(e, name)? {
        Some(value) if !value.trim().is_empty() => {
            let parsed = value
                .trim()
                .parse()
                .with_context(|| format!("attribute {name:?} is not an integer: {value:?}"))?;
            Ok(Some(parsed))
        }
        _ => Ok(None),
    }
}

fn attr_i32(e: &BytesStart, name: &str) -> Result<Option<i32>> {
    match attr_text(e, name)? {
        Some(value) if !value.trim().is_empty() => {
            let parsed = value
                .trim()
                .parse()
                .with_context(|| format!("attribute {name:?} is not an integer: {value:?}"))?;
            Ok(Some(parsed))
        }
        _ => Ok(None),
    }
}

fn attr_bool(e: &BytesStart, name: &str) -> Result<bool> {
    Ok(matches!(
        attr_text(e, name)?.as_deref(),
        Some("1") | Some("true")
    ))
}

/// Walk a wrapper element and parse every child named `child`. The parser
/// callback receives the child's start tag and whether it was self-closing;
/// for a non-self-closing child it must consume through the child's end tag.
fn read_list<R: BufRead, T>(
    reader: &mut Reader<R>,
    child: &[u8],
    mut parse: impl FnMut(&mut Reader<R>, &BytesStart, bool) -> Result<T>,
) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match read_event(reader, &mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == child => {
                items.push(parse(reader, &e, false)?)
            }
            Event::Empty(e) if e.local_name().as_ref() == child => {
                items.push(parse(reader, &e, true)?)
            }
            Event::Start(_) => skip_to_end(reader)?,
            Event::End(_) => return Ok(items),
            Event::Eof => bail!("unexpected end of input inside a list element"),
            _ => {}
        }
    }
}

fn read_text_list<R: BufRead>(reader: &mut Reader<R>, child: &[u8]) -> Result<Vec<String>> {
    read_list(reader, child, |r, _e, empty| {
        if empty {
            Ok(String::new())
        } else {
            read_text(r)
        }
    })
}

/// Children of the shape `<name id="7">X</name>`.
fn read_name_refs<R: BufRead>(reader: &mut Reader<R>, child: &[u8]) -> Result<Vec<NameRef>> {
    read_list(reader, child, |r, e, empty| {
        let id = attr_i64(e, "id")?.unwrap_or(0);
        let name = if empty { String::new() } else { read_text(r)? };
        Ok(NameRef { id, name })
    })
}

// ---------------------------------------------------------------------------
// Entity parsers
// ---------------------------------------------------------------------------

fn parse_artist<R: BufRead>(reader: &mut Reader<R>) -> Result<Artist> {
    let mut artist = Artist::default();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match read_event(reader, &mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"id" => artist.id = read_i64(reader)?,
                b"name" => artist.name = read_text(reader)?,
                b"realname" => artist.real_name = Some(read_text(reader)?),
                b"profile" => artist.profile = Some(read_text(reader)?),
                b"data_quality" => artist.data_quality = read_text(reader)?,
                b"urls" => artist.urls = read_text_list(reader, b"url")?,
                b"namevariations" => artist.name_variations = read_text_list(reader, b"name")?,
                b"aliases" => artist.aliases = read_name_refs(reader, b"name")?,
                b"members" => artist.members = read_name_refs(reader, b"name")?,
                b"groups" => artist.groups = read_name_refs(reader, b"name")?,
                _ => skip_to_end(reader)?,
            },
            Event::End(_) => return Ok(artist),
            Event::Eof => bail!("unexpected end of input inside <artist>"),
            _ => {}
        }
    }
}

fn parse_label<R: BufRead>(reader: &mut Reader<R>) -> Result<Label> {
    let mut label = Label::default();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match read_event(reader, &mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"id" => label.id = read_i64(reader)?,
                b"name" => label.name = read_text(reader)?,
                b"contactinfo" => label.contact_info = Some(read_text(reader)?),
                b"profile" => label.profile = Some(read_text(reader)?),
                b"data_quality" => label.data_quality = read_text(reader)?,
                b"urls" => label.urls = read_text_list(reader, b"url")?,
                b"sublabels" => label.sub_labels = read_name_refs(reader, b"label")?,
                b"parentLabel" => {
                    label.parent_label_id = attr_i64(&e, "id")?;
                    // the parent's display name is not stored
                    skip_to_end(reader)?;
                }
                _ => skip_to_end(reader)?,
            },
            Event::Empty(e) => {
                if e.local_name().as_ref() == b"parentLabel" {
                    label.parent_label_id = attr_i64(&e, "id")?;
                }
            }
            Event::End(_) => return Ok(label),
            Event::Eof => bail!("unexpected end of input inside <label>"),
            _ => {}
        }
    }
}

fn parse_master<R: BufRead>(reader: &mut Reader<R>, start: &BytesStart) -> Result<Master> {
    let mut master = Master {
        id: attr_i64(start, "id")?.unwrap_or(0),
        ..Master::default()
    };
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match read_event(reader, &mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"title" => master.title = read_text(reader)?,
                b"year" => master.year = read_opt_i32(reader)?,
                b"main_release" => master.main_release_id = read_opt_i64(reader)?,
                b"data_quality" => master.data_quality = read_text(reader)?,
                b"notes" => master.notes = Some(read_text(reader)?),
                b"artists" => {
                    master.artists =
                        read_list(reader, b"artist", |r, _e, empty| parse_master_artist(r, empty))?
                }
                b"videos" => master.videos = read_list(reader, b"video", parse_video)?,
                b"genres" => master.genres = read_text_list(reader, b"genre")?,
                b"styles" => master.styles = read_text_list(reader, b"style")?,
                _ => skip_to_end(reader)?,
            },
            Event::End(_) => return Ok(master),
            Event::Eof => bail!("unexpected end of input inside <master>"),
            _ => {}
        }
    }
}

fn parse_release<R: BufRead>(reader: &mut Reader<R>, start: &BytesStart) -> Result<Release> {
    let mut release = Release {
        id: attr_i64(start, "id")?.unwrap_or(0),
        status: attr_text(start, "status")?.unwrap_or_default(),
        ..Release::default()
    };
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match read_event(reader, &mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"title" => release.title = read_text(reader)?,
                b"country" => release.country = Some(read_text(reader)?),
                b"released" => release.released = Some(read_text(reader)?),
                b"notes" => release.notes = Some(read_text(reader)?),
                b"data_quality" => release.data_quality = read_text(reader)?,
                b"master_id" => {
                    release.is_main_release = attr_bool(&e, "is_main_release")?;
                    release.master_id = read_opt_i64(reader)?;
                }
                b"artists" => {
                    release.artists =
                        read_list(reader, b"artist", |r, _e, empty| parse_master_artist(r, empty))?
                }
                b"extraartists" => {
                    release.extra_artists =
                        read_list(reader, b"artist", |r, _e, empty| parse_extra_artist(r, empty))?
                }
                b"labels" => release.labels = read_list(reader, b"label", parse_release_label)?,
                b"formats" => release.formats = read_list(reader, b"format", parse_format)?,
                b"genres" => release.genres = read_text_list(reader, b"genre")?,
                b"styles" => release.styles = read_text_list(reader, b"style")?,
                b"identifiers" => {
                    release.identifiers = read_list(reader, b"identifier", parse_identifier)?
                }
                b"videos" => release.videos = read_list(reader, b"video", parse_video)?,
                b"tracklist" => {
                    release.tracklist =
                        read_list(reader, b"track", |r, _e, empty| parse_track(r, empty))?
                }
                b"companies" => {
                    release.companies =
                        read_list(reader, b"company", |r, _e, empty| parse_company(r, empty))?
                }
                b"series" => release.series = read_list(reader, b"serie", parse_serie)?,
                _ => skip_to_end(reader)?,
            },
            Event::End(_) => return Ok(release),
            Event::Eof => bail!("unexpected end of input inside <release>"),
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Sub-record parsers
// ---------------------------------------------------------------------------

fn parse_master_artist<R: BufRead>(reader: &mut Reader<R>, empty: bool) -> Result<MasterArtist> {
    let mut artist = MasterArtist::default();
    if empty {
        return Ok(artist);
    }
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match read_event(reader, &mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"id" => artist.id = read_i64(reader)?,
                b"name" => artist.name = read_text(reader)?,
                b"anv" => artist.anv = Some(read_text(reader)?),
                b"join" => artist.join = Some(read_text(reader)?),
                _ => skip_to_end(reader)?,
            },
            Event::End(_) => return Ok(artist),
            Event::Eof => bail!("unexpected end of input inside an artist credit"),
            _ => {}
        }
    }
}

fn parse_extra_artist<R: BufRead>(reader: &mut Reader<R>, empty: bool) -> Result<ExtraArtist> {
    let mut artist = ExtraArtist::default();
    if empty {
        return Ok(artist);
    }
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match read_event(reader, &mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"id" => artist.id = read_i64(reader)?,
                b"name" => artist.name = read_text(reader)?,
                b"anv" => artist.anv = Some(read_text(reader)?),
                b"role" => artist.role = Some(read_text(reader)?),
                _ => skip_to_end(reader)?,
            },
            Event::End(_) => return Ok(artist),
            Event::Eof => bail!("unexpected end of input inside an artist credit"),
            _ => {}
        }
    }
}

fn parse_video<R: BufRead>(reader: &mut Reader<R>, start: &BytesStart, empty: bool) -> Result<Video> {
    let mut video = Video {
        src: attr_text(start, "src")?.unwrap_or_default(),
        duration: attr_i32(start, "duration")?.unwrap_or(0),
        embed: attr_text(start, "embed")?.unwrap_or_default(),
        ..Video::default()
    };
    if empty {
        return Ok(video);
    }
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match read_event(reader, &mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"title" => video.title = read_text(reader)?,
                b"description" => video.description = read_text(reader)?,
                _ => skip_to_end(reader)?,
            },
            Event::End(_) => return Ok(video),
            Event::Eof => bail!("unexpected end of input inside <video>"),
            _ => {}
        }
    }
}

fn parse_format<R: BufRead>(
    reader: &mut Reader<R>,
    start: &BytesStart,
    empty: bool,
) -> Result<Format> {
    let mut format = Format {
        name: attr_text(start, "name")?.unwrap_or_default(),
        qty: attr_text(start, "qty")?.unwrap_or_default(),
        text: attr_text(start, "text")?.unwrap_or_default(),
        ..Format::default()
    };
    if empty {
        return Ok(format);
    }
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match read_event(reader, &mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"descriptions" => format.descriptions = read_text_list(reader, b"description")?,
                _ => skip_to_end(reader)?,
            },
            Event::End(_) => return Ok(format),
            Event::Eof => bail!("unexpected end of input inside <format>"),
            _ => {}
        }
    }
}

fn parse_identifier<R: BufRead>(
    reader: &mut Reader<R>,
    start: &BytesStart,
    empty: bool,
) -> Result<Identifier> {
    let identifier = Identifier {
        r#type: attr_text(start, "type")?.unwrap_or_default(),
        description: attr_text(start, "description")?,
        value: attr_text(start, "value")?.unwrap_or_default(),
    };
    if !empty {
        skip_to_end(reader)?;
    }
    Ok(identifier)
}

fn parse_release_label<R: BufRead>(
    reader: &mut Reader<R>,
    start: &BytesStart,
    empty: bool,
) -> Result<ReleaseLabel> {
    let label = ReleaseLabel {
        id: attr_i64(start, "id")?.unwrap_or(0),
        name: attr_text(start, "name")?.unwrap_or_default(),
        catno: attr_text(start, "catno")?,
    };
    if !empty {
        skip_to_end(reader)?;
    }
    Ok(label)
}

fn parse_serie<R: BufRead>(
    reader: &mut Reader<R>,
    start: &BytesStart,
    empty: bool,
) -> Result<Serie> {
    let serie = Serie {
        id: attr_i64(start, "id")?.unwrap_or(0),
        name: attr_text(start, "name")?.unwrap_or_default(),
        catno: attr_text(start, "catno")?,
    };
    if !empty {
        skip_to_end(reader)?;
    }
    Ok(serie)
}

fn parse_company<R: BufRead>(reader: &mut Reader<R>, empty: bool) -> Result<Company> {
    let mut company = Company::default();
    if empty {
        return Ok(company);
    }
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match read_event(reader, &mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"id" => company.id = read_i64(reader)?,
                b"name" => company.name = read_text(reader)?,
                b"entity_type" => company.entity_type = read_i64(reader)?,
                b"entity_type_name" => company.entity_type_name = read_text(reader)?,
                b"resource_url" => company.resource_url = read_text(reader)?,
                b"catno" => company.catno = Some(read_text(reader)?),
                _ => skip_to_end(reader)?,
            },
            Event::End(_) => return Ok(company),
            Event::Eof => bail!("unexpected end of input inside <company>"),
            _ => {}
        }
    }
}

fn parse_track<R: BufRead>(reader: &mut Reader<R>, empty: bool) -> Result<Track> {
    let mut track = Track::default();
    if empty {
        return Ok(track);
    }
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match read_event(reader, &mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"position" => track.position = Some(read_text(reader)?),
                b"title" => track.title = read_text(reader)?,
                b"duration" => track.duration = Some(read_text(reader)?),
                b"artists" => {
                    track.artists =
                        read_list(reader, b"artist", |r, _e, empty| parse_master_artist(r, empty))?
                }
                b"extraartists" => {
                    track.extra_artists =
                        read_list(reader, b"artist", |r, _e, empty| parse_extra_artist(r, empty))?
                }
                b"sub_tracks" => {
                    track.sub_tracks =
                        read_list(reader, b"track", |r, _e, empty| parse_sub_track(r, empty))?
                }
                _ => skip_to_end(reader)?,
            },
            Event::End(_) => return Ok(track),
            Event::Eof => bail!("unexpected end of input inside <track>"),
            _ => {}
        }
    }
}

fn parse_sub_track<R: BufRead>(reader: &mut Reader<R>, empty: bool) -> Result<SubTrack> {
    let mut track = SubTrack::default();
    if empty {
        return Ok(track);
    }
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match read_event(reader, &mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"position" => track.position = Some(read_text(reader)?),
                b"title" => track.title = read_text(reader)?,
                b"duration" => track.duration = Some(read_text(reader)?),
                b"artists" => {
                    track.artists =
                        read_list(reader, b"artist", |r, _e, empty| parse_master_artist(r, empty))?
                }
                b"extraartists" => {
                    track.extra_artists =
                        read_list(reader, b"artist", |r, _e, empty| parse_extra_artist(r, empty))?
                }
                _ => skip_to_end(reader)?,
            },
            Event::End(_) => return Ok(track),
            Event::Eof => bail!("unexpected end of input inside <track>"),
            _ => {}
        }
    }
}
