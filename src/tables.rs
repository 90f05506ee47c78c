//! The ten target tables and their load contracts.
//!
//! The column order listed here is the contract with the bulk-copy stream:
//! `Row::into_values` (in [`crate::project`]) emits cells in exactly this
//! order.

use crate::dump::DumpType;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Artists,
    ArtistAliases,
    ArtistMembers,
    Labels,
    Masters,
    MasterArtists,
    Releases,
    ReleaseArtists,
    ReleaseExtraArtists,
    ReleaseLabels,
}

impl Table {
    pub const ALL: [Table; 10] = [
        Table::Artists,
        Table::ArtistAliases,
        Table::ArtistMembers,
        Table::Labels,
        Table::Masters,
        Table::MasterArtists,
        Table::Releases,
        Table::ReleaseArtists,
        Table::ReleaseExtraArtists,
        Table::ReleaseLabels,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Table::Artists => "discogs_artists",
            Table::ArtistAliases => "discogs_artists_aliases",
            Table::ArtistMembers => "discogs_artists_members",
            Table::Labels => "discogs_labels",
            Table::Masters => "discogs_masters",
            Table::MasterArtists => "discogs_master_artists",
            Table::Releases => "discogs_releases",
            Table::ReleaseArtists => "discogs_release_artists",
            Table::ReleaseExtraArtists => "discogs_release_extra_artists",
            Table::ReleaseLabels => "discogs_release_labels",
        }
    }

    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Table::Artists => &[
                "id",
                "name",
                "real_name",
                "profile",
                "data_quality",
                "name_variations",
                "urls",
            ],
            Table::ArtistAliases => &["artist_id", "alias_id"],
            Table::ArtistMembers => &["artist_id", "member_id"],
            Table::Labels => &[
                "id",
                "parent_label_id",
                "data_quality",
                "name",
                "profile",
                "contact_info",
                "urls",
            ],
            Table::Masters => &[
                "id",
                "main_release_id",
                "data_quality",
                "title",
                "year",
                "genres",
                "styles",
                "videos",
            ],
            Table::MasterArtists => &["master_id", "artist_id", "name", "name_variation", "join"],
            Table::Releases => &[
                "id",
                "master_id",
                "is_main_release",
                "status",
                "title",
                "country",
                "released",
                "notes",
                "data_quality",
                "genres",
                "styles",
                "videos",
                "formats",
                "tracklist",
                "companies",
                "identifiers",
                "series",
            ],
            Table::ReleaseArtists => &["release_id", "artist_id", "name", "name_variation", "join"],
            Table::ReleaseExtraArtists => {
                &["release_id", "artist_id", "name", "name_variation", "role"]
            }
            Table::ReleaseLabels => &["release_id", "label_id", "name", "catno"],
        }
    }

    /// The tables one dump type feeds; the coordinator truncates exactly
    /// these and the producer writes to no others.
    pub fn for_dump(dump_type: DumpType) -> &'static [Table] {
        match dump_type {
            DumpType::Artists => &[Table::Artists, Table::ArtistAliases, Table::ArtistMembers],
            DumpType::Labels => &[Table::Labels],
            DumpType::Masters => &[Table::Masters, Table::MasterArtists],
            DumpType::Releases => &[
                Table::Releases,
                Table::ReleaseArtists,
                Table::ReleaseExtraArtists,
                Table::ReleaseLabels,
            ],
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_sets_per_dump_type() {
        assert_eq!(Table::for_dump(DumpType::Artists).len(), 3);
        assert_eq!(Table::for_dump(DumpType::Labels), &[Table::Labels]);
        assert_eq!(Table::for_dump(DumpType::Masters).len(), 2);
        assert_eq!(Table::for_dump(DumpType::Releases).len(), 4);
    }

    #[test]
    fn table_names_are_prefixed_and_unique() {
        let mut names: Vec<_> = Table::ALL.iter().map(|t| t.name()).collect();
        assert!(names.iter().all(|n| n.starts_with("discogs_")));
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Table::ALL.len());
    }

    #[test]
    fn column_arities() {
        assert_eq!(Table::Artists.columns().len(), 7);
        assert_eq!(Table::ArtistAliases.columns(), &["artist_id", "alias_id"]);
        assert_eq!(Table::Labels.columns().len(), 7);
        assert_eq!(Table::Masters.columns().len(), 8);
        assert_eq!(Table::MasterArtists.columns().len(), 5);
        assert_eq!(Table::Releases.columns().len(), 17);
        assert_eq!(Table::ReleaseLabels.columns().len(), 4);
    }
}
