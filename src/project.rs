//! Projection of decoded entities into per-table row tuples.
//!
//! `project` is a pure mapping: one entity in, a bundle of typed rows out.
//! Rows are a sum type with one variant per target table, so a row can only
//! be built with the fields its table expects; `Row::into_values` is the
//! single place where field order meets column order.

use crate::decoder::Entity;
use crate::models::{Artist, Label, Master, Release};
use crate::tables::Table;
use anyhow::Result;

/// One cell of a row tuple, in the shape the bulk-copy encoder understands.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    BigInt(i64),
    Int(i32),
    Bool(bool),
    Text(String),
    TextArray(Vec<String>),
    Json(serde_json::Value),
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::BigInt(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Value::TextArray(v)
    }
}

impl From<Option<i64>> for Value {
    fn from(v: Option<i64>) -> Self {
        v.map_or(Value::Null, Value::BigInt)
    }
}

impl From<Option<i32>> for Value {
    fn from(v: Option<i32>) -> Self {
        v.map_or(Value::Null, Value::Int)
    }
}

impl From<Option<String>> for Value {
    fn from(v: Option<String>) -> Self {
        v.map_or(Value::Null, Value::Text)
    }
}

/// A row tuple destined for one specific table.
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    Artist {
        id: i64,
        name: String,
        real_name: Option<String>,
        profile: Option<String>,
        data_quality: String,
        name_variations: Vec<String>,
        urls: Vec<String>,
    },
    ArtistAlias {
        artist_id: i64,
        alias_id: i64,
    },
    ArtistMember {
        artist_id: i64,
        member_id: i64,
    },
    Label {
        id: i64,
        parent_label_id: Option<i64>,
        data_quality: String,
        name: String,
        profile: Option<String>,
        contact_info: Option<String>,
        urls: Vec<String>,
    },
    Master {
        id: i64,
        main_release_id: Option<i64>,
        data_quality: String,
        title: String,
        year: Option<i32>,
        genres: Vec<String>,
        styles: Vec<String>,
        videos: serde_json::Value,
    },
    MasterArtist {
        master_id: i64,
        artist_id: i64,
        name: String,
        name_variation: Option<String>,
        join: Option<String>,
    },
    Release {
        id: i64,
        master_id: Option<i64>,
        is_main_release: bool,
        status: String,
        title: String,
        country: Option<String>,
        released: Option<String>,
        notes: Option<String>,
        data_quality: String,
        genres: Vec<String>,
        styles: Vec<String>,
        videos: serde_json::Value,
        formats: serde_json::Value,
        tracklist: serde_json::Value,
        companies: serde_json::Value,
        identifiers: serde_json::Value,
        series: serde_json::Value,
    },
    ReleaseArtist {
        release_id: i64,
        artist_id: i64,
        name: String,
        name_variation: Option<String>,
        join: Option<String>,
    },
    ReleaseExtraArtist {
        release_id: i64,
        artist_id: i64,
        name: String,
        name_variation: Option<String>,
        role: Option<String>,
    },
    ReleaseLabel {
        release_id: i64,
        label_id: i64,
        name: String,
        catno: Option<String>,
    },
}

impl Row {
    pub fn table(&self) -> Table {
        match self {
            Row::Artist { .. } => Table::Artists,
            Row::ArtistAlias { .. } => Table::ArtistAliases,
            Row::ArtistMember { .. } => Table::ArtistMembers,
            Row::Label { .. } => Table::Labels,
            Row::Master { .. } => Table::Masters,
            Row::MasterArtist { .. } => Table::MasterArtists,
            Row::Release { .. } => Table::Releases,
            Row::ReleaseArtist { .. } => Table::ReleaseArtists,
            Row::ReleaseExtraArtist { .. } => Table::ReleaseExtraArtists,
            Row::ReleaseLabel { .. } => Table::ReleaseLabels,
        }
    }

    /// Cells in the table's column order (see [`Table::columns`]).
    pub fn into_values(self) -> Vec<Value> {
        match self {
            Row::Artist {
                id,
                name,
                real_name,
                profile,
                data_quality,
                name_variations,
                urls,
            } => vec![
                id.into(),
                name.into(),
                real_name.into(),
                profile.into(),
                data_quality.into(),
                name_variations.into(),
                urls.into(),
            ],
            Row::ArtistAlias { artist_id, alias_id } => vec![artist_id.into(), alias_id.into()],
            Row::ArtistMember { artist_id, member_id } => {
                vec![artist_id.into(), member_id.into()]
            }
            Row::Label {
                id,
                parent_label_id,
                data_quality,
                name,
                profile,
                contact_info,
                urls,
            } => vec![
                id.into(),
                parent_label_id.into(),
                data_quality.into(),
                name.into(),
                profile.into(),
                contact_info.into(),
                urls.into(),
            ],
            Row::Master {
                id,
                main_release_id,
                data_quality,
                title,
                year,
                genres,
                styles,
                videos,
            } => vec![
                id.into(),
                main_release_id.into(),
                data_quality.into(),
                title.into(),
                year.into(),
                genres.into(),
                styles.into(),
                Value::Json(videos),
            ],
            Row::MasterArtist {
                master_id,
                artist_id,
                name,
                name_variation,
                join,
            } => vec![
                master_id.into(),
                artist_id.into(),
                name.into(),
                name_variation.into(),
                join.into(),
            ],
            Row::Release {
                id,
                master_id,
                is_main_release,
                status,
                title,
                country,
                released,
                notes,
                data_quality,
                genres,
                styles,
                videos,
                formats,
                tracklist,
                companies,
                identifiers,
                series,
            } => vec![
                id.into(),
                master_id.into(),
                is_main_release.into(),
                status.into(),
                title.into(),
                country.into(),
                released.into(),
                notes.into(),
                data_quality.into(),
                genres.into(),
                styles.into(),
                Value::Json(videos),
                Value::Json(formats),
                Value::Json(tracklist),
                Value::Json(companies),
                Value::Json(identifiers),
                Value::Json(series),
            ],
            Row::ReleaseArtist {
                release_id,
                artist_id,
                name,
                name_variation,
                join,
            } => vec![
                release_id.into(),
                artist_id.into(),
                name.into(),
                name_variation.into(),
                join.into(),
            ],
            Row::ReleaseExtraArtist {
                release_id,
                artist_id,
                name,
                name_variation,
                role,
            } => vec![
                release_id.into(),
                artist_id.into(),
                name.into(),
                name_variation.into(),
                role.into(),
            ],
            Row::ReleaseLabel {
                release_id,
                label_id,
                name,
                catno,
            } => vec![release_id.into(), label_id.into(), name.into(), catno.into()],
        }
    }
}

/// Expand one entity into its full row bundle: the parent row first, then
/// child rows in document order.
pub fn project(entity: Entity) -> Result<Vec<Row>> {
    match entity {
        Entity::Artist(artist) => project_artist(artist),
        Entity::Label(label) => project_label(label),
        Entity::Master(master) => project_master(master),
        Entity::Release(release) => project_release(release),
    }
}

fn project_artist(artist: Artist) -> Result<Vec<Row>> {
    let mut rows = Vec::with_capacity(1 + artist.aliases.len() + artist.members.len());
    rows.push(Row::Artist {
        id: artist.id,
        name: artist.name,
        real_name: artist.real_name,
        profile: artist.profile,
        data_quality: artist.data_quality,
        name_variations: artist.name_variations,
        urls: artist.urls,
    });
    for alias in artist.aliases {
        rows.push(Row::ArtistAlias {
            artist_id: artist.id,
            alias_id: alias.id,
        });
    }
    for member in artist.members {
        rows.push(Row::ArtistMember {
            artist_id: artist.id,
            member_id: member.id,
        });
    }
    Ok(rows)
}

fn project_label(label: Label) -> Result<Vec<Row>> {
    Ok(vec![Row::Label {
        id: label.id,
        parent_label_id: label.parent_label_id,
        data_quality: label.data_quality,
        name: label.name,
        profile: label.profile,
        contact_info: label.contact_info,
        urls: label.urls,
    }])
}

fn project_master(master: Master) -> Result<Vec<Row>> {
    let mut rows = Vec::with_capacity(1 + master.artists.len());
    rows.push(Row::Master {
        id: master.id,
        main_release_id: master.main_release_id,
        data_quality: master.data_quality,
        title: master.title,
        year: master.year,
        genres: master.genres,
        styles: master.styles,
        videos: serde_json::to_value(&master.videos)?,
    });
    for artist in master.artists {
        rows.push(Row::MasterArtist {
            master_id: master.id,
            artist_id: artist.id,
            name: artist.name,
            name_variation: artist.anv,
            join: artist.join,
        });
    }
    Ok(rows)
}

fn project_release(release: Release) -> Result<Vec<Row>> {
    let mut rows = Vec::with_capacity(
        1 + release.artists.len() + release.extra_artists.len() + release.labels.len(),
    );
    rows.push(Row::Release {
        id: release.id,
        master_id: release.master_id,
        is_main_release: release.is_main_release,
        status: release.status,
        title: release.title,
        country: release.country,
        released: release.released,
        notes: release.notes,
        data_quality: release.data_quality,
        genres: release.genres,
        styles: release.styles,
        videos: serde_json::to_value(&release.videos)?,
        formats: serde_json::to_value(&release.formats)?,
        tracklist: serde_json::to_value(&release.tracklist)?,
        companies: serde_json::to_value(&release.companies)?,
        identifiers: serde_json::to_value(&release.identifiers)?,
        series: serde_json::to_value(&release.series)?,
    });
    for artist in release.artists {
        rows.push(Row::ReleaseArtist {
            release_id: release.id,
            artist_id: artist.id,
            name: artist.name,
            name_variation: artist.anv,
            join: artist.join,
        });
    }
    for artist in release.extra_artists {
        rows.push(Row::ReleaseExtraArtist {
            release_id: release.id,
            artist_id: artist.id,
            name: artist.name,
            name_variation: artist.anv,
            role: artist.role,
        });
    }
    for label in release.labels {
        rows.push(Row::ReleaseLabel {
            release_id: release.id,
            label_id: label.id,
            name: label.name,
            catno: label.catno,
        });
    }
    Ok(rows)
}
