//! Typed Discogs entities as decoded from a dump, plus the normalization
//! pass that collapses "present but empty" into "absent".
//!
//! The decoder fills these structs verbatim from the XML, then calls
//! `normalize()` once per entity. Keeping the two steps separate means the
//! decoder stays ignorant of field semantics: an empty `<realname/>` and a
//! missing one both end up as `None`, but only after decoding.

use serde::Serialize;

/// An `id`-attributed name reference (`<name id="7">X</name>`), used for
/// artist aliases, members, groups and label sub-labels.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct NameRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Artist {
    pub id: i64,
    pub name: String,
    pub real_name: Option<String>,
    pub profile: Option<String>,
    pub data_quality: String,
    pub urls: Vec<String>,
    pub aliases: Vec<NameRef>,
    pub name_variations: Vec<String>,
    pub members: Vec<NameRef>,
    pub groups: Vec<NameRef>,
}

impl Artist {
    pub fn normalize(&mut self) {
        empty_to_none(&mut self.real_name);
        empty_to_none(&mut self.profile);
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Label {
    pub id: i64,
    pub name: String,
    pub contact_info: Option<String>,
    pub profile: Option<String>,
    pub data_quality: String,
    pub urls: Vec<String>,
    pub parent_label_id: Option<i64>,
    pub sub_labels: Vec<NameRef>,
}

impl Label {
    pub fn normalize(&mut self) {
        empty_to_none(&mut self.contact_info);
        empty_to_none(&mut self.profile);
        zero_to_none(&mut self.parent_label_id);
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Master {
    pub id: i64,
    pub title: String,
    pub year: Option<i32>,
    pub main_release_id: Option<i64>,
    pub data_quality: String,
    pub notes: Option<String>,
    pub artists: Vec<MasterArtist>,
    pub videos: Vec<Video>,
    pub genres: Vec<String>,
    pub styles: Vec<String>,
}

impl Master {
    pub fn normalize(&mut self) {
        zero_to_none(&mut self.year);
        zero_to_none(&mut self.main_release_id);
        empty_to_none(&mut self.notes);
        for artist in &mut self.artists {
            artist.normalize();
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Release {
    pub id: i64,
    pub status: String,
    pub title: String,
    pub country: Option<String>,
    pub released: Option<String>,
    pub notes: Option<String>,
    pub data_quality: String,
    pub master_id: Option<i64>,
    pub is_main_release: bool,
    pub artists: Vec<MasterArtist>,
    pub extra_artists: Vec<ExtraArtist>,
    pub labels: Vec<ReleaseLabel>,
    pub formats: Vec<Format>,
    pub genres: Vec<String>,
    pub styles: Vec<String>,
    pub identifiers: Vec<Identifier>,
    pub videos: Vec<Video>,
    pub tracklist: Vec<Track>,
    pub companies: Vec<Company>,
    pub series: Vec<Serie>,
}

impl Release {
    pub fn normalize(&mut self) {
        empty_to_none(&mut self.country);
        empty_to_none(&mut self.released);
        empty_to_none(&mut self.notes);
        zero_to_none(&mut self.master_id);
        for artist in &mut self.artists {
            artist.normalize();
        }
        for artist in &mut self.extra_artists {
            artist.normalize();
        }
        for label in &mut self.labels {
            label.normalize();
        }
        for identifier in &mut self.identifiers {
            identifier.normalize();
        }
        for track in &mut self.tracklist {
            track.normalize();
        }
        for company in &mut self.companies {
            company.normalize();
        }
        for serie in &mut self.series {
            serie.normalize();
        }
    }
}

/// A main-artist credit on a master or release (`<artists><artist>`).
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct MasterArtist {
    pub id: i64,
    pub name: String,
    pub anv: Option<String>,
    pub join: Option<String>,
}

impl MasterArtist {
    pub fn normalize(&mut self) {
        empty_to_none(&mut self.anv);
        empty_to_none(&mut self.join);
    }
}

/// A credited contributor (`<extraartists><artist>`), role instead of join.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ExtraArtist {
    pub id: i64,
    pub name: String,
    pub anv: Option<String>,
    pub role: Option<String>,
}

impl ExtraArtist {
    pub fn normalize(&mut self) {
        empty_to_none(&mut self.anv);
        empty_to_none(&mut self.role);
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ReleaseLabel {
    pub id: i64,
    pub name: String,
    pub catno: Option<String>,
}

impl ReleaseLabel {
    pub fn normalize(&mut self) {
        empty_to_none(&mut self.catno);
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Video {
    pub src: String,
    pub duration: i32,
    pub embed: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Format {
    pub name: String,
    pub qty: String,
    pub text: String,
    pub descriptions: Vec<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Identifier {
    pub r#type: String,
    pub description: Option<String>,
    pub value: String,
}

impl Identifier {
    pub fn normalize(&mut self) {
        empty_to_none(&mut self.description);
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Company {
    pub id: i64,
    pub name: String,
    pub entity_type: i64,
    pub entity_type_name: String,
    pub resource_url: String,
    pub catno: Option<String>,
}

impl Company {
    pub fn normalize(&mut self) {
        empty_to_none(&mut self.catno);
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Serie {
    pub id: i64,
    pub name: String,
    pub catno: Option<String>,
}

impl Serie {
    pub fn normalize(&mut self) {
        empty_to_none(&mut self.catno);
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Track {
    pub position: Option<String>,
    pub title: String,
    pub duration: Option<String>,
    pub artists: Vec<MasterArtist>,
    pub extra_artists: Vec<ExtraArtist>,
    pub sub_tracks: Vec<SubTrack>,
}

impl Track {
    pub fn normalize(&mut self) {
        empty_to_none(&mut self.position);
        empty_to_none(&mut self.duration);
        for artist in &mut self.artists {
            artist.normalize();
        }
        for artist in &mut self.extra_artists {
            artist.normalize();
        }
        for track in &mut self.sub_tracks {
            track.normalize();
        }
    }
}

/// An index-track entry (`<sub_tracks><track>`); same shape as a track
/// minus further nesting.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct SubTrack {
    pub position: Option<String>,
    pub title: String,
    pub duration: Option<String>,
    pub artists: Vec<MasterArtist>,
    pub extra_artists: Vec<ExtraArtist>,
}

impl SubTrack {
    pub fn normalize(&mut self) {
        empty_to_none(&mut self.position);
        empty_to_none(&mut self.duration);
        for artist in &mut self.artists {
            artist.normalize();
        }
        for artist in &mut self.extra_artists {
            artist.normalize();
        }
    }
}

/// Present-but-empty text collapses to absent.
pub(crate) fn empty_to_none(field: &mut Option<String>) {
    if field.as_deref() == Some("") {
        *field = None;
    }
}

/// Sentinel zero collapses to absent (`year`, `main_release_id`,
/// `master_id`, `parent_label_id`).
pub(crate) fn zero_to_none<T: Default + PartialEq>(field: &mut Option<T>) {
    if field.as_ref() == Some(&T::default()) {
        *field = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_becomes_absent() {
        let mut field = Some(String::new());
        empty_to_none(&mut field);
        assert_eq!(field, None);

        let mut field = Some("kept".to_string());
        empty_to_none(&mut field);
        assert_eq!(field.as_deref(), Some("kept"));
    }

    #[test]
    fn zero_becomes_absent() {
        let mut field = Some(0i64);
        zero_to_none(&mut field);
        assert_eq!(field, None);

        let mut field = Some(42i64);
        zero_to_none(&mut field);
        assert_eq!(field, Some(42));
    }

    #[test]
    fn artist_normalization_clears_empty_optionals() {
        let mut artist = Artist {
            id: 1,
            name: "A".to_string(),
            real_name: Some(String::new()),
            profile: Some("bio".to_string()),
            ..Artist::default()
        };
        artist.normalize();
        assert_eq!(artist.real_name, None);
        assert_eq!(artist.profile.as_deref(), Some("bio"));
    }

    #[test]
    fn master_normalization_clears_sentinels() {
        let mut master = Master {
            id: 11,
            year: Some(0),
            main_release_id: Some(0),
            notes: Some(String::new()),
            artists: vec![MasterArtist {
                id: 3,
                name: "X".to_string(),
                anv: Some(String::new()),
                join: Some("&".to_string()),
            }],
            ..Master::default()
        };
        master.normalize();
        assert_eq!(master.year, None);
        assert_eq!(master.main_release_id, None);
        assert_eq!(master.notes, None);
        assert_eq!(master.artists[0].anv, None);
        assert_eq!(master.artists[0].join.as_deref(), Some("&"));
    }

    #[test]
    fn release_normalization_recurses_into_tracklist() {
        let mut release = Release {
            id: 1,
            master_id: Some(0),
            country: Some(String::new()),
            tracklist: vec![Track {
                position: Some(String::new()),
                title: "T".to_string(),
                duration: Some("3:14".to_string()),
                sub_tracks: vec![SubTrack {
                    position: Some(String::new()),
                    title: "S".to_string(),
                    ..SubTrack::default()
                }],
                ..Track::default()
            }],
            ..Release::default()
        };
        release.normalize();
        assert_eq!(release.master_id, None);
        assert_eq!(release.country, None);
        assert_eq!(release.tracklist[0].position, None);
        assert_eq!(release.tracklist[0].duration.as_deref(), Some("3:14"));
        assert_eq!(release.tracklist[0].sub_tracks[0].position, None);
    }

    #[test]
    fn label_normalization_clears_zero_parent() {
        let mut label = Label {
            id: 5,
            parent_label_id: Some(0),
            ..Label::default()
        };
        label.normalize();
        assert_eq!(label.parent_label_id, None);

        let mut label = Label {
            id: 5,
            parent_label_id: Some(9),
            ..Label::default()
        };
        label.normalize();
        assert_eq!(label.parent_label_id, Some(9));
    }
}
