//! Database models

use serde::{Deserialize, Serialize};

use crate::release_date::{self, ReleaseDate};

/// Extra data for a song, one row per song in `song_details`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongDetails {
    /// Owning song id (foreign key, unique)
    #[serde(default)]
    pub song_id: i64,
    /// Full lyrics, verses separated by a blank line
    #[serde(default)]
    pub text: String,
    #[serde(default, with = "release_date::optional")]
    pub release_date: Option<ReleaseDate>,
    /// External URL for the song
    #[serde(default)]
    pub link: String,
}

impl SongDetails {
    /// Details with nothing known beyond the owning song
    pub fn empty(song_id: i64) -> Self {
        Self {
            song_id,
            ..Self::default()
        }
    }
}

/// A song joined with its details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: i64,
    /// Performer name
    pub group: String,
    /// Song title
    pub song: String,
    #[serde(rename = "SongDetails")]
    pub details: SongDetails,
}
