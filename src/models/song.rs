//! Catalogue records sourced from song-metadata files

use serde::{Deserialize, Serialize};

/// A row of the `songs` dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongRecord {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    pub year: i32,
    /// Track length in seconds, compared exactly by the lookup join
    pub duration: f64,
}

/// A row of the `artists` dimension
///
/// Lives in the same source file as its [`SongRecord`]. Loading uses
/// insert-or-ignore on `artist_id`, so the first file naming an artist wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistRecord {
    pub artist_id: String,
    pub name: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}
