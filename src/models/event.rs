//! Event-log records and the projections derived from them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Page value marking a song play in the event logs
pub const NEXT_SONG_PAGE: &str = "NextSong";

/// A single song-play line from an event log
///
/// The extractor only ever produces records whose `page_action` is
/// [`NEXT_SONG_PAGE`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub level: String,
    pub song_title: String,
    pub artist_name: String,
    pub duration: f64,
    pub session_id: i64,
    pub location: Option<String>,
    pub user_agent: Option<String>,
    pub page_action: String,
}

impl EventRecord {
    /// Whether this event is a song play
    pub fn is_play(&self) -> bool {
        self.page_action == NEXT_SONG_PAGE
    }

    /// Project the user columns of this event
    pub fn to_user(&self) -> UserRecord {
        UserRecord {
            user_id: self.user_id.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            gender: self.gender.clone(),
            level: self.level.clone(),
        }
    }

    /// Build the fact row for this event given the catalogue lookup result
    pub fn to_songplay(&self, song: Option<SongMatch>) -> SongplayRecord {
        SongplayRecord {
            start_time: self.timestamp,
            user_id: self.user_id.clone(),
            level: self.level.clone(),
            song,
            session_id: self.session_id,
            location: self.location.clone(),
            user_agent: self.user_agent.clone(),
        }
    }
}

/// A row of the `users` dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub level: String,
}

/// Catalogue identifiers matched for a play event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongMatch {
    pub song_id: String,
    pub artist_id: String,
}

/// A row of the `songplays` fact table
///
/// `song` carries both catalogue ids or neither.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongplayRecord {
    pub start_time: DateTime<Utc>,
    pub user_id: String,
    pub level: String,
    pub song: Option<SongMatch>,
    pub session_id: i64,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}

impl SongplayRecord {
    pub fn song_id(&self) -> Option<&str> {
        self.song.as_ref().map(|m| m.song_id.as_str())
    }

    pub fn artist_id(&self) -> Option<&str> {
        self.song.as_ref().map(|m| m.artist_id.as_str())
    }
}
