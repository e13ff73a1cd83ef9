//! Ordered staging steps and their dependency check

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::StagingError;
use crate::models::NEXT_SONG_PAGE;

/// Which half of the staging run a step belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Raw files into staging tables
    Copy,
    /// Staging tables into the star schema
    Insert,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Copy => write!(f, "copy"),
            Phase::Insert => write!(f, "insert"),
        }
    }
}

/// One statement of a staging plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageStep {
    pub name: String,
    pub phase: Phase,
    pub statement: String,
    /// Table this step writes
    pub produces: String,
    /// Tables that must be written by earlier steps
    pub requires: Vec<String>,
}

impl StageStep {
    pub fn copy(produces: &str, statement: impl Into<String>) -> Self {
        Self {
            name: format!("copy_{produces}"),
            phase: Phase::Copy,
            statement: statement.into(),
            produces: produces.to_string(),
            requires: Vec::new(),
        }
    }

    pub fn insert(produces: &str, requires: &[&str], statement: impl Into<String>) -> Self {
        Self {
            name: format!("insert_{produces}"),
            phase: Phase::Insert,
            statement: statement.into(),
            produces: produces.to_string(),
            requires: requires.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Input locations for the copy phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingSources {
    pub log_data: PathBuf,
    pub song_data: PathBuf,
    pub extension: String,
}

impl StagingSources {
    fn glob(root: &Path, extension: &str) -> String {
        let extension = extension.trim_start_matches('.');
        let pattern = format!("{}/**/*.{}", root.display(), extension);
        pattern.replace('\'', "''")
    }

    pub fn log_glob(&self) -> String {
        Self::glob(&self.log_data, &self.extension)
    }

    pub fn song_glob(&self) -> String {
        Self::glob(&self.song_data, &self.extension)
    }
}

/// A validated, ordered list of staging steps
///
/// Every copy step precedes every insert step, and every table a step
/// requires is produced by an earlier step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePlan {
    steps: Vec<StageStep>,
}

impl StagePlan {
    /// Validate the ordering of `steps`
    pub fn new(steps: Vec<StageStep>) -> Result<Self, StagingError> {
        if steps.is_empty() {
            return Err(StagingError::EmptyPlan);
        }

        let mut produced: HashSet<&str> = HashSet::new();
        let mut inserting = false;

        for step in &steps {
            match step.phase {
                Phase::Copy if inserting => {
                    return Err(StagingError::OrderViolation {
                        step: step.name.clone(),
                        reason: "copy step after an insert step".to_string(),
                    });
                }
                Phase::Copy => {}
                Phase::Insert => inserting = true,
            }

            if let Some(missing) = step
                .requires
                .iter()
                .find(|table| !produced.contains(table.as_str()))
            {
                return Err(StagingError::OrderViolation {
                    step: step.name.clone(),
                    reason: format!("requires '{missing}', which no earlier step produces"),
                });
            }

            produced.insert(&step.produces);
        }

        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[StageStep] {
        &self.steps
    }

    pub fn phase_steps(&self, phase: Phase) -> impl Iterator<Item = &StageStep> {
        self.steps.iter().filter(move |s| s.phase == phase)
    }

    /// The fixed DuckDB plan: copy both staging tables, then fill the
    /// fact table followed by the dimensions
    pub fn standard(sources: &StagingSources) -> Result<Self, StagingError> {
        let copy_events = format!(
            "INSERT INTO staging_events \
             SELECT artist, auth, \"firstName\", gender, \"itemInSession\", \"lastName\", \
                    length, level, location, method, page, registration, \"sessionId\", \
                    song, status, ts, \"userAgent\", \"userId\" \
             FROM read_json('{}', format = 'newline_delimited', columns = {{\
                 'artist': 'VARCHAR', 'auth': 'VARCHAR', 'firstName': 'VARCHAR', \
                 'gender': 'VARCHAR', 'itemInSession': 'INTEGER', 'lastName': 'VARCHAR', \
                 'length': 'DOUBLE', 'level': 'VARCHAR', 'location': 'VARCHAR', \
                 'method': 'VARCHAR', 'page': 'VARCHAR', 'registration': 'DOUBLE', \
                 'sessionId': 'INTEGER', 'song': 'VARCHAR', 'status': 'INTEGER', \
                 'ts': 'BIGINT', 'userAgent': 'VARCHAR', 'userId': 'VARCHAR'}})",
            sources.log_glob()
        );

        let copy_songs = format!(
            "INSERT INTO staging_songs \
             SELECT num_songs, artist_id, artist_latitude, artist_longitude, artist_location, \
                    artist_name, song_id, title, duration, year \
             FROM read_json('{}', format = 'auto', columns = {{\
                 'num_songs': 'INTEGER', 'artist_id': 'VARCHAR', 'artist_latitude': 'DOUBLE', \
                 'artist_longitude': 'DOUBLE', 'artist_location': 'VARCHAR', \
                 'artist_name': 'VARCHAR', 'song_id': 'VARCHAR', 'title': 'VARCHAR', \
                 'duration': 'DOUBLE', 'year': 'INTEGER'}})",
            sources.song_glob()
        );

        // One catalogue row per join key, so a play never fans out
        let insert_songplays = format!(
            "INSERT INTO songplays \
             (start_time, user_id, level, song_id, artist_id, session_id, location, user_agent) \
             SELECT epoch_ms(e.ts), e.user_id, e.level, s.song_id, s.artist_id, \
                    e.session_id, e.location, e.user_agent \
             FROM staging_events e \
             LEFT JOIN ( \
                 SELECT title, artist_name, duration, song_id, artist_id \
                 FROM staging_songs \
                 QUALIFY row_number() OVER ( \
                     PARTITION BY title, artist_name, duration ORDER BY song_id) = 1 \
             ) s \
               ON e.song = s.title AND e.artist = s.artist_name AND e.length = s.duration \
             WHERE e.page = '{NEXT_SONG_PAGE}'"
        );

        let insert_users = format!(
            "INSERT INTO users (user_id, first_name, last_name, gender, level) \
             SELECT DISTINCT ON (user_id) user_id, first_name, last_name, gender, level \
             FROM staging_events \
             WHERE page = '{NEXT_SONG_PAGE}' AND user_id IS NOT NULL AND user_id <> '' \
             ORDER BY user_id, ts DESC \
             ON CONFLICT (user_id) DO UPDATE SET level = EXCLUDED.level"
        );

        let insert_songs = "INSERT INTO songs (song_id, title, artist_id, year, duration) \
             SELECT DISTINCT ON (song_id) song_id, title, artist_id, year, duration \
             FROM staging_songs \
             WHERE song_id IS NOT NULL \
             ON CONFLICT (song_id) DO NOTHING";

        let insert_artists = "INSERT INTO artists (artist_id, name, location, latitude, longitude) \
             SELECT DISTINCT ON (artist_id) artist_id, artist_name, artist_location, \
                    artist_latitude, artist_longitude \
             FROM staging_songs \
             WHERE artist_id IS NOT NULL \
             ON CONFLICT (artist_id) DO NOTHING";

        let insert_time = "INSERT INTO \"time\" (start_time, hour, day, week, month, year, weekday) \
             SELECT DISTINCT start_time, hour(start_time), day(start_time), week(start_time), \
                    month(start_time), year(start_time), dayname(start_time) \
             FROM songplays \
             ON CONFLICT (start_time) DO NOTHING";

        Self::new(vec![
            StageStep::copy("staging_events", copy_events),
            StageStep::copy("staging_songs", copy_songs),
            StageStep::insert(
                "songplays",
                &["staging_events", "staging_songs"],
                insert_songplays,
            ),
            StageStep::insert("users", &["staging_events"], insert_users),
            StageStep::insert("songs", &["staging_songs"], insert_songs),
            StageStep::insert("artists", &["staging_songs"], insert_artists),
            StageStep::insert("time", &["songplays"], insert_time),
        ])
    }
}
