//! Per-record statement text for the ETL loader
//!
//! Every statement binds its values as `$n` parameters. The conflict policy
//! for each table is part of the statement text:
//!
//! | table       | on duplicate key             |
//! |-------------|------------------------------|
//! | `songs`     | ignored                      |
//! | `artists`   | ignored                      |
//! | `time`      | ignored                      |
//! | `users`     | `level` overwritten          |
//! | `songplays` | n/a (surrogate key)          |

use serde::{Deserialize, Serialize};

use super::Dialect;

/// Statement text handed to the loader and lookup resolver at construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementCatalog {
    /// `$1..$5`: song_id, title, artist_id, year, duration
    pub song_insert: String,
    /// `$1..$5`: artist_id, name, location, latitude, longitude
    pub artist_insert: String,
    /// `$1..$7`: start_time, hour, day, week, month, year, weekday
    pub time_insert: String,
    /// `$1..$5`: user_id, first_name, last_name, gender, level
    pub user_insert: String,
    /// `$1..$8`: start_time, user_id, level, song_id, artist_id, session_id,
    /// location, user_agent
    pub songplay_insert: String,
    /// `$1..$3`: title, artist name, duration; yields song_id, artist_id
    pub song_select: String,
}

impl StatementCatalog {
    /// Catalog for the given dialect
    ///
    /// DuckDB and PostgreSQL accept the same `ON CONFLICT` syntax; the
    /// dialects differ only in DDL (see [`super::schema`]).
    pub fn for_dialect(dialect: Dialect) -> Self {
        match dialect {
            Dialect::DuckDb | Dialect::Postgres => Self::standard(),
        }
    }

    fn standard() -> Self {
        Self {
            song_insert: "INSERT INTO songs (song_id, title, artist_id, year, duration) \
                          VALUES ($1, $2, $3, $4, $5) \
                          ON CONFLICT (song_id) DO NOTHING"
                .to_string(),
            artist_insert: "INSERT INTO artists (artist_id, name, location, latitude, longitude) \
                            VALUES ($1, $2, $3, $4, $5) \
                            ON CONFLICT (artist_id) DO NOTHING"
                .to_string(),
            time_insert: "INSERT INTO \"time\" (start_time, hour, day, week, month, year, weekday) \
                          VALUES ($1, $2, $3, $4, $5, $6, $7) \
                          ON CONFLICT (start_time) DO NOTHING"
                .to_string(),
            user_insert: "INSERT INTO users (user_id, first_name, last_name, gender, level) \
                          VALUES ($1, $2, $3, $4, $5) \
                          ON CONFLICT (user_id) DO UPDATE SET level = EXCLUDED.level"
                .to_string(),
            songplay_insert: "INSERT INTO songplays \
                              (start_time, user_id, level, song_id, artist_id, session_id, location, user_agent) \
                              VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
                .to_string(),
            song_select: "SELECT s.song_id, a.artist_id \
                          FROM songs s \
                          JOIN artists a ON s.artist_id = a.artist_id \
                          WHERE s.title = $1 AND a.name = $2 AND s.duration = $3 \
                          LIMIT 1"
                .to_string(),
        }
    }
}
