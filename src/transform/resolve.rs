//! Catalogue lookup for play events

use crate::models::SongMatch;
use crate::warehouse::{LoadError, SqlValue, StatementCatalog, Warehouse};

/// Matches a play event to a loaded song and artist
///
/// The match is exact on title, artist name and duration. When several rows
/// match, the first one the database returns wins; no ordering is imposed.
#[derive(Debug, Clone)]
pub struct LookupResolver {
    statement: String,
}

impl LookupResolver {
    pub fn new(catalog: &StatementCatalog) -> Self {
        Self {
            statement: catalog.song_select.clone(),
        }
    }

    /// Look up `(song_id, artist_id)`; `Ok(None)` when nothing matches
    pub fn resolve(
        &self,
        warehouse: &mut dyn Warehouse,
        title: &str,
        artist: &str,
        duration: f64,
    ) -> Result<Option<SongMatch>, LoadError> {
        let params = [
            SqlValue::from(title),
            SqlValue::from(artist),
            SqlValue::from(duration),
        ];
        let Some(row) = warehouse.query_row(&self.statement, &params)? else {
            tracing::trace!(title, artist, duration, "No catalogue match");
            return Ok(None);
        };

        let song_id = row.first().and_then(SqlValue::as_str);
        let artist_id = row.get(1).and_then(SqlValue::as_str);
        match (song_id, artist_id) {
            (Some(song_id), Some(artist_id)) => Ok(Some(SongMatch {
                song_id: song_id.to_string(),
                artist_id: artist_id.to_string(),
            })),
            _ => Err(LoadError::Conversion(format!(
                "song lookup returned {row:?}, expected two text ids"
            ))),
        }
    }
}
