//! Per-record inserts into the star schema
//!
//! The loader never builds SQL from record content. Each record kind maps to
//! one statement from the [`StatementCatalog`] it was built with, and every
//! value is bound as a parameter. Transaction boundaries belong to the caller.

use crate::models::{ArtistRecord, SongRecord, SongplayRecord, TimeRecord, UserRecord};
use crate::warehouse::{LoadError, SqlValue, StatementCatalog, Warehouse};

/// A record ready to be written
#[derive(Debug, Clone, Copy)]
pub enum LoadRecord<'r> {
    Song(&'r SongRecord),
    Artist(&'r ArtistRecord),
    Time(&'r TimeRecord),
    User(&'r UserRecord),
    Songplay(&'r SongplayRecord),
}

impl LoadRecord<'_> {
    /// Target table name
    pub fn table(&self) -> &'static str {
        match self {
            LoadRecord::Song(_) => "songs",
            LoadRecord::Artist(_) => "artists",
            LoadRecord::Time(_) => "time",
            LoadRecord::User(_) => "users",
            LoadRecord::Songplay(_) => "songplays",
        }
    }
}

/// Writes records through a warehouse connection
#[derive(Debug, Clone)]
pub struct Loader {
    catalog: StatementCatalog,
}

impl Loader {
    pub fn new(catalog: StatementCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &StatementCatalog {
        &self.catalog
    }

    /// Insert one record, returning the affected row count
    ///
    /// A duplicate key that the statement ignores yields `Ok(0)`.
    pub fn load(
        &self,
        warehouse: &mut dyn Warehouse,
        record: LoadRecord<'_>,
    ) -> Result<usize, LoadError> {
        let (sql, params) = match record {
            LoadRecord::Song(song) => (
                &self.catalog.song_insert,
                vec![
                    SqlValue::from(&song.song_id),
                    SqlValue::from(&song.title),
                    SqlValue::from(&song.artist_id),
                    SqlValue::from(song.year),
                    SqlValue::from(song.duration),
                ],
            ),
            LoadRecord::Artist(artist) => (
                &self.catalog.artist_insert,
                vec![
                    SqlValue::from(&artist.artist_id),
                    SqlValue::from(&artist.name),
                    SqlValue::from(artist.location.as_ref()),
                    SqlValue::from(artist.latitude),
                    SqlValue::from(artist.longitude),
                ],
            ),
            LoadRecord::Time(time) => (
                &self.catalog.time_insert,
                vec![
                    SqlValue::from(time.start_time),
                    SqlValue::from(time.hour),
                    SqlValue::from(time.day),
                    SqlValue::from(time.week_of_year),
                    SqlValue::from(time.month),
                    SqlValue::from(time.year),
                    SqlValue::from(&time.weekday_name),
                ],
            ),
            LoadRecord::User(user) => (
                &self.catalog.user_insert,
                vec![
                    SqlValue::from(&user.user_id),
                    SqlValue::from(user.first_name.as_ref()),
                    SqlValue::from(user.last_name.as_ref()),
                    SqlValue::from(user.gender.as_ref()),
                    SqlValue::from(&user.level),
                ],
            ),
            LoadRecord::Songplay(play) => (
                &self.catalog.songplay_insert,
                vec![
                    SqlValue::from(play.start_time.naive_utc()),
                    SqlValue::from(&play.user_id),
                    SqlValue::from(&play.level),
                    SqlValue::from(play.song_id()),
                    SqlValue::from(play.artist_id()),
                    SqlValue::from(play.session_id),
                    SqlValue::from(play.location.as_ref()),
                    SqlValue::from(play.user_agent.as_ref()),
                ],
            ),
        };

        let affected = warehouse.execute(sql, &params)?;
        tracing::trace!(table = record.table(), affected, "Loaded record");
        Ok(affected)
    }

    pub fn load_song(
        &self,
        warehouse: &mut dyn Warehouse,
        song: &SongRecord,
    ) -> Result<usize, LoadError> {
        self.load(warehouse, LoadRecord::Song(song))
    }

    pub fn load_artist(
        &self,
        warehouse: &mut dyn Warehouse,
        artist: &ArtistRecord,
    ) -> Result<usize, LoadError> {
        self.load(warehouse, LoadRecord::Artist(artist))
    }

    pub fn load_time(
        &self,
        warehouse: &mut dyn Warehouse,
        time: &TimeRecord,
    ) -> Result<usize, LoadError> {
        self.load(warehouse, LoadRecord::Time(time))
    }

    pub fn load_user(
        &self,
        warehouse: &mut dyn Warehouse,
        user: &UserRecord,
    ) -> Result<usize, LoadError> {
        self.load(warehouse, LoadRecord::User(user))
    }

    pub fn load_songplay(
        &self,
        warehouse: &mut dyn Warehouse,
        songplay: &SongplayRecord,
    ) -> Result<usize, LoadError> {
        self.load(warehouse, LoadRecord::Songplay(songplay))
    }
}

#[cfg(all(test, feature = "duckdb-backend"))]
mod tests {
    use super::*;
    use crate::models::SongMatch;
    use crate::transform::{derive_time_fields, timestamp_from_millis};
    use crate::warehouse::{Dialect, DuckDbWarehouse, schema};

    fn setup() -> (DuckDbWarehouse, Loader) {
        let mut wh = DuckDbWarehouse::memory().unwrap();
        schema::reset(&mut wh).unwrap();
        (wh, Loader::new(StatementCatalog::for_dialect(Dialect::DuckDb)))
    }

    fn song() -> SongRecord {
        SongRecord {
            song_id: "S1".to_string(),
            title: "T1".to_string(),
            artist_id: "A1".to_string(),
            year: 2000,
            duration: 200.5,
        }
    }

    fn user(level: &str) -> UserRecord {
        UserRecord {
            user_id: "8".to_string(),
            first_name: Some("Kaylee".to_string()),
            last_name: Some("Summers".to_string()),
            gender: Some("F".to_string()),
            level: level.to_string(),
        }
    }

    #[test]
    fn test_duplicate_song_is_ignored() {
        let (mut wh, loader) = setup();
        assert_eq!(loader.load_song(&mut wh, &song()).unwrap(), 1);

        let mut changed = song();
        changed.title = "Other".to_string();
        assert_eq!(loader.load_song(&mut wh, &changed).unwrap(), 0);

        let row = wh
            .query_row("SELECT title FROM songs WHERE song_id = $1", &["S1".into()])
            .unwrap()
            .unwrap();
        assert_eq!(row[0].as_str(), Some("T1"));
    }

    #[test]
    fn test_artist_nulls() {
        let (mut wh, loader) = setup();
        let artist = ArtistRecord {
            artist_id: "A1".to_string(),
            name: "AR1".to_string(),
            location: None,
            latitude: None,
            longitude: Some(2.0),
        };
        loader.load_artist(&mut wh, &artist).unwrap();

        let row = wh
            .query_row("SELECT location, latitude, longitude FROM artists", &[])
            .unwrap()
            .unwrap();
        assert!(row[0].is_null());
        assert!(row[1].is_null());
        assert_eq!(row[2].as_f64(), Some(2.0));
    }

    #[test]
    fn test_user_level_is_overwritten() {
        let (mut wh, loader) = setup();
        loader.load_user(&mut wh, &user("free")).unwrap();
        loader.load_user(&mut wh, &user("paid")).unwrap();

        assert_eq!(wh.row_count("users").unwrap(), 1);
        let row = wh
            .query_row("SELECT level FROM users WHERE user_id = $1", &["8".into()])
            .unwrap()
            .unwrap();
        assert_eq!(row[0].as_str(), Some("paid"));
    }

    #[test]
    fn test_repeated_time_is_ignored() {
        let (mut wh, loader) = setup();
        let time = derive_time_fields(&timestamp_from_millis(1_541_106_106_796).unwrap());
        loader.load_time(&mut wh, &time).unwrap();
        loader.load_time(&mut wh, &time).unwrap();

        assert_eq!(wh.row_count("time").unwrap(), 1);
        let row = wh
            .query_row("SELECT week, weekday FROM \"time\"", &[])
            .unwrap()
            .unwrap();
        assert_eq!(row[0].as_i64(), Some(44));
        assert_eq!(row[1].as_str(), Some("Thursday"));
    }

    #[test]
    fn test_songplay_ids_null_together() {
        let (mut wh, loader) = setup();
        let mut play = SongplayRecord {
            start_time: timestamp_from_millis(1_541_106_106_796).unwrap(),
            user_id: "8".to_string(),
            level: "free".to_string(),
            song: None,
            session_id: 139,
            location: None,
            user_agent: Some("Mozilla/5.0".to_string()),
        };
        loader.load_songplay(&mut wh, &play).unwrap();
        play.song = Some(SongMatch {
            song_id: "S1".to_string(),
            artist_id: "A1".to_string(),
        });
        loader.load_songplay(&mut wh, &play).unwrap();

        let unmatched = wh
            .query_row(
                "SELECT COUNT(*) FROM songplays WHERE song_id IS NULL AND artist_id IS NULL",
                &[],
            )
            .unwrap()
            .unwrap();
        let matched = wh
            .query_row(
                "SELECT COUNT(*) FROM songplays WHERE song_id = 'S1' AND artist_id = 'A1'",
                &[],
            )
            .unwrap()
            .unwrap();
        assert_eq!(unmatched[0].as_i64(), Some(1));
        assert_eq!(matched[0].as_i64(), Some(1));
    }
}
