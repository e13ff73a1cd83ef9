//! Record extraction from song-metadata and event-log files

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Deserialize;

use super::error::IngestError;
use crate::models::{ArtistRecord, EventRecord, NEXT_SONG_PAGE, SongRecord};
use crate::transform::timestamp_from_millis;

/// On-disk shape of a song-metadata file
#[derive(Debug, Deserialize)]
struct RawSongFile {
    artist_id: Option<String>,
    artist_latitude: Option<f64>,
    artist_longitude: Option<f64>,
    artist_location: Option<String>,
    artist_name: Option<String>,
    song_id: Option<String>,
    title: Option<String>,
    duration: Option<f64>,
    year: Option<i32>,
}

/// On-disk shape of one event-log line
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLogLine {
    ts: Option<i64>,
    user_id: Option<LogUserId>,
    first_name: Option<String>,
    last_name: Option<String>,
    gender: Option<String>,
    level: Option<String>,
    page: Option<String>,
    song: Option<String>,
    artist: Option<String>,
    length: Option<f64>,
    session_id: Option<i64>,
    location: Option<String>,
    user_agent: Option<String>,
}

/// Logs carry `userId` as a string, older exports as a number
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LogUserId {
    Text(String),
    Number(i64),
}

impl LogUserId {
    fn into_string(self) -> String {
        match self {
            LogUserId::Text(s) => s,
            LogUserId::Number(n) => n.to_string(),
        }
    }
}

/// Parse a song-metadata file into its song and artist rows
///
/// A file holds exactly one song. Invalid JSON or a missing required field
/// fails the file.
pub fn extract_song(path: &Path) -> Result<(SongRecord, ArtistRecord), IngestError> {
    let content = fs::read_to_string(path)?;

    let raw: RawSongFile =
        serde_json::from_str(content.trim()).map_err(|e| IngestError::JsonParse {
            path: path.to_path_buf(),
            line: e.line(),
            error: e.to_string(),
        })?;

    let require = |value: Option<String>, field: &'static str| {
        value.ok_or_else(|| IngestError::MissingField {
            path: path.to_path_buf(),
            line: 1,
            field,
        })
    };

    let artist_id = require(raw.artist_id, "artist_id")?;
    let song = SongRecord {
        song_id: require(raw.song_id, "song_id")?,
        title: require(raw.title, "title")?,
        artist_id: artist_id.clone(),
        year: raw.year.ok_or_else(|| IngestError::MissingField {
            path: path.to_path_buf(),
            line: 1,
            field: "year",
        })?,
        duration: raw.duration.ok_or_else(|| IngestError::MissingField {
            path: path.to_path_buf(),
            line: 1,
            field: "duration",
        })?,
    };
    let artist = ArtistRecord {
        artist_id,
        name: require(raw.artist_name, "artist_name")?,
        location: raw.artist_location,
        latitude: raw.artist_latitude,
        longitude: raw.artist_longitude,
    };

    Ok((song, artist))
}

/// Parse an event-log file and keep only song plays
///
/// One JSON object per line; blank lines are skipped. The first malformed
/// line fails the whole file, so a bad file never loads partially.
pub fn extract_events(path: &Path) -> Result<Vec<EventRecord>, IngestError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut events = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line?;
        let trimmed = line.trim();

        // Skip empty lines
        if trimmed.is_empty() {
            continue;
        }

        let raw: RawLogLine =
            serde_json::from_str(trimmed).map_err(|e| IngestError::JsonParse {
                path: path.to_path_buf(),
                line: line_no,
                error: e.to_string(),
            })?;

        if let Some(event) = event_from_line(raw, path, line_no)? {
            events.push(event);
        }
    }

    Ok(events)
}

fn event_from_line(
    raw: RawLogLine,
    path: &Path,
    line: usize,
) -> Result<Option<EventRecord>, IngestError> {
    let missing = |field: &'static str| IngestError::MissingField {
        path: path.to_path_buf(),
        line,
        field,
    };

    let page = raw.page.ok_or_else(|| missing("page"))?;
    if page != NEXT_SONG_PAGE {
        return Ok(None);
    }

    let ts = raw.ts.ok_or_else(|| missing("ts"))?;
    let timestamp = timestamp_from_millis(ts).map_err(|e| IngestError::InvalidValue {
        path: path.to_path_buf(),
        line,
        field: "ts",
        reason: e.to_string(),
    })?;

    let user_id = raw
        .user_id
        .map(LogUserId::into_string)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| missing("userId"))?;

    Ok(Some(EventRecord {
        timestamp,
        user_id,
        first_name: raw.first_name,
        last_name: raw.last_name,
        gender: raw.gender,
        level: raw.level.ok_or_else(|| missing("level"))?,
        song_title: raw.song.ok_or_else(|| missing("song"))?,
        artist_name: raw.artist.ok_or_else(|| missing("artist"))?,
        duration: raw.length.ok_or_else(|| missing("length"))?,
        session_id: raw.session_id.ok_or_else(|| missing("sessionId"))?,
        location: raw.location,
        user_agent: raw.user_agent,
        page_action: page,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const SONG: &str = r#"{"num_songs": 1, "artist_id": "ARD7TVE1187B99BFB1", "artist_latitude": null, "artist_longitude": null, "artist_location": "California - LA", "artist_name": "Casual", "song_id": "SOMZWCG12A8C13C480", "title": "I Didn't Mean To", "duration": 218.93179, "year": 0}"#;

    fn write_file(dir: &TempDir, name: &str, lines: &[&str]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        path
    }

    fn log_line(page: &str, ts: i64) -> String {
        format!(
            r#"{{"artist":"Des'ree","auth":"Logged In","firstName":"Kaylee","gender":"F","itemInSession":1,"lastName":"Summers","length":246.30812,"level":"free","location":"Phoenix-Mesa-Scottsdale, AZ","method":"PUT","page":"{}","registration":1540344794796.0,"sessionId":139,"song":"You Gotta Be","status":200,"ts":{},"userAgent":"Mozilla/5.0","userId":"8"}}"#,
            page, ts
        )
    }

    #[test]
    fn test_extract_song_fields() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "song.json", &[SONG]);

        let (song, artist) = extract_song(&path).unwrap();
        assert_eq!(song.song_id, "SOMZWCG12A8C13C480");
        assert_eq!(song.title, "I Didn't Mean To");
        assert_eq!(song.artist_id, "ARD7TVE1187B99BFB1");
        assert_eq!(song.year, 0);
        assert_eq!(song.duration, 218.93179);
        assert_eq!(artist.artist_id, song.artist_id);
        assert_eq!(artist.name, "Casual");
        assert_eq!(artist.location.as_deref(), Some("California - LA"));
        assert_eq!(artist.latitude, None);
        assert_eq!(artist.longitude, None);
    }

    #[test]
    fn test_extract_song_missing_field() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "song.json",
            &[r#"{"artist_id": "A1", "artist_name": "AR1", "title": "T1", "duration": 1.0, "year": 2000}"#],
        );

        let err = extract_song(&path).unwrap_err();
        assert!(matches!(
            err,
            IngestError::MissingField {
                field: "song_id",
                ..
            }
        ));
    }

    #[test]
    fn test_extract_song_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "song.json", &[r#"{"song_id": "#]);

        let err = extract_song(&path).unwrap_err();
        assert!(matches!(err, IngestError::JsonParse { .. }));
        assert!(err.is_parse_error());
    }

    #[test]
    fn test_extract_events_filters_plays() {
        let dir = TempDir::new().unwrap();
        let home = r#"{"artist":null,"auth":"Logged In","firstName":"Walter","gender":"M","itemInSession":0,"lastName":"Frye","length":null,"level":"free","location":"San Francisco","method":"GET","page":"Home","registration":1540919166796.0,"sessionId":38,"song":null,"status":200,"ts":1541105830796,"userAgent":"Mozilla","userId":"39"}"#;
        let first = log_line("NextSong", 1_541_106_106_796);
        let second = log_line("NextSong", 1_541_106_352_796);
        let path = write_file(&dir, "events.json", &[&first, home, "", &second]);

        let events = extract_events(&path).unwrap();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.is_play()));
        assert_eq!(events[0].timestamp.timestamp_millis(), 1_541_106_106_796);
        assert_eq!(events[1].timestamp.timestamp_millis(), 1_541_106_352_796);
        assert_eq!(events[0].user_id, "8");
        assert_eq!(events[0].session_id, 139);
        assert_eq!(events[0].duration, 246.30812);
    }

    #[test]
    fn test_extract_events_numeric_user_id() {
        let dir = TempDir::new().unwrap();
        let line = log_line("NextSong", 1_541_106_106_796).replace(r#""userId":"8""#, r#""userId":8"#);
        let path = write_file(&dir, "events.json", &[&line]);

        let events = extract_events(&path).unwrap();
        assert_eq!(events[0].user_id, "8");
    }

    #[test]
    fn test_extract_events_malformed_line_fails_file() {
        let dir = TempDir::new().unwrap();
        let good = log_line("NextSong", 1_541_106_106_796);
        let path = write_file(&dir, "events.json", &[&good, "{not json", &good]);

        let err = extract_events(&path).unwrap_err();
        match err {
            IngestError::JsonParse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_extract_events_play_without_song_fails() {
        let dir = TempDir::new().unwrap();
        let line = log_line("NextSong", 1_541_106_106_796)
            .replace(r#""song":"You Gotta Be","#, "");
        let path = write_file(&dir, "events.json", &[&line]);

        let err = extract_events(&path).unwrap_err();
        assert!(matches!(err, IngestError::MissingField { field: "song", .. }));
    }

    #[test]
    fn test_extract_events_non_plays_may_lack_song() {
        let dir = TempDir::new().unwrap();
        let line = log_line("Logout", 1_541_106_106_796)
            .replace(r#""song":"You Gotta Be","#, "");
        let path = write_file(&dir, "events.json", &[&line]);

        assert!(extract_events(&path).unwrap().is_empty());
    }
}
