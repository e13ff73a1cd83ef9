//! Fixtures shared by the integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use songplay_etl::warehouse::{
    Dialect, DuckDbWarehouse, LoadError, SqlValue, Warehouse, schema,
};

/// Song file with the given ids; duration fixed at 200.5
pub fn song_json(song_id: &str, title: &str, artist_id: &str, artist_name: &str) -> String {
    format!(
        r#"{{"num_songs": 1, "artist_id": "{artist_id}", "artist_latitude": 1.0, "artist_longitude": 2.0, "artist_location": "L1", "artist_name": "{artist_name}", "song_id": "{song_id}", "title": "{title}", "duration": 200.5, "year": 2000}}"#
    )
}

/// Event-log line for user 8
pub fn event_json(page: &str, ts: i64, song: &str, artist: &str, length: f64, level: &str) -> String {
    format!(
        r#"{{"artist":"{artist}","auth":"Logged In","firstName":"Kaylee","gender":"F","itemInSession":0,"lastName":"Summers","length":{length},"level":"{level}","location":"Phoenix-Mesa-Scottsdale, AZ","method":"PUT","page":"{page}","registration":1540344794796.0,"sessionId":139,"song":"{song}","status":200,"ts":{ts},"userAgent":"Mozilla/5.0","userId":"8"}}"#
    )
}

pub fn write(dir: &Path, relative: &str, content: &str) -> PathBuf {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

pub fn fresh_warehouse() -> DuckDbWarehouse {
    let mut wh = DuckDbWarehouse::memory().unwrap();
    schema::reset(&mut wh).unwrap();
    wh
}

pub fn scalar(wh: &mut dyn Warehouse, sql: &str) -> SqlValue {
    wh.query_row(sql, &[]).unwrap().unwrap().remove(0)
}

/// DuckDB warehouse that fails any statement binding a marker value
pub struct FailingWarehouse {
    pub inner: DuckDbWarehouse,
    pub marker: String,
    pub bound: Vec<SqlValue>,
}

impl FailingWarehouse {
    pub fn new(inner: DuckDbWarehouse, marker: &str) -> Self {
        Self {
            inner,
            marker: marker.to_string(),
            bound: Vec::new(),
        }
    }

    pub fn saw(&self, value: &str) -> bool {
        self.bound.iter().any(|v| v.as_str() == Some(value))
    }
}

impl Warehouse for FailingWarehouse {
    fn dialect(&self) -> Dialect {
        self.inner.dialect()
    }

    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<usize, LoadError> {
        self.bound.extend(params.iter().cloned());
        if params.iter().any(|p| p.as_str() == Some(self.marker.as_str())) {
            return Err(LoadError::Connection("server closed the connection".to_string()));
        }
        self.inner.execute(sql, params)
    }

    fn execute_batch(&mut self, sql: &str) -> Result<(), LoadError> {
        self.inner.execute_batch(sql)
    }

    fn query_row(
        &mut self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<Option<Vec<SqlValue>>, LoadError> {
        self.bound.extend(params.iter().cloned());
        self.inner.query_row(sql, params)
    }

    fn begin(&mut self) -> Result<(), LoadError> {
        self.inner.begin()
    }

    fn commit(&mut self) -> Result<(), LoadError> {
        self.inner.commit()
    }

    fn rollback(&mut self) -> Result<(), LoadError> {
        self.inner.rollback()
    }
}
