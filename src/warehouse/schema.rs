//! Table definitions for the staging and star-schema tables

use super::{Dialect, LoadError, Warehouse};

/// Tables in drop order (facts before dimensions)
pub const TABLES: &[&str] = &[
    "staging_events",
    "staging_songs",
    "songplays",
    "users",
    "songs",
    "artists",
    "time",
];

const DUCKDB_DROPS: &[&str] = &[
    "DROP TABLE IF EXISTS staging_events",
    "DROP TABLE IF EXISTS staging_songs",
    "DROP TABLE IF EXISTS songplays",
    "DROP TABLE IF EXISTS users",
    "DROP TABLE IF EXISTS songs",
    "DROP TABLE IF EXISTS artists",
    "DROP TABLE IF EXISTS \"time\"",
    "DROP SEQUENCE IF EXISTS songplay_seq",
];

const DUCKDB_CREATES: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS staging_events (
    artist VARCHAR,
    auth VARCHAR,
    first_name VARCHAR,
    gender VARCHAR,
    item_in_session INTEGER,
    last_name VARCHAR,
    length DOUBLE,
    level VARCHAR,
    location VARCHAR,
    method VARCHAR,
    page VARCHAR,
    registration DOUBLE,
    session_id INTEGER,
    song VARCHAR,
    status INTEGER,
    ts BIGINT,
    user_agent VARCHAR,
    user_id VARCHAR
)"#,
    r#"CREATE TABLE IF NOT EXISTS staging_songs (
    num_songs INTEGER,
    artist_id VARCHAR,
    artist_latitude DOUBLE,
    artist_longitude DOUBLE,
    artist_location VARCHAR,
    artist_name VARCHAR,
    song_id VARCHAR,
    title VARCHAR,
    duration DOUBLE,
    year INTEGER
)"#,
    "CREATE SEQUENCE IF NOT EXISTS songplay_seq START 1",
    r#"CREATE TABLE IF NOT EXISTS songplays (
    songplay_id BIGINT PRIMARY KEY DEFAULT nextval('songplay_seq'),
    start_time TIMESTAMP NOT NULL,
    user_id VARCHAR NOT NULL,
    level VARCHAR,
    song_id VARCHAR,
    artist_id VARCHAR,
    session_id INTEGER,
    location VARCHAR,
    user_agent VARCHAR
)"#,
    r#"CREATE TABLE IF NOT EXISTS users (
    user_id VARCHAR PRIMARY KEY,
    first_name VARCHAR,
    last_name VARCHAR,
    gender VARCHAR,
    level VARCHAR
)"#,
    r#"CREATE TABLE IF NOT EXISTS songs (
    song_id VARCHAR PRIMARY KEY,
    title VARCHAR NOT NULL,
    artist_id VARCHAR NOT NULL,
    year INTEGER,
    duration DOUBLE NOT NULL
)"#,
    r#"CREATE TABLE IF NOT EXISTS artists (
    artist_id VARCHAR PRIMARY KEY,
    name VARCHAR NOT NULL,
    location VARCHAR,
    latitude DOUBLE,
    longitude DOUBLE
)"#,
    r#"CREATE TABLE IF NOT EXISTS "time" (
    start_time TIMESTAMP PRIMARY KEY,
    hour INTEGER,
    day INTEGER,
    week INTEGER,
    month INTEGER,
    year INTEGER,
    weekday VARCHAR
)"#,
];

const POSTGRES_DROPS: &[&str] = &[
    "DROP TABLE IF EXISTS staging_events",
    "DROP TABLE IF EXISTS staging_songs",
    "DROP TABLE IF EXISTS songplays",
    "DROP TABLE IF EXISTS users",
    "DROP TABLE IF EXISTS songs",
    "DROP TABLE IF EXISTS artists",
    "DROP TABLE IF EXISTS \"time\"",
];

const POSTGRES_CREATES: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS staging_events (
    artist TEXT,
    auth TEXT,
    first_name TEXT,
    gender TEXT,
    item_in_session INTEGER,
    last_name TEXT,
    length DOUBLE PRECISION,
    level TEXT,
    location TEXT,
    method TEXT,
    page TEXT,
    registration DOUBLE PRECISION,
    session_id INTEGER,
    song TEXT,
    status INTEGER,
    ts BIGINT,
    user_agent TEXT,
    user_id TEXT
)"#,
    r#"CREATE TABLE IF NOT EXISTS staging_songs (
    num_songs INTEGER,
    artist_id TEXT,
    artist_latitude DOUBLE PRECISION,
    artist_longitude DOUBLE PRECISION,
    artist_location TEXT,
    artist_name TEXT,
    song_id TEXT,
    title TEXT,
    duration DOUBLE PRECISION,
    year INTEGER
)"#,
    r#"CREATE TABLE IF NOT EXISTS songplays (
    songplay_id SERIAL PRIMARY KEY,
    start_time TIMESTAMP NOT NULL,
    user_id TEXT NOT NULL,
    level TEXT,
    song_id TEXT,
    artist_id TEXT,
    session_id INTEGER,
    location TEXT,
    user_agent TEXT
)"#,
    r#"CREATE TABLE IF NOT EXISTS users (
    user_id TEXT PRIMARY KEY,
    first_name TEXT,
    last_name TEXT,
    gender TEXT,
    level TEXT
)"#,
    r#"CREATE TABLE IF NOT EXISTS songs (
    song_id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    artist_id TEXT NOT NULL,
    year INTEGER,
    duration DOUBLE PRECISION NOT NULL
)"#,
    r#"CREATE TABLE IF NOT EXISTS artists (
    artist_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    location TEXT,
    latitude DOUBLE PRECISION,
    longitude DOUBLE PRECISION
)"#,
    r#"CREATE TABLE IF NOT EXISTS "time" (
    start_time TIMESTAMP PRIMARY KEY,
    hour INTEGER,
    day INTEGER,
    week INTEGER,
    month INTEGER,
    year INTEGER,
    weekday TEXT
)"#,
];

/// Drop statements for a dialect, in execution order
pub fn drop_statements(dialect: Dialect) -> &'static [&'static str] {
    match dialect {
        Dialect::DuckDb => DUCKDB_DROPS,
        Dialect::Postgres => POSTGRES_DROPS,
    }
}

/// Create statements for a dialect, in execution order
pub fn create_statements(dialect: Dialect) -> &'static [&'static str] {
    match dialect {
        Dialect::DuckDb => DUCKDB_CREATES,
        Dialect::Postgres => POSTGRES_CREATES,
    }
}

/// Create any missing tables
pub fn create(warehouse: &mut dyn Warehouse) -> Result<(), LoadError> {
    for statement in create_statements(warehouse.dialect()) {
        warehouse.execute_batch(statement)?;
    }
    Ok(())
}

/// Drop every table, then create them all empty
///
/// Each statement runs on its own; a failure leaves earlier statements
/// applied.
pub fn reset(warehouse: &mut dyn Warehouse) -> Result<(), LoadError> {
    let dialect = warehouse.dialect();
    tracing::info!(%dialect, "Resetting warehouse schema");

    for statement in drop_statements(dialect) {
        tracing::debug!(statement, "Dropping");
        warehouse.execute_batch(statement)?;
    }
    create(warehouse)?;

    tracing::info!(tables = TABLES.len(), "Schema ready");
    Ok(())
}
