//! Record types flowing through the pipeline
//!
//! Every record is built while one input file is processed, handed to the
//! loader and then dropped. Nothing here is cached across files.

pub mod event;
pub mod song;
pub mod time;

pub use event::{EventRecord, SongMatch, SongplayRecord, UserRecord, NEXT_SONG_PAGE};
pub use song::{ArtistRecord, SongRecord};
pub use time::TimeRecord;
