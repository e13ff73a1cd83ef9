//! Songplay ETL - loads song metadata and listening logs into a star schema
//!
//! Two variants share the same schema:
//! - [`pipeline`]: file-by-file extract, transform and load, one transaction per file
//! - [`staging`]: bulk copy into staging tables, then set-based inserts
//!
//! All database access goes through the narrow [`warehouse::Warehouse`] interface.

pub mod config;
pub mod ingest;
pub mod load;
pub mod models;
pub mod pipeline;
pub mod staging;
pub mod transform;
pub mod warehouse;

#[cfg(feature = "cli")]
pub mod cli;
#[cfg(feature = "cli")]
pub mod logging;

pub use config::{Backend, ConfigError, ConnectionConfig, EtlConfig};
pub use ingest::{IngestError, SourceKind};
pub use load::Loader;
pub use models::{
    ArtistRecord, EventRecord, SongMatch, SongRecord, SongplayRecord, TimeRecord, UserRecord,
};
pub use pipeline::{FailurePolicy, PipelineDriver, PipelineError, RunReport};
pub use staging::{StagePlan, StagingError, StagingPipeline};
pub use transform::{LookupResolver, derive_time_fields};
pub use warehouse::{Dialect, LoadError, SqlValue, StatementCatalog, Warehouse};
