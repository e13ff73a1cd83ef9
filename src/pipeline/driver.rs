//! Pipeline driver state machine

use std::path::Path;
use std::time::Instant;

use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

use super::FailurePolicy;
use super::error::{PipelineError, PipelineResult};
use super::progress::ProgressSink;
use super::report::{FailedFile, RunReport};
use crate::ingest::{self, SourceKind};
use crate::load::Loader;
use crate::transform::{LookupResolver, derive_time_fields};
use crate::warehouse::{LoadError, StatementCatalog, Warehouse};

/// Where the driver is in a run
///
/// `Idle -> Discovering -> Processing(1) -> Committing(1) -> Processing(2) -> ... -> Done`.
/// File indices are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Discovering,
    Processing(usize),
    Committing(usize),
    Done,
    Failed(usize),
}

/// Runs source directories through extract, transform and load
pub struct PipelineDriver<'w> {
    warehouse: &'w mut dyn Warehouse,
    loader: Loader,
    resolver: LookupResolver,
    policy: FailurePolicy,
    extension: String,
    state: DriverState,
}

/// Open transaction that rolls back unless committed
struct FileTransaction<'t> {
    warehouse: &'t mut dyn Warehouse,
    open: bool,
}

impl<'t> FileTransaction<'t> {
    fn begin(warehouse: &'t mut dyn Warehouse) -> Result<Self, LoadError> {
        warehouse.begin()?;
        Ok(Self {
            warehouse,
            open: true,
        })
    }

    fn warehouse(&mut self) -> &mut dyn Warehouse {
        &mut *self.warehouse
    }

    fn commit(mut self) -> Result<(), LoadError> {
        let result = self.warehouse.commit();
        self.open = result.is_err();
        result
    }
}

impl Drop for FileTransaction<'_> {
    fn drop(&mut self) {
        if self.open {
            match self.warehouse.rollback() {
                Ok(()) => debug!("Rolled back file transaction"),
                Err(e) => warn!(error = %e, "Rollback failed"),
            }
        }
    }
}

impl<'w> PipelineDriver<'w> {
    pub fn new(warehouse: &'w mut dyn Warehouse, catalog: StatementCatalog) -> Self {
        Self {
            warehouse,
            resolver: LookupResolver::new(&catalog),
            loader: Loader::new(catalog),
            policy: FailurePolicy::default(),
            extension: "json".to_string(),
            state: DriverState::Idle,
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    fn transition(&mut self, next: DriverState) {
        debug!(from = ?self.state, to = ?next, "Driver state");
        self.state = next;
    }

    /// Song files first, then event logs, so plays can resolve against the
    /// catalogue loaded in the same run
    pub fn run_all(
        &mut self,
        songs_root: &Path,
        logs_root: &Path,
        progress: &mut dyn ProgressSink,
    ) -> PipelineResult<Vec<RunReport>> {
        let songs = self.run(songs_root, SourceKind::Songs, progress)?;
        let events = self.run(logs_root, SourceKind::Events, progress)?;
        Ok(vec![songs, events])
    }

    /// Process every matching file under `root`
    pub fn run(
        &mut self,
        root: &Path,
        kind: SourceKind,
        progress: &mut dyn ProgressSink,
    ) -> PipelineResult<RunReport> {
        let run_id = Uuid::new_v4().to_string();
        let _span = info_span!("pipeline_run", run_id = %run_id, source = %kind).entered();
        let start = Instant::now();

        self.transition(DriverState::Discovering);
        let files = match ingest::locate(root, &self.extension) {
            Ok(files) => files,
            Err(e) => {
                self.transition(DriverState::Failed(0));
                return Err(PipelineError::ingest(root, e));
            }
        };
        let total = files.len();
        info!(root = %root.display(), files = total, "Starting run");
        progress.files_found(total, root);

        let mut files_processed = 0;
        let mut rows_written = 0;
        let mut failed_files = Vec::new();

        for (i, path) in files.iter().enumerate() {
            let index = i + 1;
            self.transition(DriverState::Processing(index));
            let _file_span = info_span!("pipeline_file", file = %path.display()).entered();

            match self.process_file(index, path, kind) {
                Ok(rows) => {
                    files_processed += 1;
                    rows_written += rows;
                    debug!(rows, "File committed");
                    progress.file_processed(index, total);
                }
                Err(e) => match self.policy {
                    FailurePolicy::Halt => {
                        self.transition(DriverState::Failed(index));
                        tracing::error!(error = %e, "File failed, halting run");
                        return Err(e);
                    }
                    FailurePolicy::Continue => {
                        // Log but continue
                        warn!(error = %e, "File failed, skipping");
                        failed_files.push(FailedFile {
                            path: path.clone(),
                            error: e.user_message(),
                        });
                    }
                },
            }
        }

        self.transition(DriverState::Done);
        let report = RunReport {
            run_id,
            source: kind,
            root: root.to_path_buf(),
            files_found: total,
            files_processed,
            rows_written,
            failed_files,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        info!(summary = %report.summary(), "Run completed");
        Ok(report)
    }

    /// One file in one transaction; dropping the transaction rolls it back
    ///
    /// Returns the rows the loader reported written.
    fn process_file(
        &mut self,
        index: usize,
        path: &Path,
        kind: SourceKind,
    ) -> PipelineResult<usize> {
        let mut tx = FileTransaction::begin(&mut *self.warehouse)
            .map_err(|e| PipelineError::load(path, e))?;

        let rows = match kind {
            SourceKind::Songs => load_song_file(tx.warehouse(), &self.loader, path)?,
            SourceKind::Events => {
                load_event_file(tx.warehouse(), &self.loader, &self.resolver, path)?
            }
        };

        debug!(from = ?self.state, to = ?DriverState::Committing(index), "Driver state");
        self.state = DriverState::Committing(index);
        tx.commit().map_err(|e| PipelineError::load(path, e))?;
        Ok(rows)
    }
}

fn load_song_file(
    warehouse: &mut dyn Warehouse,
    loader: &Loader,
    path: &Path,
) -> PipelineResult<usize> {
    let (song, artist) =
        ingest::extract_song(path).map_err(|e| PipelineError::ingest(path, e))?;
    let load_err = |e: LoadError| PipelineError::load(path, e);

    let song_rows = loader.load_song(warehouse, &song).map_err(load_err)?;
    let artist_rows = loader.load_artist(warehouse, &artist).map_err(load_err)?;
    Ok(song_rows + artist_rows)
}

fn load_event_file(
    warehouse: &mut dyn Warehouse,
    loader: &Loader,
    resolver: &LookupResolver,
    path: &Path,
) -> PipelineResult<usize> {
    let events = ingest::extract_events(path).map_err(|e| PipelineError::ingest(path, e))?;
    let load_err = |e: LoadError| PipelineError::load(path, e);
    let mut rows = 0;

    for event in &events {
        let time = derive_time_fields(&event.timestamp);
        let user = event.to_user();
        let song = resolver
            .resolve(
                warehouse,
                &event.song_title,
                &event.artist_name,
                event.duration,
            )
            .map_err(load_err)?;
        let songplay = event.to_songplay(song);

        rows += loader.load_time(warehouse, &time).map_err(load_err)?;
        rows += loader.load_user(warehouse, &user).map_err(load_err)?;
        rows += loader.load_songplay(warehouse, &songplay).map_err(load_err)?;
    }

    debug!(events = events.len(), rows, "Loaded event file");
    Ok(rows)
}
