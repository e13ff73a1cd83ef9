//! Executes a staging plan step by step

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span};
use uuid::Uuid;

use super::error::StagingError;
use super::plan::{Phase, StagePlan, StageStep};
use crate::warehouse::{LoadError, Warehouse};

/// Result of one executed step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub name: String,
    pub phase: Phase,
    pub rows: usize,
    pub duration_ms: u64,
}

/// Summary of a completed staging run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingReport {
    pub run_id: String,
    pub steps: Vec<StepOutcome>,
    pub duration_ms: u64,
}

impl StagingReport {
    /// Rows written by the named step
    pub fn rows_for(&self, name: &str) -> Option<usize> {
        self.steps.iter().find(|s| s.name == name).map(|s| s.rows)
    }
}

/// Runs a [`StagePlan`] against a warehouse
///
/// Each statement commits on its own. The first failure rolls back that
/// statement and stops the run; earlier steps stay committed.
#[derive(Debug, Clone)]
pub struct StagingPipeline {
    plan: StagePlan,
}

impl StagingPipeline {
    pub fn new(plan: StagePlan) -> Self {
        Self { plan }
    }

    pub fn plan(&self) -> &StagePlan {
        &self.plan
    }

    pub fn run(&self, warehouse: &mut dyn Warehouse) -> Result<StagingReport, StagingError> {
        let run_id = Uuid::new_v4().to_string();
        let _span = info_span!("staging_run", run_id = %run_id).entered();
        let start = Instant::now();

        info!(steps = self.plan.steps().len(), "Starting staging run");

        let mut outcomes = Vec::with_capacity(self.plan.steps().len());
        for step in self.plan.steps() {
            let step_start = Instant::now();
            let rows = run_step(warehouse, step).map_err(|source| StagingError::Step {
                step: step.name.clone(),
                source,
            })?;

            let duration_ms = step_start.elapsed().as_millis() as u64;
            info!(step = %step.name, phase = %step.phase, rows, duration_ms, "Step completed");
            outcomes.push(StepOutcome {
                name: step.name.clone(),
                phase: step.phase,
                rows,
                duration_ms,
            });
        }

        let report = StagingReport {
            run_id,
            steps: outcomes,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        info!(duration_ms = report.duration_ms, "Staging run completed");
        Ok(report)
    }
}

fn run_step(warehouse: &mut dyn Warehouse, step: &StageStep) -> Result<usize, LoadError> {
    debug!(step = %step.name, "Executing");
    warehouse.begin()?;
    match warehouse.execute(&step.statement, &[]) {
        Ok(rows) => {
            warehouse.commit()?;
            Ok(rows)
        }
        Err(e) => {
            if let Err(rollback) = warehouse.rollback() {
                tracing::warn!(error = %rollback, "Rollback failed");
            }
            Err(e)
        }
    }
}
