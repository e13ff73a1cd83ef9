//! Error types for staging runs

use thiserror::Error;

use crate::warehouse::LoadError;

/// Errors that can occur while building or running a staging plan
#[derive(Error, Debug)]
pub enum StagingError {
    /// Steps are not in dependency order
    #[error("Step '{step}' is out of order: {reason}")]
    OrderViolation { step: String, reason: String },

    /// A plan needs at least one step
    #[error("Staging plan has no steps")]
    EmptyPlan,

    /// A statement failed; later steps were not run
    #[error("Step '{step}' failed")]
    Step {
        step: String,
        #[source]
        source: LoadError,
    },
}

impl StagingError {
    /// Name of the step the error concerns
    pub fn step_name(&self) -> Option<&str> {
        match self {
            StagingError::OrderViolation { step, .. } | StagingError::Step { step, .. } => {
                Some(step)
            }
            StagingError::EmptyPlan => None,
        }
    }

    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            StagingError::OrderViolation { .. } => format!(
                "{self}\n\nHint: Copy steps must come first, and each insert must follow the steps producing its inputs."
            ),
            StagingError::Step { step, source } => {
                format!("Step '{step}' failed:\n{}", source.user_message())
            }
            StagingError::EmptyPlan => self.to_string(),
        }
    }
}
