//! Driver errors

use rv_stage::{Stage, StageError};
use thiserror::Error;

/// Result type for pipeline operations
pub type DriverResult<T> = Result<T, DriverError>;

/// Errors that abort a pipeline run
#[derive(Debug, Error)]
pub enum DriverError {
    /// A stage contract was violated
    #[error(transparent)]
    Stage(#[from] StageError),

    /// A pass rejected the IR it was given
    #[error("{message}")]
    Lowering {
        /// Description of the problem
        message: String,
    },

    /// A pass failed; the pipeline stopped at its stage
    #[error("lowering `{pass}` failed at {stage}")]
    PassFailed {
        /// Name of the failing pass
        pass: String,
        /// Stage the pass ran at
        stage: Stage,
        /// What went wrong
        #[source]
        source: Box<DriverError>,
    },
}

impl DriverError {
    /// Creates a [`DriverError::Lowering`]
    pub fn lowering(message: impl Into<String>) -> Self {
        Self::Lowering {
            message: message.into(),
        }
    }

    /// The stage violation at the root of this error, if any
    #[must_use]
    pub fn stage_error(&self) -> Option<&StageError> {
        match self {
            Self::Stage(err) => Some(err),
            Self::Lowering { .. } => None,
            Self::PassFailed { source, .. } => source.stage_error(),
        }
    }
}
