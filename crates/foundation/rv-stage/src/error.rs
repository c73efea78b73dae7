//! Stage contract violations.

use thiserror::Error;

use crate::stage::Stage;

/// Result type for stage-checked operations.
pub type StageResult<T> = Result<T, StageError>;

/// Coarse classification of a [`StageError`].
///
/// Every violation is fatal to the compilation that raised it; the kind only
/// tells the reporter which contract was broken.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StageErrorKind {
    /// Access at a stage where the declaration has no visible state
    StaleRead,
    /// Access at or after the stage the declaration was removed on
    UseAfterRemove,
    /// An attempt to move the pipeline or a declaration backwards
    BackwardStage,
}

/// Errors raised when the stage discipline is violated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageError {
    /// The requested stage predates the declaration, or the carriers that
    /// described it have been reclaimed.
    #[error("declaration read at {stage}, but its history starts at {available_from}")]
    StaleRead {
        /// Stage the read was issued at
        stage: Stage,
        /// Oldest stage the declaration can still answer for
        available_from: Stage,
    },

    /// A historical read asked for a stage the pipeline has not reached.
    #[error("{requested} has not been reached; the pipeline is at {current}")]
    FutureStage {
        /// Stage passed to `with_stage`
        requested: Stage,
        /// Committed stage at the time of the request
        current: Stage,
    },

    /// The declaration was removed at or before the requested stage.
    #[error("declaration accessed at {stage} after its removal at {removed_on}")]
    UseAfterRemove {
        /// Stage the access was issued at
        stage: Stage,
        /// Stage the declaration was removed on
        removed_on: Stage,
    },

    /// A write was issued at a stage older than the declaration's newest state.
    #[error("cannot write at {stage}: declaration already advanced to {last_modified}")]
    BackwardWrite {
        /// Stage the write was issued at
        stage: Stage,
        /// Newest stage the declaration was modified or lowered at
        last_modified: Stage,
    },

    /// A write was issued from inside a historical read.
    #[error("cannot write at {stage} while the pipeline is at {current}")]
    HistoricalWrite {
        /// Overridden stage visible to the writer
        stage: Stage,
        /// Committed stage
        current: Stage,
    },

    /// `advance` was asked to move to a stage that is not ahead of the current one.
    #[error("cannot advance from {current} to {target}")]
    NonMonotonicAdvance {
        /// Committed stage
        current: Stage,
        /// Requested target
        target: Stage,
    },

    /// `advance` was called while a pass still holds a mutation guard.
    #[error("cannot advance past {current} while {in_flight} mutation(s) are in flight")]
    AdvanceDuringMutation {
        /// Committed stage
        current: Stage,
        /// Number of live mutation guards
        in_flight: usize,
    },

    /// `advance` was called from inside `with_stage`.
    #[error("cannot advance from inside a historical read at {stage}")]
    AdvanceInsideOverride {
        /// Stage of the innermost override
        stage: Stage,
    },
}

impl StageError {
    /// Returns which contract this error violates
    #[must_use]
    pub const fn kind(&self) -> StageErrorKind {
        match self {
            Self::StaleRead { .. } | Self::FutureStage { .. } => StageErrorKind::StaleRead,
            Self::UseAfterRemove { .. } => StageErrorKind::UseAfterRemove,
            Self::BackwardWrite { .. }
            | Self::HistoricalWrite { .. }
            | Self::NonMonotonicAdvance { .. }
            | Self::AdvanceDuringMutation { .. }
            | Self::AdvanceInsideOverride { .. } => StageErrorKind::BackwardStage,
        }
    }
}
