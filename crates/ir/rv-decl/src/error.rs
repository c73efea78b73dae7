//! Store errors

use rv_persistent::{StageError, StageErrorKind};
use thiserror::Error;

/// Result type for store operations that can fail outside the stage rules
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised when creating declarations
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A stage contract was violated
    #[error(transparent)]
    Stage(#[from] StageError),

    /// Every `u32` id of one declaration kind is in use
    #[error("no {kind} ids left; a store holds at most 2^32 declarations per kind")]
    IdsExhausted {
        /// Declaration kind, e.g. `property`
        kind: &'static str,
    },
}

impl StoreError {
    /// Error class of the underlying stage violation, if any
    #[must_use]
    pub const fn stage_kind(&self) -> Option<StageErrorKind> {
        match self {
            Self::Stage(err) => Some(err.kind()),
            Self::IdsExhausted { .. } => None,
        }
    }
}
