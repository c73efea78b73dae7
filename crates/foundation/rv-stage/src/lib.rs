//! Compilation stage tracking for the Raven IR pipeline.
//!
//! Every lowering pass runs at one [`Stage`]. The [`StageController`] is the
//! single source of truth for which stage is active: the pipeline calls
//! [`StageController::advance`] between passes, and diagnostics use
//! [`StageController::with_stage`] to look at declarations as they were before
//! a pass ran, without touching the committed stage.
//!
//! # Architecture
//!
//! - [`Stage`]: monotonically increasing pipeline position
//! - [`StageController`]: committed stage, advance barrier, scoped overrides
//! - [`MutationGuard`]: marks a pass as in flight; `advance` refuses to run
//!   while one is alive
//! - [`StagePin`]: keeps a stage inspectable so history is not reclaimed
//! - [`StageView`] / [`StageSource`]: the stage a read resolves against;
//!   a view carries a historical stage into worker threads
//! - [`StageError`]: contract violations raised by the controller and by the
//!   persistent declaration engine built on top of it
//!
//! # Examples
//!
//! ```rust
//! use rv_stage::{Stage, StageController, StageError};
//!
//! let stages = StageController::new();
//! stages.advance()?;
//! assert_eq!(stages.current_stage(), Stage(1));
//!
//! let seen = stages.with_stage(Stage::INITIAL, || Ok::<_, StageError>(stages.visible_stage()))?;
//! assert_eq!(seen, Stage::INITIAL);
//! assert_eq!(stages.visible_stage(), Stage(1));
//! # Ok::<(), StageError>(())
//! ```

mod controller;
mod error;
mod stage;
mod view;

pub use controller::{MutationGuard, StageController, StagePin};
pub use error::{StageError, StageErrorKind, StageResult};
pub use stage::Stage;
pub use view::{StageSource, StageView};
