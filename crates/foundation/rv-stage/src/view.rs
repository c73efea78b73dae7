//! Stage handles for reads.

use crate::stage::Stage;

/// Decides which stage a read resolves against.
///
/// [`StageController`](crate::StageController) answers with the calling
/// thread's visible stage. A [`StageView`] answers with a fixed stage on any
/// thread, which is what work handed to a thread pool needs.
pub trait StageSource {
    /// Stage reads through this source observe
    fn read_stage(&self) -> Stage;
}

/// A fixed read stage that can be copied into worker threads.
///
/// Obtained from [`StageController::view`](crate::StageController::view) or
/// [`StageController::view_at`](crate::StageController::view_at).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct StageView {
    stage: Stage,
}

impl StageView {
    pub(crate) const fn new(stage: Stage) -> Self {
        Self { stage }
    }

    /// The stage reads resolve against
    #[must_use]
    pub const fn stage(self) -> Stage {
        self.stage
    }
}

impl StageSource for StageView {
    fn read_stage(&self) -> Stage {
        self.stage
    }
}
