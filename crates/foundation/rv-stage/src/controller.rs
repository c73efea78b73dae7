//! The session-scoped stage controller.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::{StageError, StageResult};
use crate::stage::Stage;
use crate::view::{StageSource, StageView};

static NEXT_CONTROLLER_ID: AtomicU64 = AtomicU64::new(0);

/// Low half of the packed state: live mutation guards.
const IN_FLIGHT_MASK: u64 = 0xFFFF_FFFF;

/// Packs the committed stage (high half) with the guard count (low half), so
/// the barrier check and the stage change are one atomic step.
fn pack(stage: Stage, in_flight: u32) -> u64 {
    (u64::from(stage.0) << 32) | u64::from(in_flight)
}

const fn unpack(state: u64) -> (Stage, usize) {
    (Stage((state >> 32) as u32), (state & IN_FLIGHT_MASK) as usize)
}

thread_local! {
    /// `with_stage` overrides active on this thread, innermost last, tagged
    /// with the owning controller's id.
    static OVERRIDES: RefCell<Vec<(u64, Stage)>> = const { RefCell::new(Vec::new()) };
}

/// Tracks the active stage of one compilation session.
///
/// The controller is shared by reference between the pipeline, the
/// declaration store and any worker threads of a pass. Historical reads made
/// with [`with_stage`](Self::with_stage) are visible only to the calling
/// thread and only for this controller, so independent compilations in one
/// process never see each other's overrides.
#[derive(Debug)]
pub struct StageController {
    id: u64,
    state: AtomicU64,
    pins: Mutex<BTreeMap<Stage, usize>>,
}

impl StageController {
    /// Creates a controller at [`Stage::INITIAL`].
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(Stage::INITIAL)
    }

    /// Creates a controller whose committed stage starts at `stage`.
    #[must_use]
    pub fn starting_at(stage: Stage) -> Self {
        Self {
            id: NEXT_CONTROLLER_ID.fetch_add(1, Ordering::Relaxed),
            state: AtomicU64::new(pack(stage, 0)),
            pins: Mutex::new(BTreeMap::new()),
        }
    }

    /// The committed stage of the pipeline.
    #[must_use]
    pub fn current_stage(&self) -> Stage {
        unpack(self.state.load(Ordering::Acquire)).0
    }

    /// The stage this thread currently observes.
    ///
    /// This is the innermost active [`with_stage`](Self::with_stage) override,
    /// or the committed stage when there is none.
    #[must_use]
    pub fn visible_stage(&self) -> Stage {
        self.override_stage()
            .unwrap_or_else(|| self.current_stage())
    }

    /// A read handle fixed at this thread's visible stage.
    ///
    /// Unlike the controller itself, the view keeps its stage when it is
    /// moved into other threads, so a historical read can be fanned out
    /// over a thread pool.
    #[must_use]
    pub fn view(&self) -> StageView {
        StageView::new(self.visible_stage())
    }

    /// A read handle fixed at `stage`.
    ///
    /// # Errors
    ///
    /// Fails with [`StageError::FutureStage`] when `stage` is ahead of the
    /// committed stage.
    pub fn view_at(&self, stage: Stage) -> StageResult<StageView> {
        let current = self.current_stage();
        if stage > current {
            return Err(StageError::FutureStage {
                requested: stage,
                current,
            });
        }
        Ok(StageView::new(stage))
    }

    /// Whether this thread is inside a historical read.
    #[must_use]
    pub fn is_historical(&self) -> bool {
        self.visible_stage() < self.current_stage()
    }

    fn override_stage(&self) -> Option<Stage> {
        OVERRIDES.with(|stack| {
            stack
                .borrow()
                .iter()
                .rev()
                .find(|(owner, _)| *owner == self.id)
                .map(|&(_, stage)| stage)
        })
    }

    /// Moves the pipeline to the next stage.
    ///
    /// # Errors
    ///
    /// Fails while a [`MutationGuard`] is alive, when called inside
    /// [`with_stage`](Self::with_stage), or once the stage counter is exhausted.
    pub fn advance(&self) -> StageResult<Stage> {
        let current = self.current_stage();
        let target = current
            .checked_next()
            .ok_or(StageError::NonMonotonicAdvance {
                current,
                target: Stage::NEVER,
            })?;
        self.advance_to(target)
    }

    /// Moves the pipeline to `target`, skipping intermediate stages.
    ///
    /// # Errors
    ///
    /// Fails when `target` is not strictly ahead of the committed stage, while
    /// a [`MutationGuard`] is alive, or when called inside
    /// [`with_stage`](Self::with_stage).
    pub fn advance_to(&self, target: Stage) -> StageResult<Stage> {
        if let Some(stage) = self.override_stage() {
            return Err(StageError::AdvanceInsideOverride { stage });
        }

        let state = self.state.load(Ordering::Acquire);
        let (current, in_flight) = unpack(state);
        if in_flight > 0 {
            return Err(StageError::AdvanceDuringMutation { current, in_flight });
        }
        if target <= current || target.is_never() {
            return Err(StageError::NonMonotonicAdvance { current, target });
        }

        // Fails if a guard was taken or the stage moved since the load.
        self.state
            .compare_exchange(state, pack(target, 0), Ordering::AcqRel, Ordering::Acquire)
            .map_err(|actual| match unpack(actual) {
                (moved_to, 0) => StageError::NonMonotonicAdvance {
                    current: moved_to,
                    target,
                },
                (stage, guards) => StageError::AdvanceDuringMutation {
                    current: stage,
                    in_flight: guards,
                },
            })?;

        debug!(from = %current, to = %target, "advanced stage");
        Ok(target)
    }

    /// Marks a mutation of the current stage as in flight.
    ///
    /// The pipeline holds one guard per running pass; [`advance`](Self::advance)
    /// fails until every guard has been dropped. Taking the guard and reading
    /// its stage happen in one atomic step, so [`MutationGuard::stage`] is
    /// the stage the guard actually blocks. At most `u32::MAX` guards may be
    /// alive at once.
    #[must_use = "the barrier is released as soon as the guard is dropped"]
    pub fn begin_mutation(&self) -> MutationGuard<'_> {
        let (stage, _) = unpack(self.state.fetch_add(1, Ordering::AcqRel));
        MutationGuard {
            controller: self,
            stage,
        }
    }

    /// Number of live [`MutationGuard`]s.
    #[must_use]
    pub fn mutations_in_flight(&self) -> usize {
        unpack(self.state.load(Ordering::Acquire)).1
    }

    /// Runs `body` with the visible stage temporarily set to `stage`.
    ///
    /// The override applies to the calling thread only and is undone on
    /// every exit path, including errors and panics. Overrides nest; the
    /// stage stays pinned for the duration of `body`.
    ///
    /// # Errors
    ///
    /// Fails with [`StageError::FutureStage`] when `stage` is ahead of the
    /// committed stage; otherwise returns whatever `body` returns.
    pub fn with_stage<T, E>(&self, stage: Stage, body: impl FnOnce() -> Result<T, E>) -> Result<T, E>
    where
        E: From<StageError>,
    {
        let current = self.current_stage();
        if stage > current {
            return Err(StageError::FutureStage {
                requested: stage,
                current,
            }
            .into());
        }

        let _scope = OverrideScope::enter(self, stage);
        body()
    }

    /// Keeps `stage` inspectable until the returned pin is dropped.
    ///
    /// Pinned stages bound [`reclaim_horizon`](Self::reclaim_horizon), so
    /// history a diagnostic may still ask for is never reclaimed.
    #[must_use = "the stage is unpinned as soon as the pin is dropped"]
    pub fn pin(&self, stage: Stage) -> StagePin<'_> {
        *self.pins.lock().entry(stage).or_insert(0) += 1;
        StagePin {
            controller: self,
            stage,
        }
    }

    /// Oldest stage currently pinned, if any.
    #[must_use]
    pub fn oldest_pinned(&self) -> Option<Stage> {
        self.pins.lock().keys().next().copied()
    }

    /// Oldest stage any live reader may still query.
    #[must_use]
    pub fn reclaim_horizon(&self) -> Stage {
        let current = self.current_stage();
        self.oldest_pinned()
            .map_or(current, |pinned| pinned.min(current))
    }

    fn unpin(&self, stage: Stage) {
        let mut pins = self.pins.lock();
        if let Some(count) = pins.get_mut(&stage) {
            *count -= 1;
            if *count == 0 {
                pins.remove(&stage);
            }
        }
    }
}

impl StageSource for StageController {
    fn read_stage(&self) -> Stage {
        self.visible_stage()
    }
}

impl Default for StageController {
    fn default() -> Self {
        Self::new()
    }
}

/// Barrier token held while a pass mutates declarations.
#[derive(Debug)]
pub struct MutationGuard<'ctl> {
    controller: &'ctl StageController,
    stage: Stage,
}

impl MutationGuard<'_> {
    /// Stage that was current when the guard was taken
    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }
}

impl Drop for MutationGuard<'_> {
    fn drop(&mut self) {
        self.controller.state.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Keeps a stage from being reclaimed.
#[derive(Debug)]
pub struct StagePin<'ctl> {
    controller: &'ctl StageController,
    stage: Stage,
}

impl StagePin<'_> {
    /// The pinned stage
    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }
}

impl Drop for StagePin<'_> {
    fn drop(&mut self) {
        self.controller.unpin(self.stage);
    }
}

/// One entry on the thread-local override stack.
struct OverrideScope<'ctl> {
    _pin: StagePin<'ctl>,
}

impl<'ctl> OverrideScope<'ctl> {
    fn enter(controller: &'ctl StageController, stage: Stage) -> Self {
        let pin = controller.pin(stage);
        OVERRIDES.with(|stack| stack.borrow_mut().push((controller.id, stage)));
        trace!(%stage, "entered historical read");
        Self { _pin: pin }
    }
}

impl Drop for OverrideScope<'_> {
    fn drop(&mut self) {
        OVERRIDES.with(|stack| stack.borrow_mut().pop());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StageErrorKind;
    use std::panic::{self, AssertUnwindSafe};

    #[test]
    fn test_advance_is_monotonic() {
        let stages = StageController::new();
        assert_eq!(stages.advance(), Ok(Stage(1)));
        assert_eq!(stages.advance_to(Stage(4)), Ok(Stage(4)));

        let err = stages.advance_to(Stage(4)).unwrap_err();
        assert_eq!(err.kind(), StageErrorKind::BackwardStage);
        let err = stages.advance_to(Stage(2)).unwrap_err();
        assert_eq!(
            err,
            StageError::NonMonotonicAdvance {
                current: Stage(4),
                target: Stage(2),
            }
        );
        assert_eq!(stages.current_stage(), Stage(4));
    }

    #[test]
    fn test_advance_waits_for_mutations() {
        let stages = StageController::new();
        let guard = stages.begin_mutation();
        assert_eq!(guard.stage(), Stage(0));
        assert_eq!(stages.mutations_in_flight(), 1);

        let err = stages.advance().unwrap_err();
        assert_eq!(
            err,
            StageError::AdvanceDuringMutation {
                current: Stage(0),
                in_flight: 1,
            }
        );

        drop(guard);
        assert_eq!(stages.advance(), Ok(Stage(1)));
    }

    #[test]
    fn test_guard_records_stage_it_blocks() {
        let stages = StageController::new();
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..1_000 {
                        let guard = stages.begin_mutation();
                        assert_eq!(stages.current_stage(), guard.stage());
                        drop(guard);
                    }
                });
            }
            for _ in 0..1_000 {
                if let Err(err) = stages.advance() {
                    assert_eq!(err.kind(), StageErrorKind::BackwardStage);
                }
            }
        });
        assert_eq!(stages.mutations_in_flight(), 0);
    }

    #[test]
    fn test_views_keep_their_stage_on_other_threads() {
        let stages = StageController::starting_at(Stage(3));
        let view = stages
            .with_stage(Stage(1), || Ok::<_, StageError>(stages.view()))
            .unwrap();
        assert_eq!(view.stage(), Stage(1));
        assert_eq!(stages.view().read_stage(), Stage(3));

        let seen = std::thread::scope(|scope| scope.spawn(move || view.read_stage()).join());
        assert_eq!(seen.ok(), Some(Stage(1)));

        assert_eq!(stages.view_at(Stage(2)).map(StageView::stage), Ok(Stage(2)));
        let err = stages.view_at(Stage(4)).unwrap_err();
        assert_eq!(err.kind(), StageErrorKind::StaleRead);
    }

    #[test]
    fn test_with_stage_restores_on_error() {
        let stages = StageController::starting_at(Stage(3));
        let result: StageResult<()> = stages.with_stage(Stage(1), || {
            assert_eq!(stages.visible_stage(), Stage(1));
            assert!(stages.is_historical());
            Err(StageError::StaleRead {
                stage: Stage(1),
                available_from: Stage(2),
            })
        });
        assert!(result.is_err());
        assert_eq!(stages.visible_stage(), Stage(3));
        assert!(!stages.is_historical());
    }

    #[test]
    fn test_with_stage_restores_on_panic() {
        let stages = StageController::starting_at(Stage(2));
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            stages.with_stage(Stage(0), || -> StageResult<()> { panic!("pass crashed") })
        }));
        assert!(outcome.is_err());
        assert_eq!(stages.visible_stage(), Stage(2));
        assert_eq!(stages.oldest_pinned(), None);
    }

    #[test]
    fn test_with_stage_nests() {
        let stages = StageController::starting_at(Stage(5));
        let seen = stages
            .with_stage(Stage(3), || {
                let inner = stages.with_stage(Stage(1), || Ok::<_, StageError>(stages.visible_stage()))?;
                Ok::<_, StageError>((inner, stages.visible_stage()))
            })
            .unwrap();
        assert_eq!(seen, (Stage(1), Stage(3)));
        assert_eq!(stages.visible_stage(), Stage(5));
    }

    #[test]
    fn test_with_stage_rejects_future() {
        let stages = StageController::new();
        let err = stages
            .with_stage(Stage(1), || Ok::<_, StageError>(()))
            .unwrap_err();
        assert_eq!(err.kind(), StageErrorKind::StaleRead);
    }

    #[test]
    fn test_advance_inside_override_fails() {
        let stages = StageController::starting_at(Stage(1));
        let err = stages
            .with_stage(Stage(1), || stages.advance())
            .unwrap_err();
        assert_eq!(err, StageError::AdvanceInsideOverride { stage: Stage(1) });
    }

    #[test]
    fn test_override_is_thread_local() {
        let stages = StageController::starting_at(Stage(2));
        stages
            .with_stage(Stage(0), || {
                let other = std::thread::scope(|scope| {
                    scope.spawn(|| stages.visible_stage()).join()
                });
                assert_eq!(other.ok(), Some(Stage(2)));
                Ok::<_, StageError>(())
            })
            .unwrap();
    }

    #[test]
    fn test_controllers_are_independent() {
        let first = StageController::starting_at(Stage(4));
        let second = StageController::starting_at(Stage(7));
        first
            .with_stage(Stage(1), || {
                assert_eq!(first.visible_stage(), Stage(1));
                assert_eq!(second.visible_stage(), Stage(7));
                Ok::<_, StageError>(())
            })
            .unwrap();
    }

    #[test]
    fn test_pins_bound_horizon() {
        let stages = StageController::starting_at(Stage(6));
        assert_eq!(stages.reclaim_horizon(), Stage(6));

        let older = stages.pin(Stage(2));
        let newer = stages.pin(Stage(4));
        assert_eq!(stages.reclaim_horizon(), Stage(2));

        drop(older);
        assert_eq!(stages.reclaim_horizon(), Stage(4));
        drop(newer);
        assert_eq!(stages.reclaim_horizon(), Stage(6));
    }
}
