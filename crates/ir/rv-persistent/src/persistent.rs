//! The read/write indirection shared by every declaration kind.

use rv_stage::{Stage, StageController, StageError, StageResult, StageSource};
use tracing::{debug, trace};

use crate::carrier::{Carrier, Lifecycle};
use crate::dump::HistoryDump;
use crate::field::Field;
use crate::same::SameAs;

/// Stage-versioned storage for one declaration's carrier.
///
/// The head carrier holds the newest field values; `history` holds every
/// superseded carrier in increasing stage order. At most one carrier exists
/// per stage.
#[derive(Clone, Debug)]
pub struct Persistent<C> {
    head: C,
    history: Vec<C>,
}

impl<C: Carrier> Persistent<C> {
    /// Wraps `carrier` as the state of a declaration created at `stage`.
    ///
    /// Any lifecycle already present on the carrier is replaced.
    #[must_use]
    pub fn new(stage: Stage, mut carrier: C) -> Self {
        *carrier.lifecycle_mut() = Lifecycle::created_at(stage);
        Self {
            head: carrier,
            history: Vec::new(),
        }
    }

    /// Lifecycle of the declaration
    #[must_use]
    pub fn lifecycle(&self) -> &Lifecycle {
        self.head.lifecycle()
    }

    /// Number of superseded carriers kept
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Stages at which each stored carrier became current, oldest first,
    /// ending with the head.
    pub fn carrier_stages(&self) -> impl Iterator<Item = Stage> + '_ {
        self.history
            .iter()
            .chain(std::iter::once(&self.head))
            .map(|carrier| carrier.lifecycle().last_modified)
    }

    /// Oldest stage a read can still be answered for
    #[must_use]
    pub fn available_from(&self) -> Stage {
        self.history
            .first()
            .unwrap_or(&self.head)
            .lifecycle()
            .last_modified
    }

    fn check_alive(&self, stage: Stage) -> StageResult<()> {
        let lifecycle = self.lifecycle();
        if stage < lifecycle.created_on {
            return Err(StageError::StaleRead {
                stage,
                available_from: lifecycle.created_on,
            });
        }
        if stage >= lifecycle.removed_on {
            return Err(StageError::UseAfterRemove {
                stage,
                removed_on: lifecycle.removed_on,
            });
        }
        Ok(())
    }

    /// Resolves the carrier visible at the stage `stages` reads at: the
    /// calling thread's visible stage for a controller, the fixed stage for a
    /// [`StageView`](rv_stage::StageView).
    ///
    /// # Errors
    ///
    /// Fails when the stage predates the declaration or its retained history,
    /// or when the declaration was removed at or before that stage.
    pub fn read(&self, stages: &impl StageSource) -> StageResult<&C> {
        self.read_at(stages.read_stage())
    }

    /// Resolves the carrier with the greatest stage not after `stage`.
    ///
    /// # Errors
    ///
    /// See [`read`](Self::read).
    pub fn read_at(&self, stage: Stage) -> StageResult<&C> {
        self.check_alive(stage)?;
        if stage >= self.lifecycle().last_modified {
            return Ok(&self.head);
        }

        let newer = self
            .history
            .partition_point(|carrier| carrier.lifecycle().last_modified <= stage);
        newer
            .checked_sub(1)
            .and_then(|index| self.history.get(index))
            .ok_or(StageError::StaleRead {
                stage,
                available_from: self.available_from(),
            })
    }

    /// Returns the head carrier for mutation at the current stage.
    ///
    /// The first write in a stage moves the old head into the history and
    /// continues on a copy; later writes in the same stage reuse that copy.
    ///
    /// # Errors
    ///
    /// Fails inside a historical read, when the declaration is not alive at
    /// the current stage, or when it was already modified or lowered at a
    /// later stage.
    pub fn write(&mut self, stages: &StageController) -> StageResult<&mut C> {
        let stage = stages.visible_stage();
        let current = stages.current_stage();
        if stage < current {
            return Err(StageError::HistoricalWrite { stage, current });
        }
        self.check_alive(stage)?;

        let lifecycle = *self.lifecycle();
        let newest = lifecycle.last_modified.max(lifecycle.lowered_up_to);
        if stage < newest {
            return Err(StageError::BackwardWrite {
                stage,
                last_modified: newest,
            });
        }

        if stage > lifecycle.last_modified {
            self.history.push(self.head.clone());
            self.head.lifecycle_mut().last_modified = stage;
            trace!(
                from = %lifecycle.last_modified,
                to = %stage,
                history = self.history.len(),
                "snapshotted carrier"
            );
        }
        Ok(&mut self.head)
    }

    /// Reads one field at the stage `stages` reads at.
    ///
    /// # Errors
    ///
    /// See [`read`](Self::read).
    pub fn get<T: Clone>(&self, stages: &impl StageSource, project: impl FnOnce(&C) -> &T) -> StageResult<T> {
        self.read(stages).map(|carrier| project(carrier).clone())
    }

    /// Writes one field at the current stage.
    ///
    /// When `value` is the same as the stored value nothing happens: no
    /// snapshot, no mutation, `last_modified` unchanged. Returns whether the
    /// field changed.
    ///
    /// # Errors
    ///
    /// See [`read`](Self::read) and [`write`](Self::write).
    pub fn set<T: SameAs>(&mut self, stages: &StageController, field: Field<C, T>, value: T) -> StageResult<bool> {
        let stage = stages.visible_stage();
        let current = stages.current_stage();
        if stage < current {
            return Err(StageError::HistoricalWrite { stage, current });
        }
        if field.get(self.read(stages)?).same_as(&value) {
            return Ok(false);
        }

        let carrier = self.write(stages)?;
        *field.get_mut(carrier) = value;
        trace!(field = field.name(), stage = %stages.current_stage(), "field updated");
        Ok(true)
    }

    /// Marks the declaration removed at the current stage.
    ///
    /// History is kept, so reads at earlier stages still succeed.
    ///
    /// # Errors
    ///
    /// Fails inside a historical read, and when the declaration is not alive
    /// at the current stage.
    pub fn remove(&mut self, stages: &StageController) -> StageResult<()> {
        let stage = stages.visible_stage();
        let current = stages.current_stage();
        if stage < current {
            return Err(StageError::HistoricalWrite { stage, current });
        }
        self.check_alive(stage)?;

        self.head.lifecycle_mut().removed_on = stage;
        debug!(%stage, history = self.history.len(), "removed declaration");
        Ok(())
    }

    /// Records that lowering up to `stage` has been applied.
    ///
    /// Writes at stages before the recorded one fail afterwards. Removed
    /// declarations are left alone.
    pub fn mark_lowered(&mut self, stage: Stage) {
        let lifecycle = self.head.lifecycle_mut();
        if stage < lifecycle.removed_on && stage > lifecycle.lowered_up_to {
            lifecycle.lowered_up_to = stage;
        }
    }

    /// Drops carriers no read at `horizon` or later can resolve to.
    ///
    /// Returns how many carriers were dropped.
    pub fn compact(&mut self, horizon: Stage) -> usize {
        let dropped = if self.lifecycle().last_modified <= horizon {
            self.history.len()
        } else {
            self.history
                .partition_point(|carrier| carrier.lifecycle().last_modified <= horizon)
                .saturating_sub(1)
        };
        if dropped > 0 {
            self.history.drain(..dropped);
            debug!(%horizon, dropped, kept = self.history.len(), "compacted history");
        }
        dropped
    }

    /// Renders the lifecycle and carrier chain for diagnostics
    #[must_use]
    pub fn dump(&self) -> HistoryDump<'_, C> {
        HistoryDump::new(self)
    }
}

/// A declaration whose mutable state lives in a [`Persistent`] carrier chain.
pub trait PersistentDeclaration {
    /// The carrier holding this kind's mutable fields
    type Carrier: Carrier;

    /// The carrier chain
    fn persistent(&self) -> &Persistent<Self::Carrier>;

    /// Mutable access to the carrier chain
    fn persistent_mut(&mut self) -> &mut Persistent<Self::Carrier>;

    /// Lifecycle of the declaration
    fn lifecycle(&self) -> &Lifecycle {
        self.persistent().lifecycle()
    }

    /// Whether the declaration has state at `stage`
    fn is_alive_at(&self, stage: Stage) -> bool {
        self.lifecycle().is_alive_at(stage)
    }

    /// Marks the declaration removed at the current stage.
    ///
    /// # Errors
    ///
    /// See [`Persistent::remove`].
    fn remove(&mut self, stages: &StageController) -> StageResult<()> {
        self.persistent_mut().remove(stages)
    }
}
