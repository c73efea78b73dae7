//! Lowering pass interface

use rayon::prelude::*;
use rv_decl::{DeclarationStore, FunctionDecl, PropertyDecl};
use rv_persistent::PersistentDeclaration;
use rv_stage::{Stage, StageController, StageResult};

use crate::error::DriverResult;

/// One transformation step of the pipeline.
///
/// A pass mutates declarations through the [`LoweringContext`] it is given.
/// It never advances the stage itself.
pub trait LoweringPass: Send + Sync {
    /// Name used in logs and reports
    fn name(&self) -> &str;

    /// Runs the pass at the context's stage.
    ///
    /// # Errors
    ///
    /// Any error aborts the pipeline.
    fn lower(&self, cx: &mut LoweringContext<'_>) -> DriverResult<()>;
}

/// A pass defined by a closure
pub struct FnPass<F> {
    name: String,
    body: F,
}

impl<F> FnPass<F>
where
    F: Fn(&mut LoweringContext<'_>) -> DriverResult<()> + Send + Sync,
{
    /// Wraps `body` as a pass called `name`
    pub fn new(name: impl Into<String>, body: F) -> Self {
        Self {
            name: name.into(),
            body,
        }
    }
}

impl<F> LoweringPass for FnPass<F>
where
    F: Fn(&mut LoweringContext<'_>) -> DriverResult<()> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn lower(&self, cx: &mut LoweringContext<'_>) -> DriverResult<()> {
        (self.body)(cx)
    }
}

/// What a pass sees while it runs
pub struct LoweringContext<'run> {
    store: &'run mut DeclarationStore,
    stages: &'run StageController,
    stage: Stage,
}

impl<'run> LoweringContext<'run> {
    pub(crate) fn new(store: &'run mut DeclarationStore, stages: &'run StageController) -> Self {
        let stage = stages.current_stage();
        Self { store, stages, stage }
    }

    /// Stage this pass runs at
    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    /// The session's stage controller
    #[must_use]
    pub const fn stages(&self) -> &'run StageController {
        self.stages
    }

    /// The declaration store
    #[must_use]
    pub fn store(&self) -> &DeclarationStore {
        &*self.store
    }

    /// Mutable access to the declaration store
    pub fn store_mut(&mut self) -> &mut DeclarationStore {
        &mut *self.store
    }

    /// Runs `lower` on every property alive at this stage, spread over the
    /// rayon pool. Each worker gets exclusive access to the declarations it
    /// visits. Returns how many properties were visited.
    ///
    /// # Errors
    ///
    /// Returns one of the errors raised by `lower`.
    pub fn for_each_property_par<F>(&mut self, lower: F) -> StageResult<usize>
    where
        F: Fn(&StageController, &mut PropertyDecl) -> StageResult<()> + Sync,
    {
        let stages = self.stages;
        let stage = self.stage;
        self.store
            .par_properties_mut()
            .filter(|decl| decl.is_alive_at(stage))
            .map(|decl| lower(stages, decl).map(|()| 1))
            .try_reduce(|| 0, |left, right| Ok(left + right))
    }

    /// Like [`for_each_property_par`](Self::for_each_property_par), for functions.
    ///
    /// # Errors
    ///
    /// Returns one of the errors raised by `lower`.
    pub fn for_each_function_par<F>(&mut self, lower: F) -> StageResult<usize>
    where
        F: Fn(&StageController, &mut FunctionDecl) -> StageResult<()> + Sync,
    {
        let stages = self.stages;
        let stage = self.stage;
        self.store
            .par_functions_mut()
            .filter(|decl| decl.is_alive_at(stage))
            .map(|decl| lower(stages, decl).map(|()| 1))
            .try_reduce(|| 0, |left, right| Ok(left + right))
    }
}
