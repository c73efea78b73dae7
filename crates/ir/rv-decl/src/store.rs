//! The declaration store.
//!
//! Owns every declaration of a session together with its carrier chain.
//! Declarations are created at the controller's current stage and stay in the
//! store until reclamation proves no reader can observe them anymore.

use rayon::prelude::*;
use rv_persistent::{Lifecycle, PersistentDeclaration, Stage, StageController, StageError, StageResult};
use tracing::{debug, info};

use crate::class::{ClassDecl, ClassIdentity};
use crate::config::RetentionPolicy;
use crate::error::{StoreError, StoreResult};
use crate::field::{FieldDecl, FieldIdentity};
use crate::function::{FunctionDecl, FunctionIdentity};
use crate::ids::{ClassId, DeclId, FieldId, FunctionId, PropertyId};
use crate::property::{PropertyDecl, PropertyIdentity};

#[derive(Clone, Debug)]
enum Slot<D> {
    Live(D),
    Reclaimed { removed_on: Stage },
}

/// Slots of one declaration kind, indexed by the kind's id.
#[derive(Clone, Debug)]
struct DeclTable<D> {
    slots: Vec<Slot<D>>,
}

impl<D> Default for DeclTable<D> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<D: PersistentDeclaration + Send> DeclTable<D> {
    fn next_index(&self, kind: &'static str) -> StoreResult<u32> {
        index_for(self.slots.len()).ok_or(StoreError::IdsExhausted { kind })
    }

    fn push(&mut self, decl: D) {
        self.slots.push(Slot::Live(decl));
    }

    fn get(&self, index: u32) -> Option<&D> {
        match self.slots.get(index as usize)? {
            Slot::Live(decl) => Some(decl),
            Slot::Reclaimed { .. } => None,
        }
    }

    fn get_mut(&mut self, index: u32) -> Option<&mut D> {
        match self.slots.get_mut(index as usize)? {
            Slot::Live(decl) => Some(decl),
            Slot::Reclaimed { .. } => None,
        }
    }

    fn iter(&self) -> impl Iterator<Item = &D> {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Live(decl) => Some(decl),
            Slot::Reclaimed { .. } => None,
        })
    }

    fn par_iter_mut(&mut self) -> impl ParallelIterator<Item = &mut D> {
        self.slots.par_iter_mut().filter_map(|slot| match slot {
            Slot::Live(decl) => Some(decl),
            Slot::Reclaimed { .. } => None,
        })
    }

    fn lifecycle(&self, index: u32) -> Option<&Lifecycle> {
        self.get(index).map(PersistentDeclaration::lifecycle)
    }

    fn remove(&mut self, stages: &StageController, index: u32) -> StageResult<()> {
        match self.slots.get_mut(index as usize) {
            Some(Slot::Live(decl)) => decl.remove(stages),
            Some(Slot::Reclaimed { removed_on }) => Err(StageError::UseAfterRemove {
                stage: stages.visible_stage(),
                removed_on: *removed_on,
            }),
            None => Err(StageError::StaleRead {
                stage: stages.visible_stage(),
                available_from: Stage::NEVER,
            }),
        }
    }

    fn mark_lowered(&mut self, stage: Stage) {
        for slot in &mut self.slots {
            if let Slot::Live(decl) = slot {
                decl.persistent_mut().mark_lowered(stage);
            }
        }
    }

    fn reclaim(&mut self, horizon: Stage, stats: &mut ReclaimStats) {
        for slot in &mut self.slots {
            let Slot::Live(decl) = slot else {
                continue;
            };
            let removed_on = decl.lifecycle().removed_on;
            if removed_on <= horizon {
                stats.carriers_dropped += decl.persistent().history_len() + 1;
                stats.declarations_dropped += 1;
                *slot = Slot::Reclaimed { removed_on };
            } else {
                stats.carriers_dropped += decl.persistent_mut().compact(horizon);
            }
        }
    }

    fn live_count(&self) -> usize {
        self.iter().count()
    }
}

/// Id for the slot at `len`; ids are `u32`, so a table holds at most 2^32
/// declarations.
fn index_for(len: usize) -> Option<u32> {
    u32::try_from(len).ok()
}

/// Outcome of one [`DeclarationStore::reclaim`] run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ReclaimStats {
    /// Oldest stage still readable afterwards
    pub horizon: Stage,
    /// Removed declarations dropped from the store
    pub declarations_dropped: usize,
    /// Carriers dropped, including those of dropped declarations
    pub carriers_dropped: usize,
}

/// Owns every declaration of one compilation session.
#[derive(Clone, Debug, Default)]
pub struct DeclarationStore {
    properties: DeclTable<PropertyDecl>,
    functions: DeclTable<FunctionDecl>,
    fields: DeclTable<FieldDecl>,
    classes: DeclTable<ClassDecl>,
}

/// Declarations can only be created at the committed stage.
fn creation_stage(stages: &StageController) -> StageResult<Stage> {
    let stage = stages.visible_stage();
    let current = stages.current_stage();
    if stage < current {
        return Err(StageError::HistoricalWrite { stage, current });
    }
    Ok(stage)
}

impl DeclarationStore {
    /// Creates an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a property at the current stage.
    ///
    /// # Errors
    ///
    /// Fails inside a historical read, and once every property id is in use.
    pub fn create_property(&mut self, stages: &StageController, identity: PropertyIdentity) -> StoreResult<PropertyId> {
        let stage = creation_stage(stages)?;
        let id = PropertyId(self.properties.next_index("property")?);
        self.properties.push(PropertyDecl::new(id, stage, identity));
        debug!(decl = %DeclId::Property(id), %stage, "created declaration");
        Ok(id)
    }

    /// Creates a function at the current stage.
    ///
    /// # Errors
    ///
    /// Fails inside a historical read, and once every function id is in use.
    pub fn create_function(&mut self, stages: &StageController, identity: FunctionIdentity) -> StoreResult<FunctionId> {
        let stage = creation_stage(stages)?;
        let id = FunctionId(self.functions.next_index("function")?);
        self.functions.push(FunctionDecl::new(id, stage, identity));
        debug!(decl = %DeclId::Function(id), %stage, "created declaration");
        Ok(id)
    }

    /// Creates a field at the current stage.
    ///
    /// # Errors
    ///
    /// Fails inside a historical read, and once every field id is in use.
    pub fn create_field(&mut self, stages: &StageController, identity: FieldIdentity) -> StoreResult<FieldId> {
        let stage = creation_stage(stages)?;
        let id = FieldId(self.fields.next_index("field")?);
        self.fields.push(FieldDecl::new(id, stage, identity));
        debug!(decl = %DeclId::Field(id), %stage, "created declaration");
        Ok(id)
    }

    /// Creates a class at the current stage.
    ///
    /// # Errors
    ///
    /// Fails inside a historical read, and once every class id is in use.
    pub fn create_class(&mut self, stages: &StageController, identity: ClassIdentity) -> StoreResult<ClassId> {
        let stage = creation_stage(stages)?;
        let id = ClassId(self.classes.next_index("class")?);
        self.classes.push(ClassDecl::new(id, stage, identity));
        debug!(decl = %DeclId::Class(id), %stage, "created declaration");
        Ok(id)
    }

    /// Looks up a property; `None` once it has been reclaimed
    #[must_use]
    pub fn property(&self, id: PropertyId) -> Option<&PropertyDecl> {
        self.properties.get(id.0)
    }

    /// Mutable property lookup
    pub fn property_mut(&mut self, id: PropertyId) -> Option<&mut PropertyDecl> {
        self.properties.get_mut(id.0)
    }

    /// Looks up a function; `None` once it has been reclaimed
    #[must_use]
    pub fn function(&self, id: FunctionId) -> Option<&FunctionDecl> {
        self.functions.get(id.0)
    }

    /// Mutable function lookup
    pub fn function_mut(&mut self, id: FunctionId) -> Option<&mut FunctionDecl> {
        self.functions.get_mut(id.0)
    }

    /// Looks up a field; `None` once it has been reclaimed
    #[must_use]
    pub fn field(&self, id: FieldId) -> Option<&FieldDecl> {
        self.fields.get(id.0)
    }

    /// Mutable field lookup
    pub fn field_mut(&mut self, id: FieldId) -> Option<&mut FieldDecl> {
        self.fields.get_mut(id.0)
    }

    /// Looks up a class; `None` once it has been reclaimed
    #[must_use]
    pub fn class(&self, id: ClassId) -> Option<&ClassDecl> {
        self.classes.get(id.0)
    }

    /// Mutable class lookup
    pub fn class_mut(&mut self, id: ClassId) -> Option<&mut ClassDecl> {
        self.classes.get_mut(id.0)
    }

    /// Lifecycle of any declaration still held by the store
    #[must_use]
    pub fn lifecycle(&self, id: DeclId) -> Option<&Lifecycle> {
        match id {
            DeclId::Property(id) => self.properties.lifecycle(id.0),
            DeclId::Function(id) => self.functions.lifecycle(id.0),
            DeclId::Field(id) => self.fields.lifecycle(id.0),
            DeclId::Class(id) => self.classes.lifecycle(id.0),
        }
    }

    /// Marks a declaration removed at the current stage.
    ///
    /// Its history stays readable through historical reads until reclaimed.
    ///
    /// # Errors
    ///
    /// Fails inside a historical read, when the declaration is already
    /// removed, and with a stale-read error for ids this store never issued.
    pub fn remove(&mut self, stages: &StageController, id: DeclId) -> StageResult<()> {
        match id {
            DeclId::Property(id) => self.properties.remove(stages, id.0),
            DeclId::Function(id) => self.functions.remove(stages, id.0),
            DeclId::Field(id) => self.fields.remove(stages, id.0),
            DeclId::Class(id) => self.classes.remove(stages, id.0),
        }
    }

    /// Records that lowering up to `stage` has been applied to every live
    /// declaration.
    pub fn mark_lowered(&mut self, stage: Stage) {
        self.properties.mark_lowered(stage);
        self.functions.mark_lowered(stage);
        self.fields.mark_lowered(stage);
        self.classes.mark_lowered(stage);
    }

    /// Number of declarations not yet reclaimed, removed ones included
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.properties.live_count()
            + self.functions.live_count()
            + self.fields.live_count()
            + self.classes.live_count()
    }

    /// Properties not yet reclaimed
    pub fn properties(&self) -> impl Iterator<Item = &PropertyDecl> {
        self.properties.iter()
    }

    /// Functions not yet reclaimed
    pub fn functions(&self) -> impl Iterator<Item = &FunctionDecl> {
        self.functions.iter()
    }

    /// Fields not yet reclaimed
    pub fn fields(&self) -> impl Iterator<Item = &FieldDecl> {
        self.fields.iter()
    }

    /// Classes not yet reclaimed
    pub fn classes(&self) -> impl Iterator<Item = &ClassDecl> {
        self.classes.iter()
    }

    /// Properties as a parallel iterator of disjoint mutable borrows
    pub fn par_properties_mut(&mut self) -> impl ParallelIterator<Item = &mut PropertyDecl> {
        self.properties.par_iter_mut()
    }

    /// Functions as a parallel iterator of disjoint mutable borrows
    pub fn par_functions_mut(&mut self) -> impl ParallelIterator<Item = &mut FunctionDecl> {
        self.functions.par_iter_mut()
    }

    /// Fields as a parallel iterator of disjoint mutable borrows
    pub fn par_fields_mut(&mut self) -> impl ParallelIterator<Item = &mut FieldDecl> {
        self.fields.par_iter_mut()
    }

    /// Classes as a parallel iterator of disjoint mutable borrows
    pub fn par_classes_mut(&mut self) -> impl ParallelIterator<Item = &mut ClassDecl> {
        self.classes.par_iter_mut()
    }

    /// Drops history no live reader can observe.
    ///
    /// The horizon comes from `policy` and the controller's pins. Removed
    /// declarations whose removal stage is at or before the horizon are
    /// dropped entirely; everything else keeps only the carriers visible at
    /// the horizon or later. Returns `None` under [`RetentionPolicy::KeepAll`].
    pub fn reclaim(&mut self, stages: &StageController, policy: RetentionPolicy) -> Option<ReclaimStats> {
        let horizon = policy.horizon(stages)?;
        let mut stats = ReclaimStats {
            horizon,
            ..ReclaimStats::default()
        };
        self.properties.reclaim(horizon, &mut stats);
        self.functions.reclaim(horizon, &mut stats);
        self.fields.reclaim(horizon, &mut stats);
        self.classes.reclaim(horizon, &mut stats);

        info!(
            %horizon,
            declarations = stats.declarations_dropped,
            carriers = stats.carriers_dropped,
            "reclaimed declaration history"
        );
        Some(stats)
    }
}
