//! The carrier contract.

use std::fmt::Debug;

use rv_stage::Stage;

/// Lifecycle stages shared by every declaration kind.
///
/// On the head carrier these describe the declaration itself. On a carrier in
/// the history, `last_modified` is the stage that carrier became current.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Lifecycle {
    /// Stage the declaration was created at
    pub created_on: Stage,
    /// Stage of the most recent write
    pub last_modified: Stage,
    /// Newest stage whose lowering has already been applied
    pub lowered_up_to: Stage,
    /// Stage the declaration was removed on, [`Stage::NEVER`] while alive
    pub removed_on: Stage,
}

impl Lifecycle {
    /// Lifecycle of a declaration created at `stage`
    #[must_use]
    pub const fn created_at(stage: Stage) -> Self {
        Self {
            created_on: stage,
            last_modified: stage,
            lowered_up_to: stage,
            removed_on: Stage::NEVER,
        }
    }

    /// Whether the declaration has state at `stage`
    #[must_use]
    pub fn is_alive_at(&self, stage: Stage) -> bool {
        self.created_on <= stage && stage < self.removed_on
    }

    /// Whether the declaration has been removed at any stage
    #[must_use]
    pub const fn is_removed(&self) -> bool {
        !self.removed_on.is_never()
    }
}

/// The full mutable field set of one declaration kind.
///
/// Kinds do not share carrier data; each carrier embeds a [`Lifecycle`] and
/// exposes it here so the engine can treat every kind alike. Cloning must be
/// shallow: references to other declarations are ids or shared pointers.
pub trait Carrier: Clone + Debug + Send + Sync + 'static {
    /// Lifecycle stages of this carrier
    fn lifecycle(&self) -> &Lifecycle;

    /// Mutable access to the lifecycle stages
    fn lifecycle_mut(&mut self) -> &mut Lifecycle;
}
