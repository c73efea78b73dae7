//! Persistent storage for mutable IR declarations.
//!
//! Lowering passes mutate declarations in place, yet diagnostics and
//! incremental checks need to see a declaration as it was before a given
//! pass. Cloning the whole declaration graph at every stage boundary does not
//! scale, so every declaration keeps its mutable fields in a [`Carrier`] and
//! snapshots that carrier lazily, on the first change within a stage.
//!
//! # Architecture
//!
//! - [`Carrier`] / [`Lifecycle`]: per-kind field record plus the lifecycle
//!   stages every kind shares
//! - [`Persistent`]: head carrier and stage-ordered history; resolves reads
//!   for the visible stage and snapshots on write
//! - [`Field`]: names one carrier field so writes can be logged and skipped
//! - [`SameAs`]: the identity comparison behind the skip-write check
//! - [`PersistentDeclaration`] and [`persistent_accessors!`]: wire typed
//!   getters and setters on a declaration to the engine
//!
//! Readers share `&Persistent` freely; a superseded carrier is never mutated
//! again. Getters accept any [`StageSource`]: pass the controller for the
//! calling thread's stage, or a [`StageView`] when a historical read is spread
//! over worker threads. Writers need `&mut`, so two workers can never write the same
//! declaration within a stage.

mod carrier;
mod dump;
mod field;
mod persistent;
mod same;

pub use carrier::{Carrier, Lifecycle};
pub use dump::HistoryDump;
pub use field::Field;
pub use persistent::{Persistent, PersistentDeclaration};
pub use same::SameAs;

pub use rv_stage::{Stage, StageController, StageError, StageErrorKind, StageResult, StageSource, StageView};

/// Generates a getter and a setter per carrier field on a type implementing
/// [`PersistentDeclaration`].
///
/// ```ignore
/// impl PropertyDecl {
///     persistent_accessors! {
///         PropertyCarrier {
///             /// The property getter
///             getter / set_getter: Option<FunctionId>,
///         }
///     }
/// }
/// ```
#[macro_export]
macro_rules! persistent_accessors {
    ($carrier:ty { $( $(#[$doc:meta])* $field:ident / $setter:ident : $ty:ty ),* $(,)? }) => {
        $(
            $(#[$doc])*
            ///
            /// # Errors
            ///
            /// Fails when the declaration has no state at the stage `stages`
            /// reads at.
            pub fn $field(
                &self,
                stages: &impl $crate::StageSource,
            ) -> $crate::StageResult<$ty> {
                $crate::PersistentDeclaration::persistent(self)
                    .get(stages, |carrier: &$carrier| &carrier.$field)
            }

            #[doc = concat!(
                "Sets `", stringify!($field), "`, returning whether the stored value changed.\n\n",
                "Writing the value already stored leaves the history untouched.\n\n",
                "# Errors\n\n",
                "Fails when the declaration cannot be written at the visible stage."
            )]
            pub fn $setter(
                &mut self,
                stages: &$crate::StageController,
                value: $ty,
            ) -> $crate::StageResult<bool> {
                $crate::PersistentDeclaration::persistent_mut(self).set(
                    stages,
                    $crate::Field::new(
                        stringify!($field),
                        |carrier: &$carrier| &carrier.$field,
                        |carrier: &mut $carrier| &mut carrier.$field,
                    ),
                    value,
                )
            }
        )*
    };
}
