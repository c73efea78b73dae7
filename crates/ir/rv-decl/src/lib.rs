//! Stage-versioned IR declarations.
//!
//! Each declaration kind pairs immutable identity (name, location, flags)
//! with a carrier of mutable fields stored through [`rv_persistent`]. The
//! [`DeclarationStore`] creates declarations at the controller's current
//! stage, removes them, and reclaims history no reader can observe anymore.
//!
//! # Examples
//!
//! ```rust
//! use rv_decl::{DeclarationStore, FunctionId, PropertyIdentity};
//! use rv_intern::Interner;
//! use rv_persistent::{Stage, StageController};
//! use rv_span::FileSpan;
//!
//! let stages = StageController::new();
//! let interner = Interner::new();
//! let mut store = DeclarationStore::new();
//!
//! let id = store.create_property(&stages, PropertyIdentity::new(interner.intern("size"), FileSpan::SYNTHETIC))?;
//! stages.advance()?;
//! if let Some(property) = store.property_mut(id) {
//!     property.set_getter(&stages, Some(FunctionId(0)))?;
//! }
//!
//! let property = store.property(id).expect("just created");
//! let before = stages.with_stage(Stage::INITIAL, || property.getter(&stages))?;
//! assert_eq!(before, None);
//! assert_eq!(property.getter(&stages)?, Some(FunctionId(0)));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod attrs;
mod class;
mod config;
mod error;
mod field;
mod function;
mod ids;
mod property;
mod store;

pub use attrs::{Annotation, Annotations, ClassKind, Modality, Origin, SharedList, Visibility};
pub use class::{ClassCarrier, ClassDecl, ClassIdentity};
pub use config::{HistoryConfig, RetentionPolicy, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use field::{FieldCarrier, FieldDecl, FieldIdentity};
pub use function::{FunctionCarrier, FunctionDecl, FunctionIdentity};
pub use ids::{BodyRef, ClassId, DeclId, ExprRef, FieldId, FunctionId, MetadataRef, PropertyId, TypeRef, ValueParameterRef};
pub use property::{PropertyCarrier, PropertyDecl, PropertyIdentity};
pub use store::{DeclarationStore, ReclaimStats};
