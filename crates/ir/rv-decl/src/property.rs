//! Property declarations.
//!
//! A property owns up to three other declarations: its backing field and its
//! accessor functions. Lowerings routinely replace all three (default
//! accessors are generated, backing fields are moved into classes or removed
//! for delegated properties), so these are the fields most often read
//! historically.

use rv_intern::Symbol;
use rv_persistent::{Carrier, HistoryDump, Lifecycle, Persistent, PersistentDeclaration, Stage};
use rv_span::FileSpan;

use crate::attrs::{Annotations, Origin, Visibility};
use crate::ids::{DeclId, FieldId, FunctionId, MetadataRef, PropertyId};

/// Immutable identity of a property, fixed at creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyIdentity {
    /// Property name
    pub name: Symbol,
    /// Source location
    pub span: FileSpan,
    /// Declared with `var`
    pub is_var: bool,
    /// Compile-time constant
    pub is_const: bool,
    /// Initialized after construction
    pub is_lateinit: bool,
    /// Implemented outside the compiled module
    pub is_external: bool,
    /// Platform declaration to be provided by an actual
    pub is_expect: bool,
    /// Name of the compiled container the property was loaded from, if any
    pub container_source: Option<Symbol>,
}

impl PropertyIdentity {
    /// Identity with every flag cleared
    #[must_use]
    pub const fn new(name: Symbol, span: FileSpan) -> Self {
        Self {
            name,
            span,
            is_var: false,
            is_const: false,
            is_lateinit: false,
            is_external: false,
            is_expect: false,
            container_source: None,
        }
    }
}

/// Mutable fields of a property at one stage.
#[derive(Clone, Debug)]
pub struct PropertyCarrier {
    lifecycle: Lifecycle,
    /// Enclosing declaration
    pub parent: Option<DeclId>,
    /// Where the property came from
    pub origin: Origin,
    /// Applied annotations
    pub annotations: Annotations,
    /// Visibility
    pub visibility: Visibility,
    /// Storage, if the property has any
    pub backing_field: Option<FieldId>,
    /// Getter function
    pub getter: Option<FunctionId>,
    /// Setter function, only for `var` properties
    pub setter: Option<FunctionId>,
    /// Frontend metadata
    pub metadata: Option<MetadataRef>,
    /// Declaration whose attributes this property shares
    pub attribute_owner: DeclId,
}

impl PropertyCarrier {
    fn initial(owner: DeclId) -> Self {
        Self {
            lifecycle: Lifecycle::created_at(Stage::INITIAL),
            parent: None,
            origin: Origin::Defined,
            annotations: Annotations::empty(),
            visibility: Visibility::Public,
            backing_field: None,
            getter: None,
            setter: None,
            metadata: None,
            attribute_owner: owner,
        }
    }
}

impl Carrier for PropertyCarrier {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }
}

/// A property declaration.
///
/// Identity is plain data. Every mutable field is reached through a getter
/// and a setter that take the session's stage controller; see
/// [`rv_persistent::Persistent`] for the stage rules they enforce.
#[derive(Clone, Debug)]
pub struct PropertyDecl {
    id: PropertyId,
    identity: PropertyIdentity,
    state: Persistent<PropertyCarrier>,
}

impl PropertyDecl {
    pub(crate) fn new(id: PropertyId, stage: Stage, identity: PropertyIdentity) -> Self {
        Self {
            id,
            identity,
            state: Persistent::new(stage, PropertyCarrier::initial(DeclId::Property(id))),
        }
    }

    /// The property's id
    #[must_use]
    pub const fn id(&self) -> PropertyId {
        self.id
    }

    /// Identity fields
    #[must_use]
    pub const fn identity(&self) -> &PropertyIdentity {
        &self.identity
    }

    /// Property name
    #[must_use]
    pub const fn name(&self) -> Symbol {
        self.identity.name
    }

    /// Lifecycle and carrier chain, for diagnostics
    #[must_use]
    pub fn history(&self) -> HistoryDump<'_, PropertyCarrier> {
        self.state.dump()
    }

    rv_persistent::persistent_accessors! {
        PropertyCarrier {
            /// Enclosing declaration
            parent / set_parent: Option<DeclId>,
            /// Where the property came from
            origin / set_origin: Origin,
            /// Applied annotations
            annotations / set_annotations: Annotations,
            /// Visibility
            visibility / set_visibility: Visibility,
            /// Backing field
            backing_field / set_backing_field: Option<FieldId>,
            /// Getter function
            getter / set_getter: Option<FunctionId>,
            /// Setter function
            setter / set_setter: Option<FunctionId>,
            /// Frontend metadata
            metadata / set_metadata: Option<MetadataRef>,
            /// Declaration whose attributes this property shares
            attribute_owner / set_attribute_owner: DeclId,
        }
    }
}

impl PersistentDeclaration for PropertyDecl {
    type Carrier = PropertyCarrier;

    fn persistent(&self) -> &Persistent<PropertyCarrier> {
        &self.state
    }

    fn persistent_mut(&mut self) -> &mut Persistent<PropertyCarrier> {
        &mut self.state
    }
}

#[cfg(test)]
mod tests {
    use rv_intern::Interner;
    use rv_persistent::{StageController, StageErrorKind};

    use super::*;

    fn property(stages: &StageController) -> PropertyDecl {
        let interner = Interner::new();
        let identity = PropertyIdentity {
            is_var: true,
            ..PropertyIdentity::new(interner.intern("count"), FileSpan::SYNTHETIC)
        };
        PropertyDecl::new(PropertyId(0), stages.current_stage(), identity)
    }

    #[test]
    fn test_defaults() {
        let stages = StageController::new();
        let decl = property(&stages);
        assert_eq!(decl.getter(&stages), Ok(None));
        assert_eq!(decl.visibility(&stages), Ok(Visibility::Public));
        assert_eq!(decl.attribute_owner(&stages), Ok(DeclId::Property(PropertyId(0))));
        assert!(decl.identity().is_var);
    }

    #[test]
    fn test_accessor_replacement_is_versioned() {
        let stages = StageController::new();
        let mut decl = property(&stages);
        decl.set_getter(&stages, Some(FunctionId(1))).unwrap();
        decl.set_setter(&stages, Some(FunctionId(2))).unwrap();
        assert_eq!(decl.persistent().history_len(), 0);

        stages.advance().unwrap();
        decl.set_getter(&stages, Some(FunctionId(3))).unwrap();
        decl.set_backing_field(&stages, None).unwrap();
        assert_eq!(decl.persistent().history_len(), 1);

        let before = stages.with_stage(Stage(0), || {
            Ok::<_, rv_persistent::StageError>((decl.getter(&stages)?, decl.setter(&stages)?))
        });
        assert_eq!(before, Ok((Some(FunctionId(1)), Some(FunctionId(2)))));
        assert_eq!(decl.getter(&stages), Ok(Some(FunctionId(3))));
        assert_eq!(decl.setter(&stages), Ok(Some(FunctionId(2))));
    }

    #[test]
    fn test_removed_property_rejects_setters() {
        let stages = StageController::new();
        let mut decl = property(&stages);
        stages.advance().unwrap();
        decl.remove(&stages).unwrap();
        let err = decl.set_visibility(&stages, Visibility::Private).unwrap_err();
        assert_eq!(err.kind(), StageErrorKind::UseAfterRemove);
    }
}
