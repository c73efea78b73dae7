//! Field declarations.

use rv_intern::Symbol;
use rv_persistent::{Carrier, HistoryDump, Lifecycle, Persistent, PersistentDeclaration, Stage};
use rv_span::FileSpan;

use crate::attrs::{Annotations, Origin, Visibility};
use crate::ids::{DeclId, ExprRef, FieldId, MetadataRef, PropertyId, TypeRef};

/// Immutable identity of a field
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldIdentity {
    /// Field name
    pub name: Symbol,
    /// Source location
    pub span: FileSpan,
    /// Field type
    pub ty: TypeRef,
    /// Assigned once
    pub is_final: bool,
    /// Belongs to the class rather than an instance
    pub is_static: bool,
    /// Implemented outside the compiled module
    pub is_external: bool,
}

impl FieldIdentity {
    /// Identity with every flag cleared
    #[must_use]
    pub const fn new(name: Symbol, span: FileSpan, ty: TypeRef) -> Self {
        Self {
            name,
            span,
            ty,
            is_final: false,
            is_static: false,
            is_external: false,
        }
    }
}

/// Mutable fields of a field at one stage
#[derive(Clone, Debug)]
pub struct FieldCarrier {
    lifecycle: Lifecycle,
    /// Enclosing declaration
    pub parent: Option<DeclId>,
    /// Where the field came from
    pub origin: Origin,
    /// Applied annotations
    pub annotations: Annotations,
    /// Visibility
    pub visibility: Visibility,
    /// Initializer expression
    pub initializer: Option<ExprRef>,
    /// Property this field backs
    pub corresponding_property: Option<PropertyId>,
    /// Frontend metadata
    pub metadata: Option<MetadataRef>,
}

impl Carrier for FieldCarrier {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }
}

/// A field declaration
#[derive(Clone, Debug)]
pub struct FieldDecl {
    id: FieldId,
    identity: FieldIdentity,
    state: Persistent<FieldCarrier>,
}

impl FieldDecl {
    pub(crate) fn new(id: FieldId, stage: Stage, identity: FieldIdentity) -> Self {
        let carrier = FieldCarrier {
            lifecycle: Lifecycle::created_at(stage),
            parent: None,
            origin: Origin::Defined,
            annotations: Annotations::empty(),
            visibility: Visibility::Private,
            initializer: None,
            corresponding_property: None,
            metadata: None,
        };
        Self {
            id,
            identity,
            state: Persistent::new(stage, carrier),
        }
    }

    /// The field's id
    #[must_use]
    pub const fn id(&self) -> FieldId {
        self.id
    }

    /// Identity fields
    #[must_use]
    pub const fn identity(&self) -> &FieldIdentity {
        &self.identity
    }

    /// Lifecycle and carrier chain, for diagnostics
    #[must_use]
    pub fn history(&self) -> HistoryDump<'_, FieldCarrier> {
        self.state.dump()
    }

    rv_persistent::persistent_accessors! {
        FieldCarrier {
            /// Enclosing declaration
            parent / set_parent: Option<DeclId>,
            /// Where the field came from
            origin / set_origin: Origin,
            /// Applied annotations
            annotations / set_annotations: Annotations,
            /// Visibility
            visibility / set_visibility: Visibility,
            /// Initializer expression
            initializer / set_initializer: Option<ExprRef>,
            /// Property this field backs
            corresponding_property / set_corresponding_property: Option<PropertyId>,
            /// Frontend metadata
            metadata / set_metadata: Option<MetadataRef>,
        }
    }
}

impl PersistentDeclaration for FieldDecl {
    type Carrier = FieldCarrier;

    fn persistent(&self) -> &Persistent<FieldCarrier> {
        &self.state
    }

    fn persistent_mut(&mut self) -> &mut Persistent<FieldCarrier> {
        &mut self.state
    }
}

#[cfg(test)]
mod tests {
    use rv_intern::Interner;
    use rv_persistent::{StageController, StageError};

    use super::*;

    #[test]
    fn test_initializer_moves_to_accessor() {
        let stages = StageController::new();
        let interner = Interner::new();
        let identity = FieldIdentity::new(interner.intern("count$backing"), FileSpan::SYNTHETIC, TypeRef(3));
        let mut field = FieldDecl::new(FieldId(0), stages.current_stage(), identity);

        field.set_initializer(&stages, Some(ExprRef(11))).unwrap();
        stages.advance().unwrap();

        assert_eq!(field.set_corresponding_property(&stages, Some(PropertyId(2))), Ok(true));
        assert_eq!(field.set_initializer(&stages, None), Ok(true));
        assert_eq!(field.set_initializer(&stages, None), Ok(false));
        assert_eq!(field.persistent().history_len(), 1);

        let before = stages
            .with_stage(Stage(0), || {
                Ok::<_, StageError>((field.initializer(&stages)?, field.corresponding_property(&stages)?))
            })
            .unwrap();
        assert_eq!(before, (Some(ExprRef(11)), None));
        assert_eq!(field.initializer(&stages), Ok(None));
        assert_eq!(field.corresponding_property(&stages), Ok(Some(PropertyId(2))));
        assert_eq!(field.identity().ty, TypeRef(3));
    }
}
