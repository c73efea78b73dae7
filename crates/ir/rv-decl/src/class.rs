//! Class declarations.
//!
//! The member list is the field lowerings rewrite most: every pass that adds
//! or drops a member installs a new [`SharedList`], so earlier stages keep
//! seeing the member list they were built against.

use rv_intern::Symbol;
use rv_persistent::{Carrier, HistoryDump, Lifecycle, Persistent, PersistentDeclaration, Stage, StageController, StageResult};
use rv_span::FileSpan;

use crate::attrs::{Annotations, ClassKind, Modality, Origin, SharedList, Visibility};
use crate::ids::{ClassId, DeclId, MetadataRef, TypeRef, ValueParameterRef};

/// Immutable identity of a class
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassIdentity {
    /// Class name
    pub name: Symbol,
    /// Source location
    pub span: FileSpan,
    /// Class, interface, object, ...
    pub kind: ClassKind,
    /// Companion object
    pub is_companion: bool,
    /// Inner class capturing its outer instance
    pub is_inner: bool,
    /// Data class
    pub is_data: bool,
    /// Implemented outside the compiled module
    pub is_external: bool,
    /// Platform declaration to be provided by an actual
    pub is_expect: bool,
    /// Value class
    pub is_value: bool,
    /// Functional interface
    pub is_fun: bool,
}

impl ClassIdentity {
    /// Identity with every flag cleared
    #[must_use]
    pub const fn new(name: Symbol, span: FileSpan, kind: ClassKind) -> Self {
        Self {
            name,
            span,
            kind,
            is_companion: false,
            is_inner: false,
            is_data: false,
            is_external: false,
            is_expect: false,
            is_value: false,
            is_fun: false,
        }
    }
}

/// Mutable fields of a class at one stage
#[derive(Clone, Debug)]
pub struct ClassCarrier {
    lifecycle: Lifecycle,
    /// Enclosing declaration
    pub parent: Option<DeclId>,
    /// Where the class came from
    pub origin: Origin,
    /// Applied annotations
    pub annotations: Annotations,
    /// Visibility
    pub visibility: Visibility,
    /// Modality
    pub modality: Modality,
    /// Direct supertypes
    pub super_types: SharedList<TypeRef>,
    /// Members in declaration order
    pub declarations: SharedList<DeclId>,
    /// Implicit `this` parameter
    pub this_receiver: Option<ValueParameterRef>,
    /// Frontend metadata
    pub metadata: Option<MetadataRef>,
    /// Declaration whose attributes this class shares
    pub attribute_owner: DeclId,
}

impl Carrier for ClassCarrier {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }
}

/// A class declaration
#[derive(Clone, Debug)]
pub struct ClassDecl {
    id: ClassId,
    identity: ClassIdentity,
    state: Persistent<ClassCarrier>,
}

impl ClassDecl {
    pub(crate) fn new(id: ClassId, stage: Stage, identity: ClassIdentity) -> Self {
        let carrier = ClassCarrier {
            lifecycle: Lifecycle::created_at(stage),
            parent: None,
            origin: Origin::Defined,
            annotations: Annotations::empty(),
            visibility: Visibility::Public,
            modality: Modality::Final,
            super_types: SharedList::empty(),
            declarations: SharedList::empty(),
            this_receiver: None,
            metadata: None,
            attribute_owner: DeclId::Class(id),
        };
        Self {
            id,
            identity,
            state: Persistent::new(stage, carrier),
        }
    }

    /// The class's id
    #[must_use]
    pub const fn id(&self) -> ClassId {
        self.id
    }

    /// Identity fields
    #[must_use]
    pub const fn identity(&self) -> &ClassIdentity {
        &self.identity
    }

    /// Class name
    #[must_use]
    pub const fn name(&self) -> Symbol {
        self.identity.name
    }

    /// Lifecycle and carrier chain, for diagnostics
    #[must_use]
    pub fn history(&self) -> HistoryDump<'_, ClassCarrier> {
        self.state.dump()
    }

    /// Appends a member at the current stage.
    ///
    /// # Errors
    ///
    /// Fails when the class cannot be written at the visible stage.
    pub fn add_declaration(&mut self, stages: &StageController, member: DeclId) -> StageResult<()> {
        let members = self.declarations(stages)?.with(member);
        self.set_declarations(stages, members).map(|_| ())
    }

    /// Drops a member at the current stage, returning whether it was present.
    ///
    /// # Errors
    ///
    /// Fails when the class cannot be written at the visible stage.
    pub fn remove_declaration(&mut self, stages: &StageController, member: DeclId) -> StageResult<bool> {
        let members = self.declarations(stages)?;
        if !members.contains(&member) {
            return Ok(false);
        }
        self.set_declarations(stages, members.filtered(|existing| *existing != member))
    }

    rv_persistent::persistent_accessors! {
        ClassCarrier {
            /// Enclosing declaration
            parent / set_parent: Option<DeclId>,
            /// Where the class came from
            origin / set_origin: Origin,
            /// Applied annotations
            annotations / set_annotations: Annotations,
            /// Visibility
            visibility / set_visibility: Visibility,
            /// Modality
            modality / set_modality: Modality,
            /// Direct supertypes
            super_types / set_super_types: SharedList<TypeRef>,
            /// Members in declaration order
            declarations / set_declarations: SharedList<DeclId>,
            /// Implicit `this` parameter
            this_receiver / set_this_receiver: Option<ValueParameterRef>,
            /// Frontend metadata
            metadata / set_metadata: Option<MetadataRef>,
            /// Attribute owner
            attribute_owner / set_attribute_owner: DeclId,
        }
    }
}

impl PersistentDeclaration for ClassDecl {
    type Carrier = ClassCarrier;

    fn persistent(&self) -> &Persistent<ClassCarrier> {
        &self.state
    }

    fn persistent_mut(&mut self) -> &mut Persistent<ClassCarrier> {
        &mut self.state
    }
}

#[cfg(test)]
mod tests {
    use rv_intern::Interner;

    use super::*;
    use crate::ids::{FunctionId, PropertyId};

    #[test]
    fn test_member_list_is_versioned() {
        let stages = StageController::new();
        let interner = Interner::new();
        let identity = ClassIdentity::new(interner.intern("Box"), FileSpan::SYNTHETIC, ClassKind::Class);
        let mut class = ClassDecl::new(ClassId(0), stages.current_stage(), identity);

        let property = DeclId::Property(PropertyId(0));
        class.add_declaration(&stages, property).unwrap();
        stages.advance().unwrap();

        let accessor = DeclId::Function(FunctionId(4));
        class.add_declaration(&stages, accessor).unwrap();
        assert_eq!(class.remove_declaration(&stages, property), Ok(true));
        assert_eq!(class.remove_declaration(&stages, property), Ok(false));

        assert_eq!(&*class.declarations(&stages).unwrap(), &[accessor]);
        let before = stages.with_stage(Stage(0), || class.declarations(&stages)).unwrap();
        assert_eq!(&*before, &[property]);
        assert_eq!(class.persistent().history_len(), 1);
    }
}
