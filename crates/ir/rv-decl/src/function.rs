//! Function declarations, including property accessors and constructors.

use rv_intern::Symbol;
use rv_persistent::{Carrier, HistoryDump, Lifecycle, Persistent, PersistentDeclaration, Stage};
use rv_span::FileSpan;

use crate::attrs::{Annotations, Origin, SharedList, Visibility};
use crate::ids::{BodyRef, DeclId, FunctionId, MetadataRef, PropertyId, TypeRef, ValueParameterRef};

/// Immutable identity of a function
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionIdentity {
    /// Function name
    pub name: Symbol,
    /// Source location
    pub span: FileSpan,
    /// Inlined at call sites
    pub is_inline: bool,
    /// Implemented outside the compiled module
    pub is_external: bool,
    /// Platform declaration to be provided by an actual
    pub is_expect: bool,
    /// Suspending function
    pub is_suspend: bool,
    /// Operator overload
    pub is_operator: bool,
    /// Callable with infix notation
    pub is_infix: bool,
    /// Tail-recursive
    pub is_tailrec: bool,
}

impl FunctionIdentity {
    /// Identity with every flag cleared
    #[must_use]
    pub const fn new(name: Symbol, span: FileSpan) -> Self {
        Self {
            name,
            span,
            is_inline: false,
            is_external: false,
            is_expect: false,
            is_suspend: false,
            is_operator: false,
            is_infix: false,
            is_tailrec: false,
        }
    }
}

/// Mutable fields of a function at one stage
#[derive(Clone, Debug)]
pub struct FunctionCarrier {
    lifecycle: Lifecycle,
    /// Enclosing declaration
    pub parent: Option<DeclId>,
    /// Where the function came from
    pub origin: Origin,
    /// Applied annotations
    pub annotations: Annotations,
    /// Visibility
    pub visibility: Visibility,
    /// Declared or inferred return type
    pub return_type: Option<TypeRef>,
    /// Value parameters in declaration order
    pub value_parameters: SharedList<ValueParameterRef>,
    /// Body, absent for abstract and external functions
    pub body: Option<BodyRef>,
    /// Property this function is an accessor of
    pub corresponding_property: Option<PropertyId>,
    /// Functions this one overrides
    pub overridden: SharedList<FunctionId>,
    /// Frontend metadata
    pub metadata: Option<MetadataRef>,
    /// Declaration whose attributes this function shares
    pub attribute_owner: DeclId,
}

impl Carrier for FunctionCarrier {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }
}

/// A function declaration
#[derive(Clone, Debug)]
pub struct FunctionDecl {
    id: FunctionId,
    identity: FunctionIdentity,
    state: Persistent<FunctionCarrier>,
}

impl FunctionDecl {
    pub(crate) fn new(id: FunctionId, stage: Stage, identity: FunctionIdentity) -> Self {
        let carrier = FunctionCarrier {
            lifecycle: Lifecycle::created_at(stage),
            parent: None,
            origin: Origin::Defined,
            annotations: Annotations::empty(),
            visibility: Visibility::Public,
            return_type: None,
            value_parameters: SharedList::empty(),
            body: None,
            corresponding_property: None,
            overridden: SharedList::empty(),
            metadata: None,
            attribute_owner: DeclId::Function(id),
        };
        Self {
            id,
            identity,
            state: Persistent::new(stage, carrier),
        }
    }

    /// The function's id
    #[must_use]
    pub const fn id(&self) -> FunctionId {
        self.id
    }

    /// Identity fields
    #[must_use]
    pub const fn identity(&self) -> &FunctionIdentity {
        &self.identity
    }

    /// Function name
    #[must_use]
    pub const fn name(&self) -> Symbol {
        self.identity.name
    }

    /// Lifecycle and carrier chain, for diagnostics
    #[must_use]
    pub fn history(&self) -> HistoryDump<'_, FunctionCarrier> {
        self.state.dump()
    }

    rv_persistent::persistent_accessors! {
        FunctionCarrier {
            /// Enclosing declaration
            parent / set_parent: Option<DeclId>,
            /// Where the function came from
            origin / set_origin: Origin,
            /// Applied annotations
            annotations / set_annotations: Annotations,
            /// Visibility
            visibility / set_visibility: Visibility,
            /// Return type
            return_type / set_return_type: Option<TypeRef>,
            /// Value parameters
            value_parameters / set_value_parameters: SharedList<ValueParameterRef>,
            /// Body
            body / set_body: Option<BodyRef>,
            /// Property this function is an accessor of
            corresponding_property / set_corresponding_property: Option<PropertyId>,
            /// Overridden functions
            overridden / set_overridden: SharedList<FunctionId>,
            /// Frontend metadata
            metadata / set_metadata: Option<MetadataRef>,
            /// Attribute owner
            attribute_owner / set_attribute_owner: DeclId,
        }
    }
}

impl PersistentDeclaration for FunctionDecl {
    type Carrier = FunctionCarrier;

    fn persistent(&self) -> &Persistent<FunctionCarrier> {
        &self.state
    }

    fn persistent_mut(&mut self) -> &mut Persistent<FunctionCarrier> {
        &mut self.state
    }
}
