//! Declaration ids and handles owned by other compiler layers.

use std::fmt;

/// Unique ID for a property declaration
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct PropertyId(pub u32);

/// Unique ID for a function declaration (including accessors)
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct FunctionId(pub u32);

/// Unique ID for a field declaration
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct FieldId(pub u32);

/// Unique ID for a class declaration
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct ClassId(pub u32);

/// Any declaration, for cross-referencing
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum DeclId {
    /// Property declaration
    Property(PropertyId),
    /// Function declaration
    Function(FunctionId),
    /// Field declaration
    Field(FieldId),
    /// Class declaration
    Class(ClassId),
}

impl From<PropertyId> for DeclId {
    fn from(id: PropertyId) -> Self {
        Self::Property(id)
    }
}

impl From<FunctionId> for DeclId {
    fn from(id: FunctionId) -> Self {
        Self::Function(id)
    }
}

impl From<FieldId> for DeclId {
    fn from(id: FieldId) -> Self {
        Self::Field(id)
    }
}

impl From<ClassId> for DeclId {
    fn from(id: ClassId) -> Self {
        Self::Class(id)
    }
}

impl fmt::Display for DeclId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Property(id) => write!(f, "property#{}", id.0),
            Self::Function(id) => write!(f, "function#{}", id.0),
            Self::Field(id) => write!(f, "field#{}", id.0),
            Self::Class(id) => write!(f, "class#{}", id.0),
        }
    }
}

/// Handle to a type owned by the type-resolution layer
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub struct TypeRef(pub u32);

/// Handle to a function body owned by the body store
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub struct BodyRef(pub u32);

/// Handle to an expression (initializers, annotation arguments)
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub struct ExprRef(pub u32);

/// Handle to frontend metadata attached to a declaration
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub struct MetadataRef(pub u32);

/// Handle to a value parameter (including receivers)
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub struct ValueParameterRef(pub u32);

rv_persistent::impl_same_as_by_value!(
    PropertyId,
    FunctionId,
    FieldId,
    ClassId,
    DeclId,
    TypeRef,
    BodyRef,
    ExprRef,
    MetadataRef,
    ValueParameterRef,
);
