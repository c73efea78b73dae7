//! Value types stored in carriers.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use rv_intern::Symbol;
use rv_persistent::SameAs;

use crate::ids::{ClassId, ExprRef};

/// Declaration visibility
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq)]
pub enum Visibility {
    /// Visible everywhere
    #[default]
    Public,
    /// Visible to subclasses
    Protected,
    /// Visible inside the module
    Internal,
    /// Visible inside the container
    Private,
    /// Local to a body
    Local,
}

/// Whether a declaration can be overridden
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq)]
pub enum Modality {
    /// Cannot be overridden
    #[default]
    Final,
    /// Subclasses are known in advance
    Sealed,
    /// May be overridden
    Open,
    /// Must be overridden
    Abstract,
}

/// The flavour of a class declaration
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq)]
pub enum ClassKind {
    /// Ordinary class
    #[default]
    Class,
    /// Interface
    Interface,
    /// Enum class
    Enum,
    /// Entry of an enum class
    EnumEntry,
    /// Annotation class
    Annotation,
    /// Singleton object
    Object,
}

/// Where a declaration came from.
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq)]
pub enum Origin {
    /// Written in source
    #[default]
    Defined,
    /// Inherited member materialized in a subclass
    FakeOverride,
    /// Accessor generated for a property without an explicit one
    DefaultAccessor,
    /// Storage generated for a property
    BackingField,
    /// Generated by the named lowering
    Lowered(Symbol),
}

/// An annotation applied to a declaration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Annotation {
    /// The annotation class
    pub class: ClassId,
    /// Constructor arguments
    pub arguments: SharedList<ExprRef>,
}

/// Annotations of a declaration
pub type Annotations = SharedList<Annotation>;

/// An immutable list shared between carriers.
///
/// Snapshots copy the pointer, not the elements. Two lists are the
/// [same](SameAs) only when they share an allocation; `==` compares elements.
pub struct SharedList<T>(Arc<[T]>);

impl<T> SharedList<T> {
    /// A new empty list
    #[must_use]
    pub fn empty() -> Self {
        Self(Arc::from(Vec::new()))
    }

    /// Takes ownership of `items`
    #[must_use]
    pub fn from_vec(items: Vec<T>) -> Self {
        Self(Arc::from(items))
    }

    /// A new list with `item` appended
    #[must_use]
    pub fn with(&self, item: T) -> Self
    where
        T: Clone,
    {
        self.iter().cloned().chain(std::iter::once(item)).collect()
    }

    /// A new list without the elements `predicate` rejects
    #[must_use]
    pub fn filtered(&self, mut predicate: impl FnMut(&T) -> bool) -> Self
    where
        T: Clone,
    {
        self.iter().filter(|item| predicate(item)).cloned().collect()
    }
}

impl<T> Clone for SharedList<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> Default for SharedList<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> Deref for SharedList<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.0
    }
}

impl<T> FromIterator<T> for SharedList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<T: PartialEq> PartialEq for SharedList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0[..] == other.0[..]
    }
}

impl<T: Eq> Eq for SharedList<T> {}

impl<T: fmt::Debug> fmt::Debug for SharedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> SameAs for SharedList<T> {
    fn same_as(&self, other: &Self) -> bool {
        self.0.same_as(&other.0)
    }
}

rv_persistent::impl_same_as_by_value!(Visibility, Modality, ClassKind, Origin);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_list_identity_vs_equality() {
        let list = SharedList::from_vec(vec![1_u32, 2]);
        let copy = list.clone();
        let rebuilt: SharedList<u32> = list.iter().copied().collect();

        assert!(list.same_as(&copy));
        assert!(!list.same_as(&rebuilt));
        assert_eq!(list, rebuilt);
    }

    #[test]
    fn test_with_and_filtered() {
        let list = SharedList::from_vec(vec![1_u32, 2]).with(3);
        assert_eq!(&*list, &[1, 2, 3]);
        assert_eq!(&*list.filtered(|item| *item != 2), &[1, 3]);
    }
}
