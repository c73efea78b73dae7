//! Identity comparison for field values.

use std::sync::Arc;

use rv_stage::Stage;

/// Whether two field values are the same value, not merely equal ones.
///
/// Setters skip the write entirely when the new value is the same as the
/// stored one. Shared structures (`Arc`) compare by pointer, so a freshly
/// built but structurally equal list still counts as a change. Plain value
/// types (ids, flags, enums) have no identity beyond their value and compare
/// structurally.
pub trait SameAs {
    /// Identity comparison
    fn same_as(&self, other: &Self) -> bool;
}

impl<T: SameAs> SameAs for Option<T> {
    fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(left), Some(right)) => left.same_as(right),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T: ?Sized> SameAs for Arc<T> {
    fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

/// Implements [`SameAs`] by value equality for `Copy`-like value types.
#[macro_export]
macro_rules! impl_same_as_by_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::SameAs for $ty {
                fn same_as(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

impl_same_as_by_value!(bool, u8, u16, u32, u64, i32, i64, usize, char, Stage);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arc_compares_by_pointer() {
        let first: Arc<[u32]> = Arc::from(vec![1, 2]);
        let equal: Arc<[u32]> = Arc::from(vec![1, 2]);
        assert!(first.same_as(&Arc::clone(&first)));
        assert!(!first.same_as(&equal));
    }

    #[test]
    fn test_option_lifts() {
        assert!(Some(3_u32).same_as(&Some(3)));
        assert!(!Some(3_u32).same_as(&None));
        assert!(None::<u32>.same_as(&None));
    }
}
