//! Field descriptors.

use std::fmt;

/// A named projection from a carrier `C` to one of its fields of type `T`.
///
/// This is the versioned cell every typed accessor goes through: reads and
/// writes of any field of any kind are routed by the same engine code, and
/// the name only feeds diagnostics.
pub struct Field<C, T> {
    name: &'static str,
    get: fn(&C) -> &T,
    get_mut: fn(&mut C) -> &mut T,
}

impl<C, T> Field<C, T> {
    /// Describes a field by its name and projections
    #[must_use]
    pub const fn new(name: &'static str, get: fn(&C) -> &T, get_mut: fn(&mut C) -> &mut T) -> Self {
        Self { name, get, get_mut }
    }

    /// Field name as written in the carrier
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Borrows the field out of a carrier
    pub fn get<'car>(&self, carrier: &'car C) -> &'car T {
        (self.get)(carrier)
    }

    /// Mutably borrows the field out of a carrier
    pub fn get_mut<'car>(&self, carrier: &'car mut C) -> &'car mut T {
        (self.get_mut)(carrier)
    }
}

impl<C, T> Clone for Field<C, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C, T> Copy for Field<C, T> {}

impl<C, T> fmt::Debug for Field<C, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Field").field(&self.name).finish()
    }
}
