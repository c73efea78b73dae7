//! The stage tag.

use derive_more::{From, Into};
use std::fmt;

/// A point in the lowering pipeline.
///
/// Stages only ever grow. Stage `n` is the state of the IR while the `n`-th
/// lowering pass runs; declarations created by the frontend live at
/// [`Stage::INITIAL`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into)]
pub struct Stage(pub u32);

impl Stage {
    /// Stage of the IR produced by the frontend
    pub const INITIAL: Self = Self(0);

    /// Sentinel for "never": the removal stage of a live declaration
    pub const NEVER: Self = Self(u32::MAX);

    /// The stage after this one, or `None` once the counter is exhausted
    #[must_use]
    pub fn checked_next(self) -> Option<Self> {
        self.0
            .checked_add(1)
            .filter(|&next| next != u32::MAX)
            .map(Self)
    }

    /// The stage `count` steps earlier, clamped at [`Stage::INITIAL`]
    #[must_use]
    pub const fn saturating_back(self, count: u32) -> Self {
        Self(self.0.saturating_sub(count))
    }

    /// Whether this is the "never" sentinel
    #[must_use]
    pub const fn is_never(self) -> bool {
        self.0 == u32::MAX
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_never() {
            f.write_str("never")
        } else {
            write!(f, "stage {}", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_stops_before_sentinel() {
        assert_eq!(Stage(4).checked_next(), Some(Stage(5)));
        assert_eq!(Stage(u32::MAX - 1).checked_next(), None);
        assert_eq!(Stage::NEVER.checked_next(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Stage(3).to_string(), "stage 3");
        assert_eq!(Stage::NEVER.to_string(), "never");
    }

    #[test]
    fn test_saturating_back() {
        assert_eq!(Stage(5).saturating_back(2), Stage(3));
        assert_eq!(Stage(1).saturating_back(4), Stage::INITIAL);
    }
}
