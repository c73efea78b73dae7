//! String interning for declaration names
//!
//! Declarations store their name and container source as [`Symbol`]s so that
//! carriers stay small and comparing names is a single integer compare.

pub use lasso::Spur as Symbol;
use lasso::ThreadedRodeo;
use std::fmt;
use std::sync::Arc;

/// Thread-safe string interner shared by every declaration in a session
///
/// Cloning is cheap and yields a handle to the same table, so lowering
/// workers can intern names concurrently.
#[derive(Clone, Default)]
pub struct Interner {
    inner: Arc<ThreadedRodeo>,
}

impl Interner {
    /// Creates an empty interner
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `text`, returning the existing symbol if it was seen before
    pub fn intern(&self, text: &str) -> Symbol {
        self.inner.get_or_intern(text)
    }

    /// Looks up a symbol without interning
    #[must_use]
    pub fn get(&self, text: &str) -> Option<Symbol> {
        self.inner.get(text)
    }

    /// Resolves a symbol produced by this interner
    #[must_use]
    pub fn try_resolve(&self, sym: Symbol) -> Option<&str> {
        self.inner.try_resolve(&sym)
    }

    /// Resolves a symbol, rendering foreign symbols as `<unknown>`
    #[must_use]
    pub fn resolve_or_unknown(&self, sym: Symbol) -> &str {
        self.try_resolve(sym).unwrap_or("<unknown>")
    }

    /// Number of distinct strings interned so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether nothing has been interned yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl fmt::Debug for Interner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interner").field("len", &self.len()).finish()
    }
}
