//! Shared fixtures for the cross-crate tests.

use std::sync::Once;

use rv_decl::{
    ClassId, ClassIdentity, ClassKind, DeclarationStore, FieldId, FieldIdentity, FunctionId, FunctionIdentity,
    PropertyId, PropertyIdentity, StoreResult, TypeRef,
};
use rv_intern::Interner;
use rv_span::FileSpan;
use rv_stage::StageController;

/// Installs a test-writer subscriber once per test binary.
///
/// Filtering follows `RUST_LOG`; nothing is printed when it is unset.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// One compilation session: a stage controller, an interner and a store.
#[derive(Debug, Default)]
pub struct Session {
    /// Stage controller shared by every declaration of the session
    pub stages: StageController,
    /// Names of created declarations
    pub interner: Interner,
    /// The declarations
    pub store: DeclarationStore,
}

impl Session {
    /// Creates an empty session at the initial stage with tracing installed
    #[must_use]
    pub fn new() -> Self {
        init_tracing();
        Self::default()
    }

    /// Creates a property named `name` without source location.
    ///
    /// # Errors
    ///
    /// Fails inside a historical read.
    pub fn property(&mut self, name: &str) -> StoreResult<PropertyId> {
        let identity = PropertyIdentity::new(self.interner.intern(name), FileSpan::SYNTHETIC);
        self.store.create_property(&self.stages, identity)
    }

    /// Creates a function named `name`.
    ///
    /// # Errors
    ///
    /// Fails inside a historical read.
    pub fn function(&mut self, name: &str) -> StoreResult<FunctionId> {
        let identity = FunctionIdentity::new(self.interner.intern(name), FileSpan::SYNTHETIC);
        self.store.create_function(&self.stages, identity)
    }

    /// Creates a field named `name` of type `ty`.
    ///
    /// # Errors
    ///
    /// Fails inside a historical read.
    pub fn field(&mut self, name: &str, ty: TypeRef) -> StoreResult<FieldId> {
        let identity = FieldIdentity::new(self.interner.intern(name), FileSpan::SYNTHETIC, ty);
        self.store.create_field(&self.stages, identity)
    }

    /// Creates an ordinary class named `name`.
    ///
    /// # Errors
    ///
    /// Fails inside a historical read.
    pub fn class(&mut self, name: &str) -> StoreResult<ClassId> {
        let identity = ClassIdentity::new(self.interner.intern(name), FileSpan::SYNTHETIC, ClassKind::Class);
        self.store.create_class(&self.stages, identity)
    }
}
