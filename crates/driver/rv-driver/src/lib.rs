//! Lowering pipeline driver
//!
//! This crate runs lowering passes over a [`DeclarationStore`] in sequence.
//! Each pass runs at its own stage behind a mutation barrier; after it
//! finishes the driver records the lowering, advances the stage controller
//! and reclaims history according to the store configuration.

mod error;
mod pass;
mod pipeline;

pub use error::{DriverError, DriverResult};
pub use pass::{FnPass, LoweringContext, LoweringPass};
pub use pipeline::{LoweringPipeline, PassReport, PipelineReport};

pub use rv_decl::DeclarationStore;
