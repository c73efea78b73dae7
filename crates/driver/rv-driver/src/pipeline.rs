//! Sequential pass execution

use std::path::Path;

use anyhow::Result;
use rv_decl::{DeclarationStore, ReclaimStats, StoreConfig};
use rv_stage::{Stage, StageController};
use tracing::{debug, info, info_span};

use crate::error::{DriverError, DriverResult};
use crate::pass::{LoweringContext, LoweringPass};

/// What happened while one pass ran
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PassReport {
    /// Pass name
    pub name: String,
    /// Stage the pass ran at
    pub stage: Stage,
    /// Reclamation performed after the pass, if any was due
    pub reclaimed: Option<ReclaimStats>,
}

/// Summary of a pipeline run
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PipelineReport {
    /// One entry per completed pass, in order
    pub passes: Vec<PassReport>,
}

impl PipelineReport {
    /// Stage the pipeline ended at, if any pass ran
    #[must_use]
    pub fn final_stage(&self) -> Option<Stage> {
        self.passes.last().and_then(|pass| pass.stage.checked_next())
    }
}

/// Ordered lowering passes plus the history settings they run under
pub struct LoweringPipeline {
    config: StoreConfig,
    passes: Vec<Box<dyn LoweringPass>>,
}

impl LoweringPipeline {
    /// Creates an empty pipeline
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            passes: Vec::new(),
        }
    }

    /// Creates an empty pipeline configured from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(StoreConfig::load(config_path)?))
    }

    /// Appends a pass
    #[must_use]
    pub fn with_pass(mut self, pass: impl LoweringPass + 'static) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    /// The configuration in use
    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Number of passes
    #[must_use]
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Whether the pipeline has no passes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Runs every pass in order, advancing the stage after each one.
    ///
    /// A failing pass stops the run; stages already advanced stay advanced.
    ///
    /// # Errors
    ///
    /// Returns the first pass failure, or a stage violation raised while
    /// advancing.
    pub fn run(&self, store: &mut DeclarationStore, stages: &StageController) -> DriverResult<PipelineReport> {
        let mut report = PipelineReport::default();

        for pass in &self.passes {
            let stage = stages.current_stage();
            let span = info_span!("lowering", pass = pass.name(), %stage);
            let _entered = span.enter();

            {
                let _mutation = stages.begin_mutation();
                let mut cx = LoweringContext::new(store, stages);
                pass.lower(&mut cx)
                    .map_err(|source| DriverError::PassFailed {
                        pass: pass.name().to_owned(),
                        stage,
                        source: Box::new(source),
                    })?;
            }

            store.mark_lowered(stage);
            let next = stages.advance()?;

            let history = &self.config.history;
            let reclaimed = if history.reclaim_due(next) {
                store.reclaim(stages, history.retention)
            } else {
                None
            };
            debug!(%next, live = store.live_count(), "pass finished");

            report.passes.push(PassReport {
                name: pass.name().to_owned(),
                stage,
                reclaimed,
            });
        }

        info!(passes = report.passes.len(), stage = %stages.current_stage(), "pipeline finished");
        Ok(report)
    }
}
