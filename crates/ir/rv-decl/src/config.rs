//! Store configuration.

use std::path::Path;

use anyhow::{Context, Result};
use rv_persistent::{Stage, StageController};
use serde::{Deserialize, Serialize};

/// How much declaration history the store keeps.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RetentionPolicy {
    /// Never reclaim anything
    #[default]
    KeepAll,
    /// Keep whatever a pinned stage or the current stage can observe
    Pinned,
    /// Like `Pinned`, but never drop the given number of most recent stages
    Window(u32),
}

impl RetentionPolicy {
    /// Oldest stage that must stay readable, `None` when nothing may be dropped
    #[must_use]
    pub fn horizon(self, stages: &StageController) -> Option<Stage> {
        match self {
            Self::KeepAll => None,
            Self::Pinned => Some(stages.reclaim_horizon()),
            Self::Window(stages_kept) => Some(
                stages
                    .reclaim_horizon()
                    .min(stages.current_stage().saturating_back(stages_kept)),
            ),
        }
    }
}

/// History settings
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct HistoryConfig {
    /// Retention policy applied on reclamation
    pub retention: RetentionPolicy,
    /// Reclaim after every this many stage advances; `0` disables reclamation
    pub reclaim_interval: u32,
}

impl HistoryConfig {
    /// Whether reclamation is due after advancing to `stage`
    #[must_use]
    pub const fn reclaim_due(&self, stage: Stage) -> bool {
        self.reclaim_interval != 0 && stage.0 % self.reclaim_interval == 0
    }
}

/// Configuration of a declaration store, usually read from `raven-ir.toml`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct StoreConfig {
    /// History settings
    pub history: HistoryConfig,
}

impl StoreConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid configuration.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse store configuration")
    }

    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read store configuration {}", path.display()))?;
        let config = Self::from_toml_str(&text)
            .with_context(|| format!("Invalid store configuration {}", path.display()))?;
        tracing::debug!(path = %path.display(), ?config, "loaded store configuration");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults_keep_everything() {
        let config = StoreConfig::from_toml_str("").unwrap();
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.history.retention, RetentionPolicy::KeepAll);
        assert!(!config.history.reclaim_due(Stage(4)));
    }

    #[test]
    fn test_parse_policies() {
        let pinned = StoreConfig::from_toml_str(
            r#"
            [history]
            retention = "pinned"
            reclaim-interval = 2
            "#,
        )
        .unwrap();
        assert_eq!(pinned.history.retention, RetentionPolicy::Pinned);
        assert!(pinned.history.reclaim_due(Stage(4)));
        assert!(!pinned.history.reclaim_due(Stage(5)));

        let window = StoreConfig::from_toml_str(
            r#"
            [history]
            retention = { window = 3 }
            "#,
        )
        .unwrap();
        assert_eq!(window.history.retention, RetentionPolicy::Window(3));
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let err = StoreConfig::from_toml_str("[history]\nretention = \"forever\"\n").unwrap_err();
        assert!(err.to_string().contains("store configuration"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[history]\nretention = \"keep-all\"\nreclaim-interval = 1").unwrap();
        let config = StoreConfig::load(file.path()).unwrap();
        assert_eq!(config.history.reclaim_interval, 1);

        let missing = StoreConfig::load(file.path().with_extension("missing"));
        assert!(missing.is_err());
    }
}
