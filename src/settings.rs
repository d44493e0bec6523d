//! Engine settings

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::engine::DEFAULT_OPEN_WINDOW_CEILING;
use crate::yaml_utils::{duration_secs, preprocess_config_yaml};
use crate::{Result, TimingError};

/// Tuning knobs for a results computation.
///
/// ```text
/// MaxConcurrentEvents: 4
/// OpenWindowCeiling: 864000   # seconds, applied when a split's MaxTime is 0
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct EngineSettings {
    /// Events computed at the same time during a race recompute
    pub max_concurrent_events: usize,
    #[serde(with = "duration_secs")]
    pub open_window_ceiling: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self { max_concurrent_events: 4, open_window_ceiling: DEFAULT_OPEN_WINDOW_CEILING }
    }
}

impl EngineSettings {
    /// Parse settings from YAML; missing keys keep their defaults.
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        let cleaned = preprocess_config_yaml(yaml)?;
        let settings: EngineSettings = serde_yaml_ng::from_str(&cleaned)
            .map_err(TimingError::from)
            .context("engine settings")?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_events == 0 {
            return Err(TimingError::invalid_config(
                "settings",
                "MaxConcurrentEvents",
                "must be at least 1",
            ));
        }
        if self.open_window_ceiling.is_zero() {
            return Err(TimingError::invalid_config(
                "settings",
                "OpenWindowCeiling",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}
