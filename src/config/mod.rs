//! # Engine Configuration System
//!
//! Layered configuration for the content engine. Every section has working
//! defaults, so an empty configuration source yields a usable engine.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use content_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let limit = manager.config().jobs.default_list_limit;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use crate::constants::defaults;
use crate::feedback::thresholds::AudienceThresholds;
use crate::models::WorkflowDefinition;
use serde::{Deserialize, Serialize};

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Workflow catalog settings and additional definitions
    pub catalog: CatalogConfig,

    /// Job store settings
    pub jobs: JobsConfig,

    /// Realtime notifier settings
    pub notifier: NotifierConfig,

    /// Feedback monitor settings
    pub feedback: FeedbackConfig,

    /// Telemetry sink settings
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Workflow used when a request does not name one
    pub default_workflow: String,
    /// Register the built-in workflows before configured ones
    pub include_builtin: bool,
    /// Extra definitions; a definition with a built-in type replaces it
    pub workflows: Vec<WorkflowDefinition>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            default_workflow: defaults::WORKFLOW_TYPE.to_string(),
            include_builtin: true,
            workflows: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct JobsConfig {
    pub default_list_limit: usize,
    pub max_list_limit: usize,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            default_list_limit: defaults::LIST_LIMIT,
            max_list_limit: defaults::MAX_LIST_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NotifierConfig {
    /// Capacity of the engine event broadcast channel
    pub event_channel_capacity: usize,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: defaults::EVENT_CHANNEL_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// Fraction of breached metrics above which suggestions are high priority
    pub high_priority_ratio: f64,
    /// Relative change of engagement treated as "stable" in trend analysis
    pub trend_stability_band: f64,
    pub thresholds: AudienceThresholds,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            high_priority_ratio: defaults::HIGH_PRIORITY_RATIO,
            trend_stability_band: defaults::TREND_STABILITY_BAND,
            thresholds: AudienceThresholds::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub enabled: bool,
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            service_name: "content-engine".to_string(),
        }
    }
}

impl EngineConfig {
    /// Validate values that serde cannot check on its own
    pub fn validate(&self) -> ConfigResult<()> {
        if self.catalog.default_workflow.trim().is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "catalog.default_workflow",
                "catalog configuration",
            ));
        }

        if self.jobs.default_list_limit == 0 {
            return Err(ConfigurationError::invalid_value(
                "jobs.default_list_limit",
                0,
                "list limit must be greater than 0",
            ));
        }

        if self.jobs.max_list_limit < self.jobs.default_list_limit {
            return Err(ConfigurationError::invalid_value(
                "jobs.max_list_limit",
                self.jobs.max_list_limit,
                "max_list_limit must be at least default_list_limit",
            ));
        }

        if self.notifier.event_channel_capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "notifier.event_channel_capacity",
                0,
                "channel capacity must be greater than 0",
            ));
        }

        let ratio = self.feedback.high_priority_ratio;
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(ConfigurationError::invalid_value(
                "feedback.high_priority_ratio",
                ratio,
                "ratio must be in (0, 1]",
            ));
        }

        if self.feedback.trend_stability_band < 0.0 {
            return Err(ConfigurationError::invalid_value(
                "feedback.trend_stability_band",
                self.feedback.trend_stability_band,
                "stability band must not be negative",
            ));
        }

        Ok(())
    }
}
