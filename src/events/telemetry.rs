//! # Telemetry
//!
//! Named events and numeric metrics with tag dictionaries. Sink failures are
//! logged and swallowed: telemetry never aborts the operation that emitted it.

use crate::config::TelemetryConfig;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

pub type Tags = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TelemetryError {
    #[error("Telemetry sink unavailable: {0}")]
    Unavailable(String),
    #[error("Telemetry payload rejected: {0}")]
    Rejected(String),
}

/// Destination for engine telemetry
pub trait TelemetrySink: Send + Sync {
    fn track_event(&self, name: &str, properties: &Value) -> Result<(), TelemetryError>;

    fn track_metric(&self, name: &str, value: f64, tags: &Tags) -> Result<(), TelemetryError>;

    fn sink_name(&self) -> &str {
        "unnamed_sink"
    }
}

/// Emits telemetry as structured log records
#[derive(Debug, Default)]
pub struct TracingTelemetrySink;

impl TelemetrySink for TracingTelemetrySink {
    fn track_event(&self, name: &str, properties: &Value) -> Result<(), TelemetryError> {
        info!(telemetry_event = %name, properties = %properties, "TELEMETRY_EVENT");
        Ok(())
    }

    fn track_metric(&self, name: &str, value: f64, tags: &Tags) -> Result<(), TelemetryError> {
        info!(telemetry_metric = %name, value = value, tags = ?tags, "TELEMETRY_METRIC");
        Ok(())
    }

    fn sink_name(&self) -> &str {
        "tracing"
    }
}

#[derive(Debug, Default)]
pub struct NoopTelemetrySink;

impl TelemetrySink for NoopTelemetrySink {
    fn track_event(&self, _name: &str, _properties: &Value) -> Result<(), TelemetryError> {
        Ok(())
    }

    fn track_metric(&self, _name: &str, _value: f64, _tags: &Tags) -> Result<(), TelemetryError> {
        Ok(())
    }

    fn sink_name(&self) -> &str {
        "noop"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryRecord {
    Event { name: String, properties: Value },
    Metric { name: String, value: f64, tags: Tags },
}

/// Keeps everything in memory; handy for assertions
#[derive(Debug, Default)]
pub struct RecordingTelemetrySink {
    records: Mutex<Vec<TelemetryRecord>>,
}

impl RecordingTelemetrySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<TelemetryRecord> {
        self.records.lock().clone()
    }

    pub fn event_names(&self) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .filter_map(|record| match record {
                TelemetryRecord::Event { name, .. } => Some(name.clone()),
                TelemetryRecord::Metric { .. } => None,
            })
            .collect()
    }

    pub fn events_named(&self, wanted: &str) -> Vec<Value> {
        self.records
            .lock()
            .iter()
            .filter_map(|record| match record {
                TelemetryRecord::Event { name, properties } if name == wanted => {
                    Some(properties.clone())
                }
                _ => None,
            })
            .collect()
    }
}

impl TelemetrySink for RecordingTelemetrySink {
    fn track_event(&self, name: &str, properties: &Value) -> Result<(), TelemetryError> {
        self.records.lock().push(TelemetryRecord::Event {
            name: name.to_string(),
            properties: properties.clone(),
        });
        Ok(())
    }

    fn track_metric(&self, name: &str, value: f64, tags: &Tags) -> Result<(), TelemetryError> {
        self.records.lock().push(TelemetryRecord::Metric {
            name: name.to_string(),
            value,
            tags: tags.clone(),
        });
        Ok(())
    }

    fn sink_name(&self) -> &str {
        "recording"
    }
}

/// Engine-facing handle around a sink
#[derive(Clone)]
pub struct Telemetry {
    sink: Arc<dyn TelemetrySink>,
    enabled: bool,
}

impl std::fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Telemetry")
            .field("sink", &self.sink.sink_name())
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new(Arc::new(TracingTelemetrySink), true)
    }
}

impl Telemetry {
    pub fn new(sink: Arc<dyn TelemetrySink>, enabled: bool) -> Self {
        Self { sink, enabled }
    }

    pub fn disabled() -> Self {
        Self::new(Arc::new(NoopTelemetrySink), false)
    }

    /// Tracing-backed telemetry, or a no-op when disabled in configuration
    pub fn from_config(config: &TelemetryConfig) -> Self {
        if config.enabled {
            Self::default()
        } else {
            Self::disabled()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn event(&self, name: &str, properties: Value) {
        if !self.enabled {
            return;
        }
        if let Err(e) = self.sink.track_event(name, &properties) {
            warn!(
                sink = self.sink.sink_name(),
                telemetry_event = %name,
                error = %e,
                "Telemetry event dropped"
            );
        }
    }

    pub fn metric(&self, name: &str, value: f64, tags: &[(&str, &str)]) {
        if !self.enabled {
            return;
        }
        let tags: Tags = tags
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        if let Err(e) = self.sink.track_metric(name, value, &tags) {
            warn!(
                sink = self.sink.sink_name(),
                telemetry_metric = %name,
                error = %e,
                "Telemetry metric dropped"
            );
        }
    }
}
