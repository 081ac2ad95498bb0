pub mod publisher;
pub mod telemetry;

// Re-export key types for convenience
pub use publisher::{EngineEvent, EventPublisher};
pub use telemetry::{
    NoopTelemetrySink, RecordingTelemetrySink, Telemetry, TelemetryError, TelemetryRecord,
    TelemetrySink, TracingTelemetrySink,
};
