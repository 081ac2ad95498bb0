//! # System Constants
//!
//! Event names, metric names and defaults shared across the engine.

/// Telemetry event names emitted by the engine
pub mod events {
    pub const SYNC_COMPLETED: &str = "ContentGeneration:SyncCompleted";
    pub const SYNC_FAILED: &str = "ContentGeneration:SyncFailed";
    pub const JOB_QUEUED: &str = "ContentGeneration:JobQueued";
    pub const JOB_STARTED: &str = "ContentGeneration:JobStarted";
    pub const JOB_COMPLETED: &str = "ContentGeneration:JobCompleted";
    pub const JOB_FAILED: &str = "ContentGeneration:JobFailed";
    pub const JOB_SKIPPED: &str = "ContentGeneration:JobSkipped";

    pub const PERFORMANCE_RECORDED: &str = "FeedbackLoop:PerformanceRecorded";
    pub const PERFORMANCE_ISSUE_DETECTED: &str = "FeedbackLoop:PerformanceIssueDetected";
    pub const IMPROVEMENTS_APPLIED: &str = "FeedbackLoop:ImprovementsApplied";
}

/// Realtime notification `type` tags pushed to live observers
pub mod notifications {
    pub const MSG_TYPE_JOB_STATUS: &str = "job_status";
    pub const MSG_TYPE_JOB_PROGRESS: &str = "job_progress";
}

/// Telemetry metric names
pub mod metrics {
    pub const PROCESSING_TIME_MS: &str = "ContentGeneration:ProcessingTime";
    pub const STEP_DURATION_MS: &str = "ContentGeneration:StepDuration";
    pub const PERFORMANCE_ISSUE_COUNT: &str = "FeedbackLoop:BreachedMetrics";
}

/// Metric keys understood by the feedback thresholds
pub mod metric_keys {
    pub const ENGAGEMENT_SCORE: &str = "engagementScore";
    pub const CONVERSION_RATE: &str = "conversionRate";
    pub const BOUNCE_RATE: &str = "bounceRate";
    pub const TIME_ON_PAGE: &str = "timeOnPage";
    pub const LEAD_QUALITY: &str = "leadQuality";
    pub const SOCIAL_SHARES: &str = "socialShares";
}

/// Built-in defaults
pub mod defaults {
    pub const WORKFLOW_TYPE: &str = "standard";
    pub const LIST_LIMIT: usize = 50;
    pub const MAX_LIST_LIMIT: usize = 500;
    pub const EVENT_CHANNEL_CAPACITY: usize = 1000;
    pub const HIGH_PRIORITY_RATIO: f64 = 0.5;
    pub const TREND_STABILITY_BAND: f64 = 0.05;
    pub const WORDS_PER_MINUTE: usize = 200;
    pub const CHARS_PER_TOKEN: usize = 4;
}
