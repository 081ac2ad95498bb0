//! # Feedback Monitor
//!
//! Converts post-publication performance metrics into threshold-triggered
//! signals, ranked improvement suggestions and trend analyses.

pub mod monitor;
pub mod suggestions;
pub mod thresholds;
pub mod trends;

pub use monitor::{
    FeedbackMonitor, MetricsSource, OptimizationSuggestions, SuggestionSource, SyntheticMetricsSource,
};
pub use suggestions::{
    AppliedImprovement, Improvement, ImprovementExecutor, ImprovementPlan, ImprovementReport,
    ImprovementStatus, ImprovementSuggestion, LoggingImprovementExecutor, MetricsSummary,
    SuggestionPriority,
};
pub use thresholds::{AudienceThresholds, MetricThreshold, ThresholdEvaluation, ThresholdKind};
pub use trends::{AudienceInsight, ContentTypeTrend, TrendAnalysis, TrendDirection, TrendStatus};
