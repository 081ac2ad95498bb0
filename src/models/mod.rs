//! # Data Model
//!
//! Workflow definitions, jobs, content requests/artifacts and performance records.

pub mod content;
pub mod job;
pub mod performance;
pub mod workflow;

pub use content::{Audience, ContentMetadata, ContentRequest, ContentSection, GeneratedContent};
pub use job::{Job, JobError, JobFilter, JobListing, JobPriority, JobProgress, JobStats, NewJob};
pub use performance::{
    metric_map, MetricMap, PerformanceIssue, PerformanceMetricRecord, PerformanceSnapshot,
    TimeRange,
};
pub use workflow::{Layer, WorkflowDefinition, WorkflowStep};
