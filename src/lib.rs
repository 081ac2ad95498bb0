#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Content Core
//!
//! Workflow orchestration and job engine for a layered content-generation
//! backend.
//!
//! ## Overview
//!
//! A content request is piped through a stack of independently owned layer
//! services (intent analysis, keyword research, structuring, generation, SEO
//! optimization, citation and authority scoring). This crate decides which
//! steps run, in what order, synchronously or as a queued job; tracks job
//! progress and failure; streams updates to live observers; and converts
//! post-publication performance data into threshold-triggered signals.
//!
//! ## Module Organization
//!
//! - [`catalog`] - Versioned workflow definitions, validation and execution order
//! - [`jobs`] - Thread-safe job store with per-job atomic transitions
//! - [`orchestration`] - Synchronous and queued pipeline execution
//! - [`notifier`] - Realtime connection and subscription fan-out
//! - [`feedback`] - Performance thresholds, suggestions and trends
//! - [`registry`] - Layer-service collaborator registry
//! - [`events`] - Typed engine event bus and telemetry sinks
//! - [`messaging`] - Work-queue message format
//! - [`state_machine`] - Job status transition rules
//! - [`config`] - Layered configuration
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust
//! use content_core::catalog::WorkflowCatalog;
//! use content_core::jobs::JobStore;
//! use content_core::models::{ContentRequest, NewJob};
//! use content_core::state_machine::JobStatus;
//!
//! let catalog = WorkflowCatalog::with_builtin().unwrap();
//! let quick = catalog.get_workflow("quick").unwrap();
//! assert_eq!(
//!     catalog.get_execution_order(&quick).unwrap(),
//!     vec!["intent_analysis", "content_generation"]
//! );
//!
//! let store = JobStore::default();
//! let job = store.create_job(NewJob::from_request("quick", ContentRequest::new("Rust")));
//! assert_eq!(job.status, JobStatus::Queued);
//! ```

pub mod catalog;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod feedback;
pub mod jobs;
pub mod logging;
pub mod messaging;
pub mod models;
pub mod notifier;
pub mod orchestration;
pub mod registry;
pub mod state_machine;

pub use catalog::WorkflowCatalog;
pub use config::{ConfigManager, EngineConfig};
pub use error::{EngineError, Result, ServiceError};
pub use events::{EngineEvent, EventPublisher, Telemetry};
pub use feedback::FeedbackMonitor;
pub use jobs::JobStore;
pub use messaging::ContentGenerationMessage;
pub use models::{Audience, ContentRequest, GeneratedContent, Job, JobPriority, WorkflowDefinition};
pub use notifier::RealtimeNotifier;
pub use orchestration::{ContentOrchestrator, ProcessOutcome, SyncGenerationResult};
pub use registry::{LayerService, ServiceRegistry};
pub use state_machine::JobStatus;
