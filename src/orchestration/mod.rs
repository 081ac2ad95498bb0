//! # Orchestration Engine
//!
//! Runs content workflows against layer-service collaborators.
//!
//! ## Core Components
//!
//! - **ContentOrchestrator**: synchronous and queued entry points, health reporting
//! - **StepPipeline**: strictly sequential step execution in execution order
//! - **ContentAssembler**: turns an accumulated [`PipelineContext`] into [`GeneratedContent`](crate::models::GeneratedContent)
//!
//! ## Execution Paths
//!
//! ```text
//! generate_content_sync ──► catalog.resolve ──► StepPipeline ──► ContentAssembler ──► caller
//!
//! queue_content_generation ──► JobStore (queued)
//!                                   │
//! external consumer ──► process_content_generation_job
//!                                   │ claim queued → processing
//!                                   ▼
//!                             StepPipeline ──► progress per step ──► EventPublisher ──► RealtimeNotifier
//!                                   │
//!                                   ▼
//!                          completed | failed (recorded, never thrown)
//! ```

pub mod assembler;
pub mod health;
pub mod orchestrator;
pub mod pipeline;
pub mod types;

pub use assembler::ContentAssembler;
pub use health::{HealthState, HealthStatus, LayerHealth, QueueProbe, QueueStatus, ServiceHealth};
pub use orchestrator::{ContentOrchestrator, OrchestratorBuilder};
pub use pipeline::{NoopObserver, PipelineOutcome, StepObserver, StepPipeline};
pub use types::{ExecutionState, PipelineContext, ProcessOutcome, SyncGenerationResult};
