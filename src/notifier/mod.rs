//! # Realtime Notifier
//!
//! Streams job status and progress to live observers. The notifier attaches
//! to the engine [`EventPublisher`](crate::events::EventPublisher) as its
//! subscriber, so the orchestrator never calls into it directly.

pub mod realtime;
pub mod sink;

pub use realtime::{ConnectionInfo, ConnectionStatistics, RealtimeNotifier};
pub use sink::{ChannelSink, ConnectionSink, NotificationEvent, SinkError};
