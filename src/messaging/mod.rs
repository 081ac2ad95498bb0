//! # Messaging
//!
//! Work-queue message formats for the asynchronous generation path. The engine
//! never publishes to the queue itself; an external consumer delivers
//! [`ContentGenerationMessage`]s with at-least-once semantics.

pub mod message;

pub use message::ContentGenerationMessage;
