//! # Job Store
//!
//! Lifecycle tracking for asynchronous generation requests.

pub mod store;

pub use store::JobStore;
