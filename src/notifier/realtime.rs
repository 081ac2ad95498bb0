//! # Realtime Notifier
//!
//! Live-observer connections and their job subscriptions, kept as a
//! connection table plus a `job_id -> {connection_id}` multimap.
//!
//! A connection's entry guard is held while its subscription is added to the
//! multimap, and unregistration removes the connection before cleaning the
//! multimap. Once `unregister_connection` returns, no subscription can still
//! reference the removed connection.

use super::sink::{ConnectionSink, NotificationEvent};
use crate::events::{EngineEvent, EventPublisher};
use crate::models::JobProgress;
use crate::state_machine::JobStatus;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

struct Connection {
    user_id: String,
    sink: Arc<dyn ConnectionSink>,
    subscriptions: HashSet<Uuid>,
    connected_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ConnectionStatistics {
    pub total_connections: usize,
    /// Distinct jobs with at least one subscriber
    pub active_jobs: usize,
    pub total_subscriptions: usize,
}

/// Snapshot of one registered connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub connection_id: String,
    pub user_id: String,
    pub subscribed_job_ids: Vec<Uuid>,
    pub connected_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct RealtimeNotifier {
    connections: DashMap<String, Connection>,
    job_subscribers: DashMap<Uuid, HashSet<String>>,
}

impl std::fmt::Debug for RealtimeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeNotifier")
            .field("statistics", &self.get_connection_statistics())
            .finish()
    }
}

impl RealtimeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection. Re-registering an id replaces the old
    /// connection and drops its subscriptions.
    pub fn register_connection(
        &self,
        connection_id: &str,
        user_id: &str,
        sink: Arc<dyn ConnectionSink>,
    ) {
        if self.connections.contains_key(connection_id) {
            warn!(connection_id = connection_id, "Connection already registered, replacing");
            self.unregister_connection(connection_id);
        }

        self.connections.insert(
            connection_id.to_string(),
            Connection {
                user_id: user_id.to_string(),
                sink,
                subscriptions: HashSet::new(),
                connected_at: Utc::now(),
            },
        );

        info!(
            connection_id = connection_id,
            user_id = user_id,
            total_connections = self.connections.len(),
            "Realtime connection registered"
        );
    }

    /// Remove a connection together with all of its subscriptions
    pub fn unregister_connection(&self, connection_id: &str) -> bool {
        let Some((_, connection)) = self.connections.remove(connection_id) else {
            return false;
        };

        for job_id in &connection.subscriptions {
            self.remove_subscriber(*job_id, connection_id);
        }

        info!(
            connection_id = connection_id,
            user_id = %connection.user_id,
            dropped_subscriptions = connection.subscriptions.len(),
            "Realtime connection unregistered"
        );
        true
    }

    /// Subscribe a registered connection to a job's updates.
    ///
    /// Returns `false` when the connection is unknown.
    pub fn subscribe_to_job(&self, connection_id: &str, job_id: Uuid) -> bool {
        let Some(mut connection) = self.connections.get_mut(connection_id) else {
            debug!(
                connection_id = connection_id,
                job_id = %job_id,
                "Subscription ignored for unknown connection"
            );
            return false;
        };

        connection.subscriptions.insert(job_id);
        self.job_subscribers
            .entry(job_id)
            .or_default()
            .insert(connection_id.to_string());

        debug!(connection_id = connection_id, job_id = %job_id, "Subscribed to job");
        true
    }

    pub fn unsubscribe_from_job(&self, connection_id: &str, job_id: Uuid) -> bool {
        let Some(mut connection) = self.connections.get_mut(connection_id) else {
            return false;
        };
        let removed = connection.subscriptions.remove(&job_id);
        drop(connection);

        if removed {
            self.remove_subscriber(job_id, connection_id);
        }
        removed
    }

    /// Push a status update to every subscriber of `job_id`.
    ///
    /// Returns the number of sinks that accepted the event.
    pub fn send_job_status_update(
        &self,
        job_id: Uuid,
        status: JobStatus,
        message: Option<String>,
    ) -> usize {
        self.deliver(NotificationEvent::JobStatus {
            job_id,
            status,
            message,
            timestamp: Utc::now(),
        })
    }

    pub fn send_job_progress_update(&self, job_id: Uuid, progress: JobProgress) -> usize {
        self.deliver(NotificationEvent::JobProgress {
            job_id,
            progress,
            timestamp: Utc::now(),
        })
    }

    pub fn get_connection_statistics(&self) -> ConnectionStatistics {
        let mut statistics = ConnectionStatistics {
            total_connections: self.connections.len(),
            ..ConnectionStatistics::default()
        };
        for entry in self.job_subscribers.iter() {
            if !entry.value().is_empty() {
                statistics.active_jobs += 1;
                statistics.total_subscriptions += entry.value().len();
            }
        }
        statistics
    }

    pub fn connection_info(&self, connection_id: &str) -> Option<ConnectionInfo> {
        self.connections.get(connection_id).map(|connection| {
            let mut subscribed_job_ids: Vec<Uuid> =
                connection.subscriptions.iter().copied().collect();
            subscribed_job_ids.sort();
            ConnectionInfo {
                connection_id: connection_id.to_string(),
                user_id: connection.user_id.clone(),
                subscribed_job_ids,
                connected_at: connection.connected_at,
            }
        })
    }

    /// Connection ids currently subscribed to `job_id`
    pub fn subscribers_of(&self, job_id: Uuid) -> Vec<String> {
        let mut subscribers: Vec<String> = self
            .job_subscribers
            .get(&job_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        subscribers.sort();
        subscribers
    }

    /// Fan out engine events until the publisher goes away.
    ///
    /// Events for one job are forwarded in the order they were published.
    pub fn attach(self: Arc<Self>, publisher: &EventPublisher) -> JoinHandle<()> {
        let mut receiver = publisher.subscribe();
        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        self.handle_engine_event(event);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped = skipped, "Realtime notifier lagged behind engine events");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Engine event channel closed, realtime notifier detaching");
                        break;
                    }
                }
            }
        })
    }

    /// Translate one engine event into pushes; returns the delivered count
    pub fn handle_engine_event(&self, event: EngineEvent) -> usize {
        match event {
            EngineEvent::JobStatusChanged {
                job_id,
                status,
                message,
                ..
            } => self.send_job_status_update(job_id, status, message),
            EngineEvent::JobProgressUpdated {
                job_id, progress, ..
            } => self.send_job_progress_update(job_id, progress),
            EngineEvent::PerformanceIssueDetected(_) => 0,
        }
    }

    fn deliver(&self, event: NotificationEvent) -> usize {
        let job_id = event.job_id();
        // Snapshot so no multimap guard is held while pushing
        let targets: Vec<String> = match self.job_subscribers.get(&job_id) {
            Some(set) => set.iter().cloned().collect(),
            None => return 0,
        };

        let mut delivered = 0;
        let mut disconnected = Vec::new();
        for connection_id in targets {
            let Some(sink) = self
                .connections
                .get(&connection_id)
                .map(|connection| connection.sink.clone())
            else {
                continue;
            };

            match sink.push(&event) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    debug!(
                        connection_id = %connection_id,
                        job_id = %job_id,
                        error = %e,
                        "Dropping disconnected sink"
                    );
                    disconnected.push(connection_id);
                }
            }
        }

        for connection_id in disconnected {
            self.unregister_connection(&connection_id);
        }

        debug!(
            job_id = %job_id,
            message_type = event.message_type(),
            delivered = delivered,
            "Realtime update delivered"
        );
        delivered
    }

    fn remove_subscriber(&self, job_id: Uuid, connection_id: &str) {
        if let Some(mut subscribers) = self.job_subscribers.get_mut(&job_id) {
            subscribers.remove(connection_id);
        }
        self.job_subscribers
            .remove_if(&job_id, |_, subscribers| subscribers.is_empty());
    }
}
