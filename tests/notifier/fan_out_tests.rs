use content_core::events::{EngineEvent, EventPublisher};
use content_core::models::JobProgress;
use content_core::notifier::{ChannelSink, NotificationEvent, RealtimeNotifier};
use content_core::state_machine::JobStatus;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

#[test]
fn test_unregistered_connection_receives_nothing() {
    let notifier = RealtimeNotifier::new();
    let (sink, mut receiver) = ChannelSink::new();
    let job_id = Uuid::new_v4();

    notifier.register_connection("c1", "u1", Arc::new(sink));
    assert!(notifier.subscribe_to_job("c1", job_id));
    assert!(notifier.unregister_connection("c1"));

    let delivered = notifier.send_job_status_update(job_id, JobStatus::Completed, None);

    assert_eq!(delivered, 0);
    assert!(receiver.try_recv().is_err());
    assert_eq!(notifier.get_connection_statistics().total_connections, 0);
    assert!(!notifier.unregister_connection("c1"));
}

#[test]
fn test_every_subscriber_of_a_job_is_notified() {
    let notifier = RealtimeNotifier::new();
    let (first, mut first_rx) = ChannelSink::new();
    let (second, mut second_rx) = ChannelSink::new();
    let (bystander, mut bystander_rx) = ChannelSink::new();
    let job_id = Uuid::new_v4();

    notifier.register_connection("c1", "u1", Arc::new(first));
    notifier.register_connection("c2", "u2", Arc::new(second));
    notifier.register_connection("c3", "u3", Arc::new(bystander));
    notifier.subscribe_to_job("c1", job_id);
    notifier.subscribe_to_job("c2", job_id);

    let progress = JobProgress::after_steps(vec!["intent_analysis".into()], 4, None);
    assert_eq!(notifier.send_job_progress_update(job_id, progress.clone()), 2);

    for receiver in [&mut first_rx, &mut second_rx] {
        match receiver.try_recv().unwrap() {
            NotificationEvent::JobProgress { progress: received, .. } => {
                assert_eq!(received, progress)
            }
            other => panic!("unexpected notification {other:?}"),
        }
    }
    assert!(bystander_rx.try_recv().is_err());
}

#[test]
fn test_connection_info_lists_subscriptions() {
    let notifier = RealtimeNotifier::new();
    let (sink, _receiver) = ChannelSink::new();
    let job_id = Uuid::new_v4();

    notifier.register_connection("c1", "u1", Arc::new(sink));
    notifier.subscribe_to_job("c1", job_id);

    let info = notifier.connection_info("c1").unwrap();
    assert_eq!(info.user_id, "u1");
    assert_eq!(info.subscribed_job_ids, vec![job_id]);
    assert_eq!(notifier.subscribers_of(job_id), vec!["c1".to_string()]);
}

#[tokio::test]
async fn test_attached_notifier_preserves_per_job_order() {
    let publisher = EventPublisher::new(64);
    let notifier = Arc::new(RealtimeNotifier::new());
    let (sink, mut receiver) = ChannelSink::new();
    let job_id = Uuid::new_v4();
    notifier.register_connection("c1", "u1", Arc::new(sink));
    notifier.subscribe_to_job("c1", job_id);

    let forwarder = notifier.clone().attach(&publisher);

    publisher.publish(EngineEvent::job_status(job_id, JobStatus::Processing, None));
    for done in 1..=3 {
        let steps = (0..done).map(|i| format!("step{i}")).collect();
        publisher.publish(EngineEvent::job_progress(job_id, JobProgress::after_steps(steps, 3, None)));
    }
    publisher.publish(EngineEvent::job_status(job_id, JobStatus::Completed, None));

    let mut kinds = Vec::new();
    for _ in 0..5 {
        let update = tokio::time::timeout(Duration::from_secs(2), receiver.recv())
            .await
            .unwrap()
            .unwrap();
        kinds.push(match update {
            NotificationEvent::JobStatus { status, .. } => status.to_string(),
            NotificationEvent::JobProgress { progress, .. } => progress.percentage.to_string(),
        });
    }
    assert_eq!(kinds, vec!["processing", "33", "66", "100", "completed"]);

    drop(publisher);
    tokio::time::timeout(Duration::from_secs(2), forwarder)
        .await
        .unwrap()
        .unwrap();
}
