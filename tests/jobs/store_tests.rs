use content_core::error::EngineError;
use content_core::jobs::JobStore;
use content_core::models::{ContentRequest, JobFilter, JobPriority, JobProgress, NewJob};
use content_core::state_machine::JobStatus;
use std::sync::Arc;
use uuid::Uuid;

fn job_for(store: &JobStore, topic: &str, priority: JobPriority, user: &str) -> Uuid {
    store
        .create_job(NewJob::from_request(
            "standard",
            ContentRequest::new(topic).with_priority(priority).with_user(user),
        ))
        .id
}

fn fail(store: &JobStore, job_id: Uuid) {
    store
        .update_job_status(job_id, JobStatus::Processing, None, None)
        .unwrap();
    store
        .set_job_error(job_id, content_core::models::JobError::new("step exploded"))
        .unwrap();
}

#[test]
fn test_list_jobs_filters_by_priority_newest_first() {
    let store = JobStore::default();
    let first_high = job_for(&store, "one", JobPriority::High, "u1");
    job_for(&store, "two", JobPriority::Low, "u1");
    let second_high = job_for(&store, "three", JobPriority::High, "u2");
    job_for(&store, "four", JobPriority::Normal, "u2");

    let listing = store.list_jobs(&JobFilter {
        priority: Some(JobPriority::High),
        ..JobFilter::default()
    });

    let ids: Vec<Uuid> = listing.jobs.iter().map(|job| job.id).collect();
    assert_eq!(ids, vec![second_high, first_high]);
    assert_eq!(listing.total, 2);
}

#[test]
fn test_list_jobs_combines_filters_and_limit() {
    let store = JobStore::default();
    for topic in ["a", "b", "c"] {
        job_for(&store, topic, JobPriority::Normal, "u1");
    }
    job_for(&store, "d", JobPriority::Normal, "u2");

    let listing = store.list_jobs(&JobFilter {
        user_id: Some("u1".into()),
        status: Some(JobStatus::Queued),
        limit: Some(2),
        ..JobFilter::default()
    });

    assert_eq!(listing.jobs.len(), 2);
    assert_eq!(listing.total, 3);
    assert!(listing.jobs.iter().all(|job| job.user_id.as_deref() == Some("u1")));
    assert_eq!(listing.jobs[0].request.topic, "c");
}

#[test]
fn test_each_retry_increments_the_count() {
    let store = JobStore::default();
    let job_id = job_for(&store, "retry me", JobPriority::Normal, "u1");

    fail(&store, job_id);
    assert_eq!(store.retry_job(job_id).unwrap().retry_count, 1);
    fail(&store, job_id);
    let job = store.retry_job(job_id).unwrap();

    assert_eq!(job.retry_count, 2);
    assert_eq!(job.status, JobStatus::Queued);
    assert!(job.error.is_none());
    assert!(job.completed_at.is_none());
}

#[test]
fn test_retry_requires_a_failed_job() {
    let store = JobStore::default();
    let job_id = job_for(&store, "not failed", JobPriority::Normal, "u1");

    let queued = store.retry_job(job_id).unwrap_err();
    assert!(matches!(
        queued,
        EngineError::InvalidTransition {
            from: JobStatus::Queued,
            ..
        }
    ));

    store
        .update_job_status(job_id, JobStatus::Processing, None, None)
        .unwrap();
    assert!(store.retry_job(job_id).is_err());

    store
        .update_job_status(job_id, JobStatus::Completed, None, None)
        .unwrap();
    assert!(store.retry_job(job_id).is_err());
    assert_eq!(store.get_job_status(job_id).unwrap().retry_count, 0);
}

#[test]
fn test_unknown_job_is_reported() {
    let store = JobStore::default();
    let missing = Uuid::new_v4();

    assert!(store.get_job_status(missing).is_none());
    assert_eq!(
        store.retry_job(missing).unwrap_err(),
        EngineError::JobNotFound { job_id: missing }
    );
}

#[test]
fn test_completed_job_cannot_be_failed() {
    let store = JobStore::default();
    let job_id = job_for(&store, "done", JobPriority::Normal, "u1");
    store
        .update_job_status(job_id, JobStatus::Processing, None, None)
        .unwrap();
    store
        .update_job_status(job_id, JobStatus::Completed, None, None)
        .unwrap();

    assert!(store
        .set_job_error(job_id, content_core::models::JobError::new("too late"))
        .is_err());
    assert_eq!(store.get_job_status(job_id).unwrap().status, JobStatus::Completed);
}

#[test]
fn test_concurrent_claims_have_one_winner() {
    let store = Arc::new(JobStore::default());
    let job_id = job_for(&store, "contended", JobPriority::Urgent, "u1");

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            std::thread::spawn(move || {
                store
                    .update_job_status(job_id, JobStatus::Processing, None, None)
                    .is_ok()
            })
        })
        .collect();

    let winners = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .filter(|won| *won)
        .count();
    assert_eq!(winners, 1);
}

#[tokio::test]
async fn test_concurrent_progress_never_regresses() {
    let store = Arc::new(JobStore::default());
    let job_id = job_for(&store, "racing progress", JobPriority::Normal, "u1");
    store
        .update_job_status(job_id, JobStatus::Processing, None, None)
        .unwrap();

    let steps: Vec<String> = (0..10).map(|i| format!("step{i}")).collect();
    let tasks: Vec<_> = (1..=steps.len())
        .map(|done| {
            let store = store.clone();
            let completed = steps[..done].to_vec();
            let total = steps.len();
            tokio::spawn(async move {
                let _ = store.update_job_progress(job_id, JobProgress::after_steps(completed, total, None));
                store.get_job_status(job_id).unwrap().progress.percentage
            })
        })
        .collect();

    let mut observed = Vec::new();
    for task in tasks {
        observed.push(task.await.unwrap());
    }

    let final_progress = store.get_job_status(job_id).unwrap().progress;
    assert!(observed.iter().all(|percentage| *percentage <= final_progress.percentage));
    assert_eq!(
        final_progress.completed_steps,
        steps[..final_progress.completed_steps.len()].to_vec()
    );
}

#[test]
fn test_stats_count_each_status() {
    let store = JobStore::default();
    let failed = job_for(&store, "a", JobPriority::Normal, "u1");
    job_for(&store, "b", JobPriority::Normal, "u1");
    fail(&store, failed);

    let stats = store.stats();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.queued, 1);
    assert_eq!(stats.failed, 1);
}
