use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use goldrock_app::TrainerService;
use goldrock_app::sinks::{AttemptSink, MemoryAttempts};
use goldrock_app::sources::CatalogTrees;
use goldrock_core::models::attempt::AttemptRecord;
use goldrock_core::models::traversal::TraversalStatus;
use goldrock_trainer::catalog::{chest_pain, sepsis};
use goldrock_trainer::{DecisionHistory, Engine, EngineConfig, TrainerError};
use tokio::sync::{Mutex, Notify};

/// Fails the first `failures` submits, then accepts.
struct FlakySink {
    failures: AtomicUsize,
    calls: AtomicUsize,
    accepted: Mutex<Vec<AttemptRecord>>,
}

impl FlakySink {
    fn failing(failures: usize) -> Self {
        Self {
            failures: AtomicUsize::new(failures),
            calls: AtomicUsize::new(0),
            accepted: Mutex::new(Vec::new()),
        }
    }
}

impl AttemptSink for FlakySink {
    async fn submit(&self, record: &AttemptRecord) -> eyre::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failed = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(eyre::eyre!("bucket unavailable"));
        }
        self.accepted.lock().await.push(record.clone());
        Ok(())
    }
}

/// Stores the record, then fails the first submit as if the progress
/// update behind it had given up.
struct HalfWriteSink {
    inner: MemoryAttempts,
    failed_once: AtomicBool,
}

impl AttemptSink for HalfWriteSink {
    async fn submit(&self, record: &AttemptRecord) -> eyre::Result<()> {
        self.inner.submit(record).await?;
        if !self.failed_once.swap(true, Ordering::SeqCst) {
            return Err(eyre::eyre!("gave up updating progress"));
        }
        Ok(())
    }
}

/// Holds every submit until released.
#[derive(Default)]
struct GatedSink {
    entered: Notify,
    release: Notify,
    inner: MemoryAttempts,
}

impl AttemptSink for GatedSink {
    async fn submit(&self, record: &AttemptRecord) -> eyre::Result<()> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.submit(record).await
    }
}

fn memory_service() -> TrainerService<CatalogTrees, MemoryAttempts> {
    TrainerService::new(Engine::default(), CatalogTrees, MemoryAttempts::new())
}

fn trainer_error(err: &eyre::Report) -> &TrainerError {
    err.downcast_ref::<TrainerError>()
        .expect("expected a TrainerError")
}

#[tokio::test]
async fn completed_attempt_is_submitted_once_and_forgotten() {
    let service = memory_service();

    let view = service.start_attempt("learner-1", chest_pain::ID).await.unwrap();
    assert_eq!(view.node.id, "presentation");
    assert_eq!(view.node.options.len(), 3);
    assert_eq!(view.progress.steps_taken, 1);
    assert_eq!(view.progress.expected_steps, Some(3));

    let view = service.decide(view.attempt_id, 0).await.unwrap();
    assert_eq!(view.node.id, "ecg");
    assert!(view.result.is_none());

    let view = service.decide(view.attempt_id, 0).await.unwrap();
    assert_eq!(view.status, TraversalStatus::Completed);
    assert!(view.node.is_outcome);
    assert!(view.is_submitted());

    let result = view.result.as_ref().unwrap();
    assert_eq!(result.path_taken, vec!["presentation", "ecg", "primary_pci"]);
    assert!(result.is_optimal_path);
    assert!(view.debrief.as_ref().unwrap().is_optimal);

    let records = service.sink().records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].user_id, "learner-1");
    assert_eq!(records[0].id, view.attempt_id);
    assert_eq!(Some(records[0].id), view.record_id);
    assert_eq!(&records[0].result, result);

    assert!(service.view(view.attempt_id).await.is_err());
    assert!(service.pending_submissions().await.is_empty());
}

#[tokio::test]
async fn failed_submit_keeps_result_for_retry() {
    let service = TrainerService::new(Engine::default(), CatalogTrees, FlakySink::failing(1));

    let view = service.start_attempt("learner-2", chest_pain::ID).await.unwrap();
    let id = view.attempt_id;
    service.decide(id, 0).await.unwrap();
    let completed = service.decide(id, 1).await.unwrap();

    assert!(!completed.is_submitted());
    let original = completed.result.clone().unwrap();
    assert_eq!(original.final_outcome, "thrombolysis");
    assert_eq!(service.pending_submissions().await, vec![id]);

    // Still viewable with the same result
    let view = service.view(id).await.unwrap();
    assert_eq!(view.result.as_ref(), Some(&original));

    let retried = service.retry_submission(id).await.unwrap();
    assert!(retried.is_submitted());

    let sink = service.sink();
    assert_eq!(sink.calls.load(Ordering::SeqCst), 2);
    let accepted = sink.accepted.lock().await;
    assert_eq!(accepted.len(), 1);
    assert_eq!(accepted[0].id, id);
    assert_eq!(accepted[0].result, original);
    drop(accepted);

    assert!(service.pending_submissions().await.is_empty());
    assert!(service.retry_submission(id).await.is_err());
}

#[tokio::test]
async fn retry_that_fails_again_reports_the_sink_error() {
    let service = TrainerService::new(Engine::default(), CatalogTrees, FlakySink::failing(2));

    let view = service.start_attempt("learner-3", chest_pain::ID).await.unwrap();
    service.decide(view.attempt_id, 2).await.unwrap();

    let err = service.retry_submission(view.attempt_id).await.unwrap_err();
    assert!(err.to_string().contains("bucket unavailable"));
    assert_eq!(service.pending_submissions().await, vec![view.attempt_id]);

    service.retry_submission(view.attempt_id).await.unwrap();
    assert_eq!(service.sink().accepted.lock().await.len(), 1);
}

#[tokio::test]
async fn completed_attempt_rejects_further_moves() {
    let service = TrainerService::new(Engine::default(), CatalogTrees, FlakySink::failing(1));

    let view = service.start_attempt("learner-4", chest_pain::ID).await.unwrap();
    service.decide(view.attempt_id, 2).await.unwrap();

    let err = service.decide(view.attempt_id, 0).await.unwrap_err();
    assert!(matches!(
        trainer_error(&err),
        TrainerError::InvalidTransition { action: "decide", .. }
    ));

    let err = service.go_back(view.attempt_id).await.unwrap_err();
    assert!(matches!(
        trainer_error(&err),
        TrainerError::InvalidTransition { .. }
    ));

    let err = service.abandon(view.attempt_id).await.unwrap_err();
    assert!(matches!(
        trainer_error(&err),
        TrainerError::InvalidTransition { .. }
    ));
}

#[tokio::test]
async fn retry_on_active_attempt_is_rejected() {
    let service = memory_service();
    let view = service.start_attempt("learner-5", chest_pain::ID).await.unwrap();

    let err = service.retry_submission(view.attempt_id).await.unwrap_err();
    assert!(err.to_string().contains("no result"));
    assert!(service.sink().records().await.is_empty());
}

#[tokio::test]
async fn abandoned_attempt_is_not_submitted() {
    let service = memory_service();
    let view = service.start_attempt("learner-6", sepsis::ID).await.unwrap();
    service.decide(view.attempt_id, 1).await.unwrap();

    let abandoned = service.abandon(view.attempt_id).await.unwrap();
    assert_eq!(abandoned.status, TraversalStatus::Abandoned);
    assert!(abandoned.result.is_none());

    assert!(service.view(view.attempt_id).await.is_err());
    assert!(service.sink().records().await.is_empty());
}

#[tokio::test]
async fn go_back_respects_decision_history() {
    let engine = Engine::new(EngineConfig {
        decision_history: DecisionHistory::Prune,
        ..EngineConfig::default()
    });
    let service = TrainerService::new(engine, CatalogTrees, MemoryAttempts::new());

    let view = service.start_attempt("learner-7", chest_pain::ID).await.unwrap();
    let err = service.go_back(view.attempt_id).await.unwrap_err();
    assert!(matches!(
        trainer_error(&err),
        TrainerError::InvalidTransition { action: "go_back", .. }
    ));

    service.decide(view.attempt_id, 1).await.unwrap();
    let back = service.go_back(view.attempt_id).await.unwrap();
    assert_eq!(back.node.id, "presentation");
    assert_eq!(back.backtracks, 1);

    service.decide(view.attempt_id, 0).await.unwrap();
    let done = service.decide(view.attempt_id, 0).await.unwrap();
    let result = done.result.unwrap();
    assert_eq!(result.backtracks, 1);
    assert_eq!(result.decisions.len(), 2);
    assert_eq!(result.path_taken, vec!["presentation", "ecg", "primary_pci"]);
}

#[tokio::test]
async fn unknown_tree_and_attempt_are_errors() {
    let service = memory_service();

    let err = service.start_attempt("learner-8", "no_such_tree").await.unwrap_err();
    assert_eq!(
        trainer_error(&err),
        &TrainerError::UnknownTree("no_such_tree".to_string())
    );

    assert!(service.start_attempt("  ", chest_pain::ID).await.is_err());
    assert!(service.view(uuid::Uuid::new_v4()).await.is_err());
}

#[tokio::test]
async fn memory_sink_aggregates_progress() {
    let service = memory_service();

    for choice in [1, 0] {
        let view = service.start_attempt("learner-9", chest_pain::ID).await.unwrap();
        service.decide(view.attempt_id, 0).await.unwrap();
        service.decide(view.attempt_id, choice).await.unwrap();
    }

    let progress = service.sink().progress("learner-9", chest_pain::ID).await;
    assert_eq!(progress.attempt_count, 2);
    assert_eq!(progress.optimal_outcomes, 1);
    assert!(progress.best_score.is_some());
}

#[tokio::test]
async fn retry_after_partial_write_stores_one_record() {
    let service = TrainerService::new(
        Engine::default(),
        CatalogTrees,
        HalfWriteSink {
            inner: MemoryAttempts::new(),
            failed_once: AtomicBool::new(false),
        },
    );

    let view = service.start_attempt("learner-10", chest_pain::ID).await.unwrap();
    let id = view.attempt_id;
    service.decide(id, 0).await.unwrap();
    let completed = service.decide(id, 0).await.unwrap();
    assert!(!completed.is_submitted());

    let retried = service.retry_submission(id).await.unwrap();
    assert_eq!(retried.record_id, Some(id));

    let records = service.sink().inner.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, id);
    assert_eq!(Some(&records[0].result), completed.result.as_ref());

    let progress = service.sink().inner.progress("learner-10", chest_pain::ID).await;
    assert_eq!(progress.attempt_count, 1);
}

#[tokio::test]
async fn retry_cannot_take_over_a_running_submit() {
    let service = Arc::new(TrainerService::new(
        Engine::default(),
        CatalogTrees,
        GatedSink::default(),
    ));

    let view = service.start_attempt("learner-11", chest_pain::ID).await.unwrap();
    let id = view.attempt_id;
    service.decide(id, 0).await.unwrap();

    let deciding = tokio::spawn({
        let service = Arc::clone(&service);
        async move { service.decide(id, 0).await }
    });
    service.sink().entered.notified().await;

    let err = service.retry_submission(id).await.unwrap_err();
    assert!(err.to_string().contains("already being submitted"));

    service.sink().release.notify_one();
    let completed = deciding.await.unwrap().unwrap();
    assert_eq!(completed.status, TraversalStatus::Completed);
    assert_eq!(completed.record_id, Some(id));
    assert_eq!(service.sink().inner.records().await.len(), 1);
}

#[tokio::test]
async fn idle_unfinished_attempts_are_evicted() {
    let service = TrainerService::new(Engine::default(), CatalogTrees, FlakySink::failing(1));

    let idle = service.start_attempt("learner-12", sepsis::ID).await.unwrap();
    let pending = service.start_attempt("learner-12", chest_pain::ID).await.unwrap();
    service.decide(pending.attempt_id, 2).await.unwrap();
    assert_eq!(service.pending_submissions().await, vec![pending.attempt_id]);

    let max_idle = jiff::SignedDuration::from_mins(30);
    assert!(service.evict_idle(max_idle).await.is_empty());

    let later = jiff::Timestamp::now()
        .checked_add(jiff::SignedDuration::from_hours(2))
        .unwrap();
    let evicted = service.evict_idle_at(later, max_idle).await;
    assert_eq!(evicted, vec![idle.attempt_id]);

    assert!(service.view(idle.attempt_id).await.is_err());
    service.retry_submission(pending.attempt_id).await.unwrap();
}
