//! Attempt lifecycle on top of the engine.
//!
//! The service owns every in-flight attempt, keyed by a generated id. A
//! completed attempt becomes one [`AttemptRecord`] whose id is the attempt
//! id. It is submitted to the sink until accepted; if that fails the record
//! stays put until `retry_submission` succeeds. The record is never rebuilt,
//! so a retry cannot change the score or store a second copy.
//!
//! Attempts are forgotten once submitted or abandoned. Learners who walk
//! away leave their attempt behind; `evict_idle` drops those.
//!
//! The attempt map lock is never held across tree-source or sink I/O.

use std::sync::Arc;

use goldrock_core::models::attempt::{AttemptRecord, AttemptResult};
use goldrock_core::models::traversal::{Progress, TraversalStatus};
use goldrock_trainer::debrief::{Debrief, debrief};
use goldrock_trainer::engine::current_node;
use goldrock_trainer::{Engine, Step};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::sinks::AttemptSink;
use crate::sources::TreeSource;
use crate::state::{ActiveAttempt, AttemptMap};

/// The current node as the learner sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeView {
    pub id: String,
    pub title: String,
    pub content: String,
    pub additional_info: Option<String>,
    /// Option texts in index order; empty at an outcome.
    pub options: Vec<String>,
    pub is_outcome: bool,
}

/// Snapshot of an attempt, returned by every service call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptView {
    pub attempt_id: Uuid,
    pub user_id: String,
    pub tree_id: String,
    pub tree_title: String,
    pub status: TraversalStatus,
    pub node: NodeView,
    pub progress: Progress,
    pub backtracks: u32,
    pub result: Option<AttemptResult>,
    pub debrief: Option<Debrief>,
    /// Set when the result has been accepted by the sink.
    pub record_id: Option<Uuid>,
}

impl AttemptView {
    fn of(attempt_id: Uuid, attempt: &ActiveAttempt, engine: &Engine) -> eyre::Result<Self> {
        let node = current_node(&attempt.state, &attempt.tree)?;
        Ok(Self {
            attempt_id,
            user_id: attempt.user_id.clone(),
            tree_id: attempt.tree.id.clone(),
            tree_title: attempt.tree.title.clone(),
            status: attempt.state.status,
            node: NodeView {
                id: node.id().to_string(),
                title: node.title().to_string(),
                content: node.content().to_string(),
                additional_info: node.additional_info().map(str::to_string),
                options: node.options().iter().map(|o| o.text.clone()).collect(),
                is_outcome: node.is_outcome(),
            },
            progress: engine.progress(&attempt.state, &attempt.tree),
            backtracks: attempt.state.backtracks,
            result: attempt.record.as_ref().map(|r| r.result.clone()),
            debrief: attempt.record.as_ref().map(|r| debrief(&attempt.tree, &r.result)),
            record_id: None,
        })
    }

    pub fn is_submitted(&self) -> bool {
        self.record_id.is_some()
    }
}

pub struct TrainerService<T, S> {
    engine: Engine,
    trees: T,
    sink: S,
    attempts: AttemptMap,
}

impl<T: TreeSource, S: AttemptSink> TrainerService<T, S> {
    pub fn new(engine: Engine, trees: T, sink: S) -> Self {
        Self {
            engine,
            trees,
            sink,
            attempts: AttemptMap::default(),
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn trees(&self) -> &T {
        &self.trees
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub async fn start_attempt(&self, user_id: &str, tree_id: &str) -> eyre::Result<AttemptView> {
        if user_id.trim().is_empty() {
            return Err(eyre::eyre!("user id must not be empty"));
        }

        let tree = Arc::new(self.trees.load_tree(tree_id).await?);
        let state = self.engine.start(&tree)?;

        let attempt_id = Uuid::new_v4();
        let attempt = ActiveAttempt::new(user_id, tree, state);
        let view = AttemptView::of(attempt_id, &attempt, &self.engine)?;
        self.attempts.lock().await.insert(attempt_id, attempt);

        info!(%attempt_id, user_id, tree_id, "attempt started");
        Ok(view)
    }

    /// Choose an option. Landing on an outcome completes the attempt and
    /// submits it; a failed submit is logged and reported through
    /// `record_id: None` rather than as an error.
    pub async fn decide(&self, attempt_id: Uuid, option_index: usize) -> eyre::Result<AttemptView> {
        let (record, view) = {
            let mut attempts = self.attempts.lock().await;
            let attempt = attempts
                .get_mut(&attempt_id)
                .ok_or_else(|| unknown_attempt(attempt_id))?;
            attempt.last_active = jiff::Timestamp::now();

            match self.engine.decide(&mut attempt.state, &attempt.tree, option_index)? {
                Step::Advanced => return AttemptView::of(attempt_id, attempt, &self.engine),
                Step::Completed(result) => {
                    info!(%attempt_id, score = result.score, "attempt completed");
                    attempt.record = Some(AttemptRecord::with_id(
                        attempt_id,
                        attempt.user_id.clone(),
                        result,
                    ));
                    // Claimed under the same lock as completion
                    self.claim(attempt_id, attempt)?
                }
            }
        };

        let (view, outcome) = self.deliver(attempt_id, record, view).await;
        if let Err(e) = outcome {
            warn!(%attempt_id, error = %e, "attempt submission failed, result kept for retry");
        }
        Ok(view)
    }

    pub async fn go_back(&self, attempt_id: Uuid) -> eyre::Result<AttemptView> {
        let mut attempts = self.attempts.lock().await;
        let attempt = attempts
            .get_mut(&attempt_id)
            .ok_or_else(|| unknown_attempt(attempt_id))?;
        attempt.last_active = jiff::Timestamp::now();
        self.engine.go_back(&mut attempt.state)?;
        AttemptView::of(attempt_id, attempt, &self.engine)
    }

    /// Abandon an active attempt. Nothing is submitted and the attempt is
    /// forgotten.
    pub async fn abandon(&self, attempt_id: Uuid) -> eyre::Result<AttemptView> {
        let mut attempts = self.attempts.lock().await;
        let attempt = attempts
            .get_mut(&attempt_id)
            .ok_or_else(|| unknown_attempt(attempt_id))?;
        self.engine.abandon(&mut attempt.state)?;
        let view = AttemptView::of(attempt_id, attempt, &self.engine)?;
        attempts.remove(&attempt_id);

        info!(%attempt_id, "attempt abandoned");
        Ok(view)
    }

    pub async fn view(&self, attempt_id: Uuid) -> eyre::Result<AttemptView> {
        let attempts = self.attempts.lock().await;
        let attempt = attempts
            .get(&attempt_id)
            .ok_or_else(|| unknown_attempt(attempt_id))?;
        AttemptView::of(attempt_id, attempt, &self.engine)
    }

    /// Resubmit the stored record of a completed attempt whose earlier
    /// submit failed.
    pub async fn retry_submission(&self, attempt_id: Uuid) -> eyre::Result<AttemptView> {
        let (record, view) = {
            let mut attempts = self.attempts.lock().await;
            let attempt = attempts
                .get_mut(&attempt_id)
                .ok_or_else(|| unknown_attempt(attempt_id))?;
            self.claim(attempt_id, attempt)?
        };
        let (view, outcome) = self.deliver(attempt_id, record, view).await;
        outcome?;
        Ok(view)
    }

    /// Completed attempts still waiting for a successful submit.
    pub async fn pending_submissions(&self) -> Vec<Uuid> {
        self.attempts
            .lock()
            .await
            .iter()
            .filter(|(_, a)| a.record.is_some())
            .map(|(id, _)| *id)
            .collect()
    }

    pub async fn evict_idle(&self, max_idle: jiff::SignedDuration) -> Vec<Uuid> {
        self.evict_idle_at(jiff::Timestamp::now(), max_idle).await
    }

    /// Drop unfinished attempts nobody has touched for longer than
    /// `max_idle`. Nothing is submitted for them. Completed attempts with a
    /// pending submit are kept.
    pub async fn evict_idle_at(
        &self,
        now: jiff::Timestamp,
        max_idle: jiff::SignedDuration,
    ) -> Vec<Uuid> {
        let mut attempts = self.attempts.lock().await;
        let idle: Vec<Uuid> = attempts
            .iter()
            .filter(|(_, a)| !a.submitting && a.is_idle(now, max_idle))
            .map(|(id, _)| *id)
            .collect();
        for id in &idle {
            attempts.remove(id);
            info!(attempt_id = %id, "idle attempt evicted");
        }
        idle
    }

    /// Mark a completed attempt as being submitted. Must be called with the
    /// attempt map locked. Fails when there is nothing to submit or a submit
    /// is already running; the attempt is unchanged in that case.
    fn claim(
        &self,
        attempt_id: Uuid,
        attempt: &mut ActiveAttempt,
    ) -> eyre::Result<(AttemptRecord, AttemptView)> {
        let Some(record) = attempt.record.clone() else {
            return Err(eyre::eyre!("attempt {attempt_id} has no result to submit"));
        };
        if attempt.submitting {
            return Err(eyre::eyre!("attempt {attempt_id} is already being submitted"));
        }
        let view = AttemptView::of(attempt_id, attempt, &self.engine)?;
        attempt.submitting = true;
        Ok((record, view))
    }

    /// Hand a claimed record to the sink. On success the attempt is
    /// forgotten; on failure the claim is released for a retry.
    async fn deliver(
        &self,
        attempt_id: Uuid,
        record: AttemptRecord,
        mut view: AttemptView,
    ) -> (AttemptView, eyre::Result<()>) {
        let outcome = self.sink.submit(&record).await;

        let mut attempts = self.attempts.lock().await;
        match &outcome {
            Ok(()) => {
                attempts.remove(&attempt_id);
                view.record_id = Some(record.id);
                info!(%attempt_id, record_id = %record.id, "attempt submitted");
            }
            Err(_) => {
                if let Some(attempt) = attempts.get_mut(&attempt_id) {
                    attempt.submitting = false;
                }
            }
        }
        (view, outcome)
    }
}

fn unknown_attempt(attempt_id: Uuid) -> eyre::Report {
    eyre::eyre!("unknown attempt {attempt_id}")
}
