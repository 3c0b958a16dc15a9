//! Fixpoint deletion engine.
//!
//! Views are dropped without knowing which ones depend on which. Each pass
//! offers every remaining view to the store; the store refuses the ones
//! something else still references, and those are offered again in the next
//! pass. The run ends when nothing is left, or when a whole pass removes
//! nothing (a cycle, a permission problem, or a view that vanished).
//!
//! Every pass that continues removes at least one view, so a run over N
//! candidates makes at most N passes, plus one final stalled pass.

use log::{debug, error, info, warn};
use serde::Serialize;

use super::cancel::CancelToken;
use super::scope::TransactionScope;
use crate::store::{Dialect, RemovableObject, Session, StoreError};

/// Detail recorded for views still pending when a run is cancelled.
pub const CANCELLED_DETAIL: &str = "cancelled before removal";

/// Final result of trying to remove one view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptOutcome {
    pub object: RemovableObject,
    pub succeeded: bool,
    /// Present iff `succeeded` is false
    pub error_detail: Option<String>,
}

impl AttemptOutcome {
    pub fn removed(object: RemovableObject) -> Self {
        Self {
            object,
            succeeded: true,
            error_detail: None,
        }
    }

    pub fn failed(object: RemovableObject, detail: impl Into<String>) -> Self {
        Self {
            object,
            succeeded: false,
            error_detail: Some(detail.into()),
        }
    }
}

/// How an engine run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EngineStatus {
    /// Every candidate was dropped
    AllRemoved,
    /// A full pass removed nothing
    Stalled { last_error: String },
    /// The session stopped accepting transactions
    Fatal { last_error: String },
    /// Stopped between passes on request
    Cancelled,
}

impl EngineStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, EngineStatus::AllRemoved)
    }

    pub fn last_error(&self) -> Option<&str> {
        match self {
            EngineStatus::Stalled { last_error } | EngineStatus::Fatal { last_error } => Some(last_error),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EngineStatus::AllRemoved => "all_removed",
            EngineStatus::Stalled { .. } => "stalled",
            EngineStatus::Fatal { .. } => "fatal",
            EngineStatus::Cancelled => "cancelled",
        }
    }
}

/// Outcome of one engine run: one entry per candidate, in the order each
/// reached its terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineResult {
    pub outcomes: Vec<AttemptOutcome>,
    pub status: EngineStatus,
    pub passes: usize,
}

impl EngineResult {
    pub fn removed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.removed_count()
    }
}

/// A view not removed yet, with the error from its latest attempt.
struct Pending {
    object: RemovableObject,
    last_error: Option<String>,
}

impl Pending {
    fn into_failed(self, fallback: &str) -> AttemptOutcome {
        let detail = self.last_error.unwrap_or_else(|| fallback.to_string());
        AttemptOutcome::failed(self.object, detail)
    }
}

enum Attempt {
    Removed,
    Refused(StoreError),
    /// No transaction could be opened; the session is unusable
    ScopeUnavailable(StoreError),
}

/// Runs the fixpoint over one exclusively borrowed session.
pub struct Sweeper<'a, S: Session + ?Sized> {
    session: &'a mut S,
    dialect: &'a dyn Dialect,
    cancel: CancelToken,
}

impl<'a, S: Session + ?Sized> Sweeper<'a, S> {
    pub fn new(session: &'a mut S, dialect: &'a dyn Dialect) -> Self {
        Self {
            session,
            dialect,
            cancel: CancelToken::new(),
        }
    }

    /// Observe `cancel` at the start of every pass.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Drop every candidate, retrying refused ones until done or stalled.
    pub fn remove_all(&mut self, candidates: Vec<RemovableObject>) -> EngineResult {
        let transactional = self.dialect.supports_commit_and_rollback();
        let mut outcomes = Vec::with_capacity(candidates.len());
        let mut pending: Vec<Pending> = candidates
            .into_iter()
            .map(|object| Pending {
                object,
                last_error: None,
            })
            .collect();
        let mut passes = 0;

        while !pending.is_empty() {
            if self.cancel.is_cancelled() {
                info!("Sweep cancelled with {} view(s) still pending", pending.len());
                outcomes.extend(
                    pending
                        .into_iter()
                        .map(|p| AttemptOutcome::failed(p.object, CANCELLED_DETAIL)),
                );
                return EngineResult {
                    outcomes,
                    status: EngineStatus::Cancelled,
                    passes,
                };
            }

            passes += 1;
            debug!("Starting pass {} over {} view(s)", passes, pending.len());

            let mut retry = Vec::new();
            let mut removed_this_pass = 0;
            let mut last_error: Option<String> = None;
            let mut queue = pending.into_iter();

            while let Some(mut item) = queue.next() {
                match self.attempt(&item.object, transactional) {
                    Attempt::Removed => {
                        outcomes.push(AttemptOutcome::removed(item.object));
                        removed_this_pass += 1;
                    }
                    Attempt::Refused(e) => {
                        warn!("Failed to drop view {}: {}", item.object, e);
                        let detail = e.detail().to_string();
                        last_error = Some(detail.clone());
                        item.last_error = Some(detail);
                        retry.push(item);
                    }
                    Attempt::ScopeUnavailable(e) => {
                        error!("Cannot open a transaction to drop {}: {}", item.object, e);
                        let detail = e.detail().to_string();
                        outcomes.push(AttemptOutcome::failed(item.object, detail.clone()));
                        outcomes.extend(retry.into_iter().chain(queue).map(|p| p.into_failed(&detail)));
                        return EngineResult {
                            outcomes,
                            status: EngineStatus::Fatal { last_error: detail },
                            passes,
                        };
                    }
                }
            }

            debug!(
                "Pass {} removed {} view(s), {} left",
                passes,
                removed_this_pass,
                retry.len()
            );

            if removed_this_pass == 0 {
                let last_error = last_error.unwrap_or_default();
                error!(
                    "Unable to drop all views: {} view(s) could not be removed, last error: {}",
                    retry.len(),
                    last_error
                );
                outcomes.extend(retry.into_iter().map(|p| p.into_failed(&last_error)));
                return EngineResult {
                    outcomes,
                    status: EngineStatus::Stalled { last_error },
                    passes,
                };
            }

            pending = retry;
        }

        info!("Dropped all views in {} pass(es)", passes);
        EngineResult {
            outcomes,
            status: EngineStatus::AllRemoved,
            passes,
        }
    }

    fn attempt(&mut self, object: &RemovableObject, transactional: bool) -> Attempt {
        let sql = self.dialect.drop_view_instruction(object);
        info!("Executing statement to drop a view: {}", sql);

        let mut scope = match TransactionScope::begin(&mut *self.session, transactional) {
            Ok(scope) => scope,
            Err(e) => return Attempt::ScopeUnavailable(e),
        };

        if let Err(e) = scope.execute(&sql) {
            if let Err(rollback_err) = scope.rollback() {
                warn!("Rollback after failed drop of {} also failed: {}", object, rollback_err);
            }
            return Attempt::Refused(e);
        }

        match scope.commit() {
            Ok(()) => Attempt::Removed,
            Err(e) => Attempt::Refused(e),
        }
    }
}
