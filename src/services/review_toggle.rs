//! Review toggle controller.
//!
//! Turns "mark this review done / not done" into a store update while
//! keeping at most one update in flight per assignment:
//!
//! 1. Take the in-flight guard for the assignment, or fail with
//!    `AlreadyInProgress` if another toggle holds it
//! 2. Read the authoritative status from the store
//! 3. Write the flipped status with `ReviewStore::set_status`
//! 4. Release the guard and hand the result (or the store's error) back
//!
//! Every `ToggleStarted` event is followed by exactly one closing event:
//! `ToggleSucceeded`, `ToggleFailed` or `ToggleCancelled`.
//!
//! The guard is released by `Drop`, so it is cleared on success, on error,
//! when the future is dropped mid-flight and while unwinding from a panic.
//! Nothing is retried and no local state is changed before the store
//! confirms.

use crate::error::AppError;
use crate::models::{ReviewAssignment, ReviewStatus};
use crate::services::review_events::{ReviewEvent, ReviewEventKind};
use crate::store::ReviewStore;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;

/// Default number of buffered toggle events per subscriber.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Controller view of one assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleState {
    Idle,
    Toggling,
}

type Registry = Arc<Mutex<HashSet<String>>>;

fn lock(registry: &Registry) -> MutexGuard<'_, HashSet<String>> {
    // The set is only touched by insert/remove, so a poisoned lock still
    // holds a consistent value.
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Marks an assignment as toggling until dropped.
///
/// Dropping the guard also announces how the attempt ended. A guard dropped
/// without an outcome (command dropped or future cancelled) reports
/// `ToggleCancelled`.
struct InFlightGuard {
    registry: Registry,
    assignment_id: String,
    events: broadcast::Sender<ReviewEvent>,
    outcome: Option<ReviewEventKind>,
}

impl InFlightGuard {
    fn acquire(
        registry: &Registry,
        events: &broadcast::Sender<ReviewEvent>,
        assignment_id: &str,
    ) -> Option<Self> {
        if !lock(registry).insert(assignment_id.to_string()) {
            return None;
        }
        Some(Self {
            registry: Arc::clone(registry),
            assignment_id: assignment_id.to_string(),
            events: events.clone(),
            outcome: None,
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        // Clear the entry before announcing the outcome so subscribers see
        // the assignment as idle.
        lock(&self.registry).remove(&self.assignment_id);

        let kind = self.outcome.take().unwrap_or_else(|| {
            log::debug!("[toggle] {} cancelled before completing", self.assignment_id);
            ReviewEventKind::ToggleCancelled
        });
        let _ = self
            .events
            .send(ReviewEvent::new(self.assignment_id.clone(), kind));
    }
}

/// Single-flight toggle controller over a review store.
///
/// Cloning is cheap and clones share the same in-flight registry and event
/// channel.
pub struct ReviewToggle<S: ?Sized + ReviewStore> {
    store: Arc<S>,
    in_flight: Registry,
    events: broadcast::Sender<ReviewEvent>,
}

impl<S: ?Sized + ReviewStore> Clone for ReviewToggle<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            in_flight: Arc::clone(&self.in_flight),
            events: self.events.clone(),
        }
    }
}

impl<S: ?Sized + ReviewStore> ReviewToggle<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_event_capacity(store, DEFAULT_EVENT_CAPACITY)
    }

    pub fn with_event_capacity(store: Arc<S>, capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            store,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            events,
        }
    }

    /// The store this controller writes to.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Flip the status of an assignment: `pending` becomes `completed` and
    /// `completed` becomes `pending`.
    ///
    /// Fails immediately with `AlreadyInProgress` when a toggle for the same
    /// assignment has not resolved yet. Store errors are returned unchanged.
    pub async fn toggle(&self, assignment_id: &str) -> Result<ReviewAssignment, AppError> {
        self.begin(assignment_id)?.run().await
    }

    /// Like [`toggle`](Self::toggle), with the status the caller believes the
    /// assignment has. The snapshot is advisory: the target is always
    /// computed from the store's current status.
    pub async fn toggle_with_snapshot(
        &self,
        assignment_id: &str,
        snapshot: ReviewStatus,
    ) -> Result<ReviewAssignment, AppError> {
        self.begin(assignment_id)?
            .with_snapshot(snapshot)
            .run()
            .await
    }

    /// Take the in-flight guard now and return the pending toggle.
    ///
    /// The guard is held from this call until the returned command has run
    /// or been dropped, which lets callers reject a second toggle without
    /// awaiting anything.
    pub fn begin(&self, assignment_id: &str) -> Result<ToggleCommand<S>, AppError> {
        let Some(guard) = InFlightGuard::acquire(&self.in_flight, &self.events, assignment_id)
        else {
            log::debug!("[toggle] {} already in flight, rejecting", assignment_id);
            self.emit(assignment_id, ReviewEventKind::ToggleRejected);
            return Err(AppError::already_in_progress(assignment_id));
        };

        self.emit(assignment_id, ReviewEventKind::ToggleStarted);
        Ok(ToggleCommand {
            store: Arc::clone(&self.store),
            guard,
            snapshot: None,
        })
    }

    /// Whether a toggle for the assignment is currently running.
    pub fn is_in_flight(&self, assignment_id: &str) -> bool {
        lock(&self.in_flight).contains(assignment_id)
    }

    pub fn state(&self, assignment_id: &str) -> ToggleState {
        if self.is_in_flight(assignment_id) {
            ToggleState::Toggling
        } else {
            ToggleState::Idle
        }
    }

    /// Number of assignments with a toggle in flight.
    pub fn in_flight_count(&self) -> usize {
        lock(&self.in_flight).len()
    }

    /// Subscribe to toggle events of every assignment.
    pub fn subscribe(&self) -> broadcast::Receiver<ReviewEvent> {
        self.events.subscribe()
    }

    fn emit(&self, assignment_id: &str, kind: ReviewEventKind) {
        // No subscribers is fine.
        let _ = self.events.send(ReviewEvent::new(assignment_id, kind));
    }
}

/// A toggle that holds the in-flight guard and has not run yet.
///
/// Dropping it without calling [`run`](Self::run) releases the guard.
#[must_use = "the assignment stays toggling until the command is run or dropped"]
pub struct ToggleCommand<S: ?Sized + ReviewStore> {
    store: Arc<S>,
    guard: InFlightGuard,
    snapshot: Option<ReviewStatus>,
}

impl<S: ?Sized + ReviewStore> ToggleCommand<S> {
    /// Attach the caller's view of the current status (advisory only).
    pub fn with_snapshot(mut self, snapshot: ReviewStatus) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    pub fn assignment_id(&self) -> &str {
        &self.guard.assignment_id
    }

    /// Read, flip and write the status, then release the guard.
    pub async fn run(self) -> Result<ReviewAssignment, AppError> {
        let result = self.flip().await;

        let mut guard = self.guard;
        let kind = match &result {
            Ok(assignment) => {
                log::info!("[toggle] {} -> {}", guard.assignment_id, assignment.status);
                ReviewEventKind::ToggleSucceeded {
                    status: assignment.status,
                }
            }
            Err(e) => {
                log::warn!("[toggle] {} failed: {}", guard.assignment_id, e);
                ReviewEventKind::ToggleFailed {
                    error: e.to_string(),
                }
            }
        };
        guard.outcome = Some(kind);
        drop(guard);

        result
    }

    async fn flip(&self) -> Result<ReviewAssignment, AppError> {
        let assignment_id = self.assignment_id();
        let current = self.store.get(assignment_id).await?;

        if let Some(snapshot) = self.snapshot {
            if snapshot != current.status {
                log::debug!(
                    "[toggle] {} snapshot {} is stale, store has {}",
                    assignment_id,
                    snapshot,
                    current.status
                );
            }
        }

        self.store
            .set_status(assignment_id, current.status.toggled())
            .await
    }
}
