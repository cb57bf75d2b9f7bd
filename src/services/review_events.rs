//! Review toggle events.
//!
//! Broadcast by the toggle controller so callers can follow the in-flight
//! state of an assignment (e.g. to disable a checkbox while it is toggling).

use crate::models::ReviewStatus;
use serde::Serialize;

/// Payload for review toggle events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewEvent {
    /// The assignment the event is about.
    pub assignment_id: String,

    #[serde(flatten)]
    pub kind: ReviewEventKind,
}

/// What happened to the toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReviewEventKind {
    /// Guard taken, store update about to run.
    ToggleStarted,

    /// Store committed the new status.
    ToggleSucceeded { status: ReviewStatus },

    /// Store rejected or failed the update; status unchanged.
    ToggleFailed { error: String },

    /// The toggle was dropped before the store answered; the write may or
    /// may not have been applied.
    ToggleCancelled,

    /// Another toggle was already running for the assignment.
    ToggleRejected,
}

impl ReviewEvent {
    pub fn new(assignment_id: impl Into<String>, kind: ReviewEventKind) -> Self {
        Self {
            assignment_id: assignment_id.into(),
            kind,
        }
    }

    /// Whether the assignment is idle again after this event.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind,
            ReviewEventKind::ToggleSucceeded { .. }
                | ReviewEventKind::ToggleFailed { .. }
                | ReviewEventKind::ToggleCancelled
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = ReviewEvent::new(
            "A1",
            ReviewEventKind::ToggleSucceeded {
                status: ReviewStatus::Completed,
            },
        );
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"assignmentId\":\"A1\""));
        assert!(json.contains("\"event\":\"toggle_succeeded\""));
        assert!(json.contains("\"status\":\"completed\""));
    }

    #[test]
    fn test_terminal_events() {
        assert!(!ReviewEvent::new("A1", ReviewEventKind::ToggleStarted).is_terminal());
        assert!(!ReviewEvent::new("A1", ReviewEventKind::ToggleRejected).is_terminal());
        assert!(ReviewEvent::new("A1", ReviewEventKind::ToggleCancelled).is_terminal());
        assert!(ReviewEvent::new(
            "A1",
            ReviewEventKind::ToggleFailed {
                error: "boom".to_string()
            }
        )
        .is_terminal());
    }
}
