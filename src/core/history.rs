//! Transition history tracking.
//!
//! Each machine level keeps an immutable log of its completed transitions.
//! Recording returns a new history rather than mutating in place, so a
//! snapshot taken before a dispatch stays valid afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of a single completed transition.
///
/// Tags are stored as owned strings so records stay serialisable without
/// borrowing from the table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// The state exited.
    pub from: String,
    /// The state entered.
    pub to: String,
    /// Name of the triggering event type, or `None` for an anonymous
    /// transition.
    pub trigger: Option<String>,
    /// When the transition completed.
    pub timestamp: DateTime<Utc>,
}

/// Ordered history of completed transitions at one machine level.
///
/// # Example
///
/// ```rust
/// use tabula::TransitionHistory;
///
/// let history = TransitionHistory::new();
/// assert!(history.transitions().is_empty());
/// assert!(history.duration().is_none());
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TransitionHistory {
    transitions: Vec<TransitionRecord>,
}

impl TransitionHistory {
    /// Create a new empty history.
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
        }
    }

    /// Record a transition, returning a new history.
    ///
    /// The existing history is left untouched.
    pub fn record(&self, record: TransitionRecord) -> Self {
        let mut transitions = self.transitions.clone();
        transitions.push(record);
        Self { transitions }
    }

    /// The path of states traversed: the first `from`, then every `to`.
    pub fn path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        if let Some(first) = self.transitions.first() {
            path.push(first.from.as_str());
        }
        for record in &self.transitions {
            path.push(record.to.as_str());
        }
        path
    }

    /// Elapsed time between the first and last recorded transition.
    ///
    /// `None` while the history is empty.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.transitions.first(), self.transitions.last()) {
            let duration = last.timestamp.signed_duration_since(first.timestamp);
            duration.to_std().ok()
        } else {
            None
        }
    }

    /// All recorded transitions in order.
    pub fn transitions(&self) -> &[TransitionRecord] {
        &self.transitions
    }
}
