//! Progress events of a bulk job and their wire encoding.
//!
//! On the wire a progress update is `{"progress_percentage": 40.0}` and the
//! terminal sentinel is `{"message": "Task completed"}`.

use serde_json::{json, Value};

/// Message text of the terminal sentinel.
pub const COMPLETED_MESSAGE: &str = "Task completed";

/// A progress notification emitted while a bulk job runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressEvent {
    /// A batch settled; `percentage` is in `[0, 100]`.
    Progress { percentage: f64 },
    /// Every batch settled. Emitted exactly once, last.
    Completed,
}

impl ProgressEvent {
    /// Create a progress event, clamping the percentage into `[0, 100]`.
    pub fn progress(percentage: f64) -> Self {
        let percentage = if percentage.is_nan() {
            0.0
        } else {
            percentage.clamp(0.0, 100.0)
        };
        Self::Progress { percentage }
    }

    /// Returns true for the terminal sentinel.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Percentage carried by this event. The sentinel counts as 100.
    pub fn percentage(&self) -> f64 {
        match self {
            Self::Progress { percentage } => *percentage,
            Self::Completed => 100.0,
        }
    }

    /// Encode as a JSON text frame.
    pub fn to_wire(&self) -> String {
        match self {
            Self::Progress { percentage } => json!({ "progress_percentage": percentage }),
            Self::Completed => json!({ "message": COMPLETED_MESSAGE }),
        }
        .to_string()
    }

    /// Decode a JSON text frame.
    ///
    /// Returns `None` for anything that is not a recognized progress
    /// message; listeners ignore those.
    pub fn from_wire(text: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(text).ok()?;
        let object = value.as_object()?;

        if let Some(percentage) = object.get("progress_percentage") {
            return percentage.as_f64().map(Self::progress);
        }

        match object.get("message").and_then(Value::as_str) {
            Some(COMPLETED_MESSAGE) => Some(Self::Completed),
            _ => None,
        }
    }
}
