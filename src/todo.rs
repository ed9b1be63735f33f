//! Task item data structure.
//!
//! The server owns every `Todo`: it assigns identifiers and timestamps and flips the
//! completion flag. The client only ever holds the latest snapshot it was handed.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Longest title the input field accepts, in characters.
pub const TITLE_MAX_CHARS: usize = 200;

/// A single to-do entry as returned by the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub id: String,
    pub title: String,
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    /// Secondary line shown under the title.
    ///
    /// Completed items show when they were completed, open items when they were
    /// created. A completed item without a `completed_at` falls back to its creation
    /// time rather than rendering nothing.
    pub fn timestamp_label(&self) -> String {
        if self.completed {
            let at = self.completed_at.unwrap_or(self.created_at);
            format!("Completed at: {}", format_local(at))
        } else {
            format!("Created at: {}", format_local(self.created_at))
        }
    }
}

/// Number of items that are not yet completed.
pub fn remaining(todos: &[Todo]) -> usize {
    todos.iter().filter(|t| !t.completed).count()
}

/// Render a UTC timestamp in the user's local timezone.
pub fn format_local(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}
