//! Transient notifications shown after each action.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
    pub shown_at: Instant,
}

impl Toast {
    pub fn success() -> Self {
        Self {
            level: ToastLevel::Success,
            message: "Success".to_string(),
            shown_at: Instant::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Error,
            message: message.into(),
            shown_at: Instant::now(),
        }
    }
}

/// Toast stack, newest first. Each toast closes itself after `lifetime`.
#[derive(Debug, Clone)]
pub struct Toasts {
    items: VecDeque<Toast>,
    lifetime: Duration,
}

impl Toasts {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            items: VecDeque::new(),
            lifetime,
        }
    }

    pub fn push(&mut self, toast: Toast) {
        self.items.push_front(toast);
    }

    /// Drop every toast older than the configured lifetime.
    pub fn prune(&mut self, now: Instant) {
        let lifetime = self.lifetime;
        self.items
            .retain(|t| now.saturating_duration_since(t.shown_at) < lifetime);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.items.iter()
    }

    pub fn latest(&self) -> Option<&Toast> {
        self.items.front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Remove and return all toasts, oldest first.
    pub fn drain(&mut self) -> Vec<Toast> {
        self.items.drain(..).rev().collect()
    }
}

impl Default for Toasts {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000))
    }
}
