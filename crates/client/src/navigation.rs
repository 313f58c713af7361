//! Navigation and user-notification seams used by the guard runner.

use std::sync::{Mutex, MutexGuard, PoisonError};

pub trait Navigator: Send + Sync {
    /// Move to `to`. With `replace`, the current entry is overwritten so the
    /// user cannot navigate back to it.
    fn navigate(&self, to: &str, replace: bool);
}

pub trait Notifier: Send + Sync {
    fn warn(&self, message: &str);
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory history stack.
#[derive(Debug)]
pub struct HistoryNavigator {
    entries: Mutex<Vec<String>>,
}

impl HistoryNavigator {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            entries: Mutex::new(vec![initial.into()]),
        }
    }

    pub fn current(&self) -> String {
        lock(&self.entries).last().cloned().unwrap_or_else(|| "/".to_string())
    }

    pub fn entries(&self) -> Vec<String> {
        lock(&self.entries).clone()
    }

    /// Pop the current entry, like the browser back button.
    pub fn back(&self) -> Option<String> {
        let mut entries = lock(&self.entries);
        if entries.len() > 1 {
            entries.pop();
        }
        entries.last().cloned()
    }
}

impl Navigator for HistoryNavigator {
    fn navigate(&self, to: &str, replace: bool) {
        let mut entries = lock(&self.entries);
        if replace {
            entries.pop();
        }
        entries.push(to.to_string());
    }
}

/// Logs warnings through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn warn(&self, message: &str) {
        tracing::warn!(notice = message, "user notice");
    }
}

/// Collects warnings for later inspection.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        lock(&self.messages).clone()
    }
}

impl Notifier for RecordingNotifier {
    fn warn(&self, message: &str) {
        lock(&self.messages).push(message.to_string());
    }
}
