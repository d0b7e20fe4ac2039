//! User-visible notifications.
//!
//! Mutating cart actions report success and failure through this seam as
//! transient toast-style notices. The background session revalidation path
//! deliberately bypasses it - that call runs unattended on every protected
//! view and its failures are recovered silently.

use std::sync::{Arc, Mutex};

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

/// A single toast-style notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

/// Sink for user-visible notices.
pub trait Notifier {
    fn notify(&self, notice: Notice);

    /// Report a successful mutation.
    fn success(&self, message: &str) {
        self.notify(Notice {
            severity: Severity::Success,
            message: message.to_owned(),
        });
    }

    /// Report a failed mutation.
    fn error(&self, message: &str) {
        self.notify(Notice {
            severity: Severity::Error,
            message: message.to_owned(),
        });
    }
}

/// Notifier that forwards notices to the tracing pipeline. The default for
/// headless embedders (and the CLI, which renders its own output anyway).
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.severity {
            Severity::Success => tracing::info!(message = %notice.message, "notice"),
            Severity::Error => tracing::warn!(message = %notice.message, "notice"),
        }
    }
}

/// Notifier that buffers notices in memory, for embedders that render their
/// own toasts and for tests. Cloning shares the buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryNotifier {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl MemoryNotifier {
    /// Create an empty notifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain and return all buffered notices.
    #[must_use]
    pub fn take(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.lock())
    }

    /// Snapshot of the buffered notices without draining.
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Notice>> {
        self.notices.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notice: Notice) {
        self.lock().push(notice);
    }
}
