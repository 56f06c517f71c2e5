// ⏱️ Debounced Writer - coalesce rapid settings changes into one write
//
// Single pending slot: scheduling a new payload cancels the previous one and
// restarts the quiet period. The owner's event loop calls poll() to fire the
// write once the deadline has passed.

use crate::db::SettingsStorage;
use std::time::{Duration, Instant};

pub const DEBOUNCE_MS: u64 = 300;

#[derive(Debug, Clone)]
struct PendingWrite {
    due: Instant,
    payload: String,
}

#[derive(Debug, Clone)]
pub struct DebouncedWriter {
    delay: Duration,
    pending: Option<PendingWrite>,
}

impl DebouncedWriter {
    pub fn new(delay: Duration) -> Self {
        DebouncedWriter {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Deadline of the pending write, if any
    pub fn due(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.due)
    }

    /// Schedule `payload` for `now + delay`. Returns true when an earlier
    /// pending write was superseded.
    pub fn schedule(&mut self, payload: String, now: Instant) -> bool {
        let superseded = self.pending.is_some();
        self.pending = Some(PendingWrite {
            due: now + self.delay,
            payload,
        });
        superseded
    }

    /// Drop the pending write without performing it.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// Write the pending payload if its deadline has passed.
    /// Returns true when a write was attempted.
    pub fn poll(&mut self, now: Instant, storage: &mut dyn SettingsStorage) -> bool {
        match self.due() {
            Some(due) if now >= due => self.flush(storage),
            _ => false,
        }
    }

    /// Write the pending payload immediately, regardless of deadline.
    pub fn flush(&mut self, storage: &mut dyn SettingsStorage) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };

        // Failed writes are logged and dropped; the next change reschedules.
        match storage.save(&pending.payload) {
            Ok(()) => tracing::debug!(bytes = pending.payload.len(), "label settings persisted"),
            Err(e) => tracing::error!(error = %e, "failed to persist label settings"),
        }
        true
    }
}

impl Default for DebouncedWriter {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEBOUNCE_MS))
    }
}

// ============================================================================
// TESTS
// ============================================================================
