//! Recording notifier for testing.

use std::sync::{Mutex, PoisonError};

use crate::Notifier;
use crate::error::NotifyError;
use crate::message::Notification;

/// [`Notifier`] that keeps every message instead of sending it.
///
/// A failing recorder still records the attempt, then reports a delivery
/// failure.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    fail: bool,
}

impl RecordingNotifier {
    /// Recorder whose sends succeed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorder whose sends fail after recording.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Messages passed to `send`, in order.
    #[must_use]
    pub fn sent(&self) -> Vec<Notification> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification.clone());
        if self.fail {
            return Err(NotifyError::Delivery("relay unreachable".into()));
        }
        Ok(())
    }
}
