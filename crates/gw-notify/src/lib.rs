//! Change notifications for gradewatch.
//!
//! Decides whether a cycle produces a message ([`decide`]), composes the
//! plain-text body, and delivers it through a [`Notifier`].
//!
//! # Implementations
//!
//! - [`SmtpNotifier`]: authenticated SMTP relay (implicit TLS or STARTTLS)
//! - [`RecordingNotifier`]: keeps messages in memory (behind `mock`)

mod dispatch;
mod error;
mod message;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod smtp;

pub use dispatch::{Dispatch, RunMode, decide};
pub use error::NotifyError;
pub use message::{
    CHANGES_SUBJECT, LOGIN_SUBJECT, Notification, SNAPSHOT_SUBJECT, changes_notification,
    login_notification, snapshot_notification,
};
#[cfg(any(test, feature = "mock"))]
pub use mock::RecordingNotifier;
pub use smtp::SmtpNotifier;

/// Delivery channel for [`Notification`]s.
pub trait Notifier {
    /// Deliver one message.
    fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}
