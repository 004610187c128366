use lettre::address::AddressError;

/// Notification failure.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Sender or recipient is not a valid mailbox.
    #[error("invalid {role} address '{address}': {source}")]
    Address {
        /// `sender` or `recipient`.
        role: &'static str,
        /// Offending value.
        address: String,
        /// Parse error.
        source: AddressError,
    },
    /// Relay transport could not be set up.
    #[error("failed to set up SMTP relay {host}: {source}")]
    Relay {
        /// Relay host.
        host: String,
        /// Transport error.
        source: lettre::transport::smtp::Error,
    },
    /// Message could not be assembled.
    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),
    /// The relay rejected the message or could not be reached.
    #[error("notification delivery failed: {0}")]
    Delivery(#[source] Box<dyn std::error::Error + Send + Sync>),
}
