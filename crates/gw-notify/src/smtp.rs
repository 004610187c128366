//! SMTP delivery through an authenticated relay.

use gw_config::{MailConfig, MailSecurity};
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::info;

use crate::Notifier;
use crate::error::NotifyError;
use crate::message::Notification;

/// [`Notifier`] sending plain-text mail to one recipient.
pub struct SmtpNotifier {
    transport: SmtpTransport,
    sender: Mailbox,
    recipient: Mailbox,
}

impl SmtpNotifier {
    /// Build the relay transport and validate both addresses.
    ///
    /// No connection is made until the first [`Notifier::send`].
    pub fn new(mail: &MailConfig) -> Result<Self, NotifyError> {
        let sender = mailbox("sender", &mail.sender)?;
        let recipient = mailbox("recipient", &mail.recipient)?;

        let builder = match mail.security {
            MailSecurity::Tls => SmtpTransport::relay(&mail.smtp_host),
            MailSecurity::Starttls => SmtpTransport::starttls_relay(&mail.smtp_host),
        }
        .map_err(|source| NotifyError::Relay {
            host: mail.smtp_host.clone(),
            source,
        })?;

        let transport = builder
            .port(mail.smtp_port)
            .credentials(Credentials::new(
                mail.username.clone(),
                mail.password.expose().to_owned(),
            ))
            .timeout(Some(mail.timeout()))
            .build();

        Ok(Self {
            transport,
            sender,
            recipient,
        })
    }
}

impl Notifier for SmtpNotifier {
    fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let message = Message::builder()
            .from(self.sender.clone())
            .to(self.recipient.clone())
            .subject(&notification.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(notification.body.clone())?;

        info!(
            "Sending email to {} with subject '{}'",
            self.recipient, notification.subject
        );
        self.transport
            .send(&message)
            .map_err(|e| NotifyError::Delivery(Box::new(e)))?;
        Ok(())
    }
}

fn mailbox(role: &'static str, address: &str) -> Result<Mailbox, NotifyError> {
    address.parse().map_err(|source| NotifyError::Address {
        role,
        address: address.to_owned(),
        source,
    })
}
