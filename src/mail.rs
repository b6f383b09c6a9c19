use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use thiserror::Error;
use tracing::info;

use crate::config::SmtpConfig;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("could not assemble message: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("SMTP delivery failed: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// A validated contact-form submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub body: String,
}

/// Sends contact-form messages over an implicit-TLS SMTP relay.
#[derive(Clone)]
pub struct Mailer {
    transport: SmtpTransport,
    target: Mailbox,
    project_name: String,
}

impl std::fmt::Debug for Mailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailer")
            .field("target", &self.target)
            .field("project_name", &self.project_name)
            .finish_non_exhaustive()
    }
}

impl Mailer {
    pub fn new(config: SmtpConfig, project_name: String) -> Result<Self, MailError> {
        let target = config.target.parse::<Mailbox>()?;

        let mut builder = SmtpTransport::relay(&config.host)?.port(config.port);
        if let (Some(username), Some(password)) = (config.username, config.password) {
            builder = builder.credentials(Credentials::new(username, password));
        }

        Ok(Self {
            transport: builder.build(),
            target,
            project_name,
        })
    }

    /// Blocking send; callers on the async runtime go through
    /// `spawn_blocking`.
    pub fn send_contact_message(&self, contact: &ContactMessage) -> Result<(), MailError> {
        let message = self.build_message(contact)?;
        self.transport.send(&message)?;
        info!(from = %contact.email, "contact form message delivered");
        Ok(())
    }

    fn build_message(&self, contact: &ContactMessage) -> Result<Message, MailError> {
        let message = Message::builder()
            .from(contact.email.parse::<Mailbox>()?)
            .to(self.target.clone())
            .subject(contact_subject(&contact.name, &self.project_name))
            .body(contact.body.clone())?;
        Ok(message)
    }
}

pub fn contact_subject(name: &str, project_name: &str) -> String {
    format!("{name} - {project_name} Contact Form")
}
