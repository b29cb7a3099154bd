//! Email sending for access notifications.
//!
//! Sends multipart (plain text + HTML) messages via SMTP.

use std::time::Duration;

use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// SMTP transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    /// SMTP server hostname.
    pub host: String,
    /// SMTP server port.
    pub port: u16,
    /// SMTP username (optional for local testing).
    pub user: Option<String>,
    /// SMTP password (optional for local testing).
    #[serde(skip_serializing)]
    pub pass: Option<String>,
    /// Use TLS. Disable only for local test servers.
    pub tls: bool,
    /// Connection and command timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 587,
            user: None,
            pass: None,
            tls: true,
            timeout_secs: 30,
        }
    }
}

/// Sender identity used as the `From` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderIdentity {
    pub email: String,
    pub name: String,
}

impl Default for SenderIdentity {
    fn default() -> Self {
        Self {
            email: "noreply@example.org".to_string(),
            name: "Digital Collections".to_string(),
        }
    }
}

/// Recipient address and display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub address: Address,
    pub name: String,
}

impl Recipient {
    pub fn new(address: Address, name: impl Into<String>) -> Self {
        Self {
            address,
            name: name.into(),
        }
    }

    fn mailbox(&self) -> Mailbox {
        let name = self.name.trim();
        let name = (!name.is_empty()).then(|| name.to_string());
        Mailbox::new(name, self.address.clone())
    }
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum MailError {
    /// The address does not look like an email address.
    #[error("Invalid email address '{0}'")]
    InvalidAddress(String),
    /// Error building the email message.
    #[error("Failed to build email: {0}")]
    Message(String),
    /// Error sending the email.
    #[error("Failed to send email: {0}")]
    Transport(String),
    /// The send did not complete in time.
    #[error("Timed out sending email after {0:?}")]
    Timeout(Duration),
}

/// Parses and validates an email address.
pub fn validate_address(address: &str) -> Result<Address, MailError> {
    address
        .trim()
        .parse::<Address>()
        .map_err(|_| MailError::InvalidAddress(address.to_string()))
}

/// Delivers rendered notifications.
#[allow(async_fn_in_trait)]
pub trait MailSender {
    async fn send(
        &self,
        to: &Recipient,
        subject: &str,
        text: &str,
        html: &str,
    ) -> Result<(), MailError>;
}

/// SMTP mail sender.
#[derive(Clone)]
pub struct SmtpMailer {
    config: SmtpConfig,
    from: SenderIdentity,
}

impl SmtpMailer {
    /// Creates a new SMTP sender with the given configuration.
    pub fn new(config: SmtpConfig, from: SenderIdentity) -> Self {
        Self { config, from }
    }

    fn build_message(
        &self,
        to: &Recipient,
        subject: &str,
        text: &str,
        html: &str,
    ) -> Result<Message, MailError> {
        let from_address = validate_address(&self.from.email)
            .map_err(|e| MailError::Message(format!("sender: {}", e)))?;
        let from = Mailbox::new(Some(self.from.name.clone()), from_address);

        Message::builder()
            .from(from)
            .to(to.mailbox())
            .subject(subject)
            .multipart(MultiPart::alternative_plain_html(
                text.to_string(),
                html.to_string(),
            ))
            .map_err(|e| MailError::Message(e.to_string()))
    }

    /// Builds the SMTP transport.
    fn build_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, MailError> {
        let mut builder = if !self.config.tls {
            // Plain connection for local test servers
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.config.host)
                .port(self.config.port)
        } else if self.config.port == 465 {
            // SSL/TLS on port 465
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.host)
                .map_err(|e| MailError::Transport(e.to_string()))?
                .port(465)
        } else {
            // STARTTLS on port 587
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)
                .map_err(|e| MailError::Transport(e.to_string()))?
                .port(self.config.port)
        };

        builder = builder.timeout(Some(Duration::from_secs(self.config.timeout_secs)));

        if let (Some(user), Some(pass)) = (&self.config.user, &self.config.pass) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(builder.build())
    }
}

impl MailSender for SmtpMailer {
    async fn send(
        &self,
        to: &Recipient,
        subject: &str,
        text: &str,
        html: &str,
    ) -> Result<(), MailError> {
        let email = self.build_message(to, subject, text, html)?;
        let transport = self.build_transport()?;

        transport
            .send(email)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        tracing::debug!("Sent notification to {}", to.address);
        Ok(())
    }
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("from_email", &self.from.email)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SmtpConfig {
        SmtpConfig {
            host: "localhost".to_string(),
            port: 1025,
            user: None,
            pass: None,
            tls: false,
            timeout_secs: 5,
        }
    }

    fn recipient() -> Recipient {
        Recipient::new(validate_address("reader@example.org").unwrap(), "Ada Reader")
    }

    #[test]
    fn test_validate_address() {
        assert!(validate_address("reader@example.org").is_ok());
        assert!(validate_address(" reader@example.org ").is_ok());
        assert!(validate_address("").is_err());
        assert!(validate_address("not-an-address").is_err());
        assert!(validate_address("two@@example.org").is_err());
    }

    #[test]
    fn test_invalid_address_error_names_address() {
        let err = validate_address("nope").unwrap_err();
        assert!(matches!(err, MailError::InvalidAddress(_)));
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_build_message_multipart() {
        let mailer = SmtpMailer::new(test_config(), SenderIdentity::default());
        let message = mailer
            .build_message(&recipient(), "Access granted", "plain body", "<p>html body</p>")
            .unwrap();

        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: Access granted"));
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("plain body"));
        assert!(raw.contains("html body"));
        assert!(raw.contains("reader@example.org"));
    }

    #[test]
    fn test_build_message_rejects_bad_sender() {
        let from = SenderIdentity {
            email: "broken".to_string(),
            name: "Broken".to_string(),
        };
        let mailer = SmtpMailer::new(test_config(), from);

        let result = mailer.build_message(&recipient(), "s", "t", "h");
        assert!(matches!(result, Err(MailError::Message(_))));
    }

    #[test]
    fn test_recipient_without_name() {
        let to = Recipient::new(validate_address("a@example.org").unwrap(), "  ");
        assert!(to.mailbox().name.is_none());
    }

    #[tokio::test]
    async fn test_build_transport_local() {
        let mailer = SmtpMailer::new(test_config(), SenderIdentity::default());
        assert!(mailer.build_transport().is_ok());
    }

    #[test]
    fn test_mail_error_display() {
        let err = MailError::Message("invalid header".to_string());
        assert!(err.to_string().contains("invalid header"));

        let err = MailError::Transport("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));

        let err = MailError::Timeout(Duration::from_secs(3));
        assert!(err.to_string().contains("Timed out"));
    }
}
