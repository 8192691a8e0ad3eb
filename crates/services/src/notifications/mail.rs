use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::config::{MailConfig, MailRelayConfig};
use crate::error::MailError;

/// A rendered email ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Outbound mail sink.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// # Errors
    ///
    /// Returns `MailError` when the message could not be handed off.
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError>;
}

/// Writes messages to the log instead of delivering them.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleMailer;

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        if mail.to.trim().is_empty() {
            return Err(MailError::NoRecipient);
        }
        tracing::info!(to = %mail.to, subject = %mail.subject, "email (console backend)");
        tracing::debug!(body = %mail.text);
        Ok(())
    }
}

/// Posts messages as JSON to an HTTP mail relay.
#[derive(Clone)]
pub struct HttpMailer {
    client: Client,
    config: MailRelayConfig,
}

impl HttpMailer {
    #[must_use]
    pub fn new(config: MailRelayConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        if mail.to.trim().is_empty() {
            return Err(MailError::NoRecipient);
        }

        let response = self
            .client
            .post(&self.config.url)
            .bearer_auth(&self.config.api_key)
            .json(mail)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MailError::HttpStatus(response.status()));
        }
        Ok(())
    }
}

impl MailConfig {
    /// The relay backend when configured, the console backend otherwise.
    #[must_use]
    pub fn mailer(&self) -> std::sync::Arc<dyn Mailer> {
        match &self.relay {
            Some(relay) => std::sync::Arc::new(HttpMailer::new(relay.clone())),
            None => std::sync::Arc::new(ConsoleMailer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mail(to: &str) -> OutgoingMail {
        OutgoingMail {
            from: "no-reply@enhancedlms.com".into(),
            to: to.into(),
            subject: "Hello".into(),
            html: "<p>Hi</p>".into(),
            text: "Hi".into(),
        }
    }

    #[tokio::test]
    async fn console_mailer_requires_recipient() {
        assert!(ConsoleMailer.send(&mail("ada@example.com")).await.is_ok());
        assert!(matches!(
            ConsoleMailer.send(&mail(" ")).await,
            Err(MailError::NoRecipient)
        ));
    }
}
