//! Transactional email delivery.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::info;

use crate::application::ports::{IntegrationError, Mailer, OutgoingEmail};
use crate::config::EmailSettings;

use super::client::send_unit;

const SERVICE: &str = "email";

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
}

/// Posts messages to a JSON email API with a bearer key.
#[derive(Clone)]
pub struct HttpMailer {
    http: Client,
    settings: EmailSettings,
}

impl HttpMailer {
    pub fn new(http: Client, settings: EmailSettings) -> Self {
        Self { http, settings }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), IntegrationError> {
        let body = SendRequest {
            from: &self.settings.from,
            to: [&email.to],
            subject: &email.subject,
            text: &email.body,
        };
        let request = self
            .http
            .post(self.settings.api_url.clone())
            .bearer_auth(&self.settings.api_key)
            .json(&body);
        send_unit(SERVICE, request).await
    }
}

/// Used when no email provider is configured; messages only reach the log.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), IntegrationError> {
        info!(
            target = "creatorhub::email",
            to = %email.to,
            subject = %email.subject,
            body = %email.body,
            "Email provider not configured; logging message"
        );
        Ok(())
    }
}
