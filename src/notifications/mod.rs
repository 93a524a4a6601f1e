//! Transactional email delivery

pub mod templates;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// File attached to an outgoing email
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub filename: String,
    pub content: Vec<u8>,
}

/// A single outgoing email
#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
    pub reply_to: Option<String>,
    pub attachments: Vec<Attachment>,
}

impl EmailMessage {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        html: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            html: html.into(),
            reply_to: None,
            attachments: Vec::new(),
        }
    }

    pub fn reply_to(mut self, address: impl Into<String>) -> Self {
        self.reply_to = Some(address.into());
        self
    }

    pub fn attach(mut self, filename: impl Into<String>, content: Vec<u8>) -> Self {
        self.attachments.push(Attachment {
            filename: filename.into(),
            content,
        });
        self
    }
}

/// Provider acknowledgement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailReceipt {
    pub id: String,
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Email provider is not configured")]
    NotConfigured,
    #[error("{0}")]
    Provider(String),
    #[error("Email transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<EmailReceipt, NotificationError>;
}

#[derive(Serialize)]
struct ResendAttachment<'a> {
    filename: &'a str,
    content: String,
}

#[derive(Serialize)]
struct ResendPayload<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<ResendAttachment<'a>>,
}

#[derive(Deserialize)]
struct ResendFailure {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

/// Resend HTTP API client
#[derive(Clone)]
pub struct ResendEmailSender {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl ResendEmailSender {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }
}

#[async_trait]
impl EmailSender for ResendEmailSender {
    #[instrument(skip(self, message), fields(to = %message.to, subject = %message.subject))]
    async fn send(&self, message: EmailMessage) -> Result<EmailReceipt, NotificationError> {
        let api_key = self.api_key.as_deref().ok_or(NotificationError::NotConfigured)?;

        let payload = ResendPayload {
            from: &message.from,
            to: [&message.to],
            subject: &message.subject,
            html: &message.html,
            reply_to: message.reply_to.as_deref(),
            attachments: message
                .attachments
                .iter()
                .map(|a| ResendAttachment {
                    filename: &a.filename,
                    content: STANDARD.encode(&a.content),
                })
                .collect(),
        };

        let started = Instant::now();
        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                counter!("iron_catalog_emails.failed", 1);
                NotificationError::Transport(e)
            })?;

        let status = response.status();
        debug!(status = %status, elapsed_ms = started.elapsed().as_millis() as u64, "Email provider responded");

        if !status.is_success() {
            counter!("iron_catalog_emails.failed", 1);
            let body = response.text().await.unwrap_or_default();
            let reason = serde_json::from_str::<ResendFailure>(&body)
                .ok()
                .and_then(|f| f.message.or(f.name))
                .unwrap_or_else(|| format!("Email provider returned {}", status));
            warn!(status = %status, "Email provider rejected message: {}", reason);
            return Err(NotificationError::Provider(reason));
        }

        counter!("iron_catalog_emails.sent", 1);
        Ok(response.json::<EmailReceipt>().await?)
    }
}
