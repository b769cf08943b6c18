//! A client for sending notification emails through the SendGrid v3 API.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, instrument};

/// The public SendGrid API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.sendgrid.com";

const SEND_PATH: &str = "/v3/mail/send";

/// Errors reported by a mail-sending service.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("HTTP request to the mail service failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("mail service rejected the message: status {status}, body: {message}")]
    Rejected { status: u16, message: String },

    #[error("no API key configured for the mail service")]
    MissingCredential,

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl DeliveryError {
    /// The HTTP status the service answered with, if it answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            DeliveryError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// An API key for the mail service. Its `Debug` output is redacted.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

impl From<String> for Credential {
    fn from(secret: String) -> Self {
        Self(secret)
    }
}

impl From<&str> for Credential {
    fn from(secret: &str) -> Self {
        Self(secret.to_string())
    }
}

/// A fully addressed plain-text email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub from_address: String,
    pub from_label: Option<String>,
    pub to_address: String,
    pub subject: String,
    pub body: String,
    pub content_type: String,
}

impl MailMessage {
    pub const TEXT_PLAIN: &'static str = "text/plain";
}

/// A trait for services that deliver a single email synchronously.
pub trait MailSender: Send + Sync {
    /// Sends one message, blocking until the service answers.
    fn send(&self, message: &MailMessage) -> Result<(), DeliveryError>;
}

impl<S: MailSender + ?Sized> MailSender for std::sync::Arc<S> {
    fn send(&self, message: &MailMessage) -> Result<(), DeliveryError> {
        (**self).send(message)
    }
}

#[derive(Serialize)]
struct Address<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Serialize)]
struct Personalization<'a> {
    to: Vec<Address<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    content_type: &'a str,
    value: &'a str,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    personalizations: Vec<Personalization<'a>>,
    from: Address<'a>,
    subject: &'a str,
    content: Vec<Content<'a>>,
}

impl<'a> From<&'a MailMessage> for SendRequest<'a> {
    fn from(message: &'a MailMessage) -> Self {
        Self {
            personalizations: vec![Personalization {
                to: vec![Address {
                    email: &message.to_address,
                    name: None,
                }],
            }],
            from: Address {
                email: &message.from_address,
                name: message.from_label.as_deref(),
            },
            subject: &message.subject,
            content: vec![Content {
                content_type: &message.content_type,
                value: &message.body,
            }],
        }
    }
}

/// A blocking client for the SendGrid mail-send endpoint.
pub struct SendGridClient {
    api_key: Credential,
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl SendGridClient {
    /// Creates a client for the public SendGrid API with a 10 second timeout.
    pub fn new(api_key: impl Into<Credential>) -> Result<Self, DeliveryError> {
        Self::with_endpoint(api_key, DEFAULT_API_URL, Duration::from_secs(10))
    }

    /// Creates a client for the given base URL, e.g. a regional endpoint or a
    /// local mock server.
    pub fn with_endpoint(
        api_key: impl Into<Credential>,
        api_url: &str,
        timeout: Duration,
    ) -> Result<Self, DeliveryError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(DeliveryError::ClientBuild)?;
        Ok(Self {
            api_key: api_key.into(),
            endpoint: format!("{}{}", api_url.trim_end_matches('/'), SEND_PATH),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl fmt::Debug for SendGridClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendGridClient")
            .field("api_key", &self.api_key)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl MailSender for SendGridClient {
    #[instrument(skip(self, message), fields(to = %message.to_address))]
    fn send(&self, message: &MailMessage) -> Result<(), DeliveryError> {
        if self.api_key.is_empty() {
            return Err(DeliveryError::MissingCredential);
        }

        let payload = SendRequest::from(message);
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose())
            .json(&payload)
            .send();

        match response {
            Ok(res) => {
                if res.status().is_success() {
                    debug!(status = %res.status(), "SendGrid accepted the message.");
                    Ok(())
                } else {
                    let status = res.status();
                    let text = res.text().unwrap_or_default();
                    error!(
                        status = %status,
                        body = %text,
                        "SendGrid rejected the message"
                    );
                    Err(DeliveryError::Rejected {
                        status: status.as_u16(),
                        message: text,
                    })
                }
            }
            Err(e) => {
                error!(error = %e, "HTTP request to SendGrid failed");
                Err(DeliveryError::Transport(e))
            }
        }
    }
}
