//! Mail transport abstraction layer
//!
//! This module defines the `MailTransport` trait which abstracts how a contact message reaches
//! the site owner: an SMTP session, the Mailjet send API, an intermediary worker, or a directory
//! of `.eml` files during development. Exactly one transport is built at startup from
//! configuration.

use async_trait::async_trait;
use std::{sync::Arc, time::Duration};

use crate::config::{MailConfig, TransportConfig};
use crate::errors::Error;
use crate::message::OutboundMessage;

pub mod file;
pub mod mailjet;
pub mod smtp;
pub mod worker;

/// Provider bodies are cut to this many bytes before they are logged.
const MAX_LOGGED_DETAIL: usize = 2048;

/// Errors that can occur while handing a message to the provider.
///
/// The payloads are diagnostic detail for the server log and are never sent to the caller.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("no answer within {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("provider rejected the message (status {status:?}): {detail}")]
    Rejected { status: Option<u16>, detail: String },

    #[error("provider gave no delivery status (HTTP {status}): {detail}")]
    UnexpectedResponse { status: u16, detail: String },

    #[error("could not build message: {0}")]
    InvalidMessage(String),

    #[error("i/o error: {0}")]
    Io(String),
}

/// Affirmative answer from a transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Status reported by the provider (HTTP status or SMTP reply code)
    pub provider_status: Option<u16>,
    /// Provider-side identifier of the accepted message, if any
    pub reference: Option<String>,
}

/// Abstract mail transport interface
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Short transport name for logs and metrics
    fn kind(&self) -> &'static str;

    /// Hand the message to the provider.
    ///
    /// Returns `Ok` only when the provider affirmatively accepted the message.
    async fn send(&self, message: &OutboundMessage) -> Result<Delivery, TransportError>;
}

/// Create the configured transport.
///
/// Returns `Ok(None)` when recipient or credentials are missing; the missing key names are logged
/// and every submission is answered with a "not configured" failure.
pub fn create_transport(config: &MailConfig) -> Result<Option<Arc<dyn MailTransport>>, Error> {
    let missing = config.missing_keys();
    if !missing.is_empty() {
        tracing::error!(
            transport = config.transport.kind(),
            missing = ?missing,
            "Mail transport is not configured, submissions will be refused"
        );
        return Ok(None);
    }

    let transport: Arc<dyn MailTransport> = match &config.transport {
        TransportConfig::Smtp {
            host,
            port,
            username,
            password,
            encryption,
        } => Arc::new(smtp::SmtpTransport::new(
            host.as_deref().unwrap_or_default(),
            *port,
            username.clone().zip(password.clone()),
            *encryption,
            config.timeout,
        )?),
        TransportConfig::Mailjet {
            api_key,
            api_secret,
            base_url,
        } => Arc::new(mailjet::MailjetTransport::new(
            base_url,
            api_key.clone().unwrap_or_default(),
            api_secret.clone().unwrap_or_default(),
            config.timeout,
        )?),
        TransportConfig::Worker { url, token, token_header } => match url {
            Some(url) => Arc::new(worker::WorkerTransport::new(
                url.clone(),
                token_header,
                token.as_deref().unwrap_or_default(),
                config.timeout,
            )?),
            None => return Ok(None),
        },
        TransportConfig::File { path } => Arc::new(file::FileTransport::new(path)?),
    };

    tracing::info!(transport = transport.kind(), "Mail transport ready");
    Ok(Some(transport))
}

/// Send through `transport`, giving up after `timeout`.
pub async fn deliver(transport: &dyn MailTransport, message: &OutboundMessage, timeout: Duration) -> Result<Delivery, TransportError> {
    match tokio::time::timeout(timeout, transport.send(message)).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout(timeout)),
    }
}

/// Cut a provider body down to something reasonable for a log line.
pub(crate) fn truncate_detail(body: &str) -> String {
    if body.len() <= MAX_LOGGED_DETAIL {
        return body.to_string();
    }
    let mut end = MAX_LOGGED_DETAIL;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
