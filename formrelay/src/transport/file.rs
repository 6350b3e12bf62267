//! File transport for development: every message is written as an `.eml` file.

use async_trait::async_trait;
use lettre::{AsyncFileTransport, AsyncTransport, Tokio1Executor};
use std::path::Path;

use crate::errors::Error;
use crate::message::OutboundMessage;
use crate::transport::smtp::build_mime_message;
use crate::transport::{Delivery, MailTransport, TransportError};

pub struct FileTransport {
    inner: AsyncFileTransport<Tokio1Executor>,
}

impl FileTransport {
    pub fn new(path: &str) -> Result<Self, Error> {
        let emails_dir = Path::new(path);
        if !emails_dir.exists() {
            std::fs::create_dir_all(emails_dir).map_err(|e| Error::Internal {
                operation: format!("create emails directory: {e}"),
            })?;
        }
        tracing::warn!(path, "Using file mail transport - messages are written to disk, not sent");

        Ok(Self {
            inner: AsyncFileTransport::<Tokio1Executor>::new(emails_dir),
        })
    }
}

#[async_trait]
impl MailTransport for FileTransport {
    fn kind(&self) -> &'static str {
        "file"
    }

    async fn send(&self, message: &OutboundMessage) -> Result<Delivery, TransportError> {
        let email = build_mime_message(message)?;
        let id = self.inner.send(email).await.map_err(|e| TransportError::Io(e.to_string()))?;

        Ok(Delivery {
            provider_status: None,
            reference: Some(id),
        })
    }
}
