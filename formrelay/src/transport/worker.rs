//! Intermediary worker transport.
//!
//! The worker (for example an edge function holding the Mailjet credentials) receives the same
//! `{"Messages": [...]}` payload as the Mailjet API, authenticated with a shared token header, and
//! answers with Mailjet's response.

use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};
use std::time::Duration;
use url::Url;

use crate::errors::Error;
use crate::message::OutboundMessage;
use crate::transport::mailjet::{http_client, interpret_send_response, request_error};
use crate::transport::{Delivery, MailTransport, TransportError};

pub struct WorkerTransport {
    client: reqwest::Client,
    url: Url,
    token_header: HeaderName,
    token: HeaderValue,
    timeout: Duration,
}

impl WorkerTransport {
    pub fn new(url: Url, token_header: &str, token: &str, timeout: Duration) -> Result<Self, Error> {
        let token_header = HeaderName::from_bytes(token_header.as_bytes()).map_err(|e| Error::Internal {
            operation: format!("parse worker token header name: {e}"),
        })?;
        let mut token = HeaderValue::from_str(token).map_err(|_| Error::Internal {
            operation: "parse worker token: value contains characters not allowed in a header".to_string(),
        })?;
        token.set_sensitive(true);

        Ok(Self {
            client: http_client(timeout)?,
            url,
            token_header,
            token,
            timeout,
        })
    }
}

#[async_trait]
impl MailTransport for WorkerTransport {
    fn kind(&self) -> &'static str {
        "worker"
    }

    async fn send(&self, message: &OutboundMessage) -> Result<Delivery, TransportError> {
        let response = self
            .client
            .post(self.url.clone())
            .header(self.token_header.clone(), self.token.clone())
            .json(&message.to_worker_payload())
            .send()
            .await
            .map_err(|e| request_error(e, self.timeout))?;

        interpret_send_response(response, self.timeout).await
    }
}
