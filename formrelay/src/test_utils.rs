//! Shared helpers for unit and integration tests.

use async_trait::async_trait;
use axum_test::TestServer;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::{Config, MailConfig, TransportConfig};
use crate::message::{Address, OutboundMessage};
use crate::transport::{Delivery, MailTransport, TransportError};
use crate::{AppState, build_router};

/// reqwest and lettre are built without a default crypto provider.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}

pub fn create_test_config() -> Config {
    // Use temp directory for test emails
    let temp_dir = std::env::temp_dir().join(format!("formrelay-test-emails-{}", std::process::id()));

    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        mail: MailConfig {
            transport: TransportConfig::File {
                path: temp_dir.to_string_lossy().into_owned(),
            },
            recipient_email: Some("office@example.com".to_string()),
            timeout: Duration::from_secs(5),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Build a test server around `transport`; `None` behaves like an unconfigured deployment.
pub fn create_test_server<T>(config: Config, transport: Option<Arc<T>>) -> TestServer
where
    T: MailTransport + 'static,
{
    let state = AppState::builder()
        .config(config)
        .maybe_transport(transport.map(|t| t as Arc<dyn MailTransport>))
        .build();
    let router = build_router(&state).expect("Failed to build router");
    TestServer::new(router).expect("Failed to create test server")
}

pub fn sample_message() -> OutboundMessage {
    OutboundMessage {
        from: Address {
            email: "no-reply@example.com".to_string(),
            name: "Kontaktformular".to_string(),
        },
        to: Address {
            email: "office@example.com".to_string(),
            name: "Empfänger".to_string(),
        },
        reply_to: "anna@example.com".to_string(),
        subject: "Besichtigung".to_string(),
        text_body: "Von: Anna Muster <anna@example.com>\n\nIch möchte die Wohnung besichtigen.".to_string(),
        html_body: "<p><strong>Von:</strong> Anna Muster &lt;anna@example.com&gt;</p>\n<p>Ich möchte die Wohnung besichtigen.</p>"
            .to_string(),
        attachments: Vec::new(),
    }
}

#[derive(Debug, Clone)]
enum Behavior {
    Accept,
    Unreachable,
    Unconfirmed,
    Delay(Duration),
}

/// In-memory transport that records every message handed to it.
pub struct RecordingTransport {
    behavior: Behavior,
    sent: Mutex<Vec<OutboundMessage>>,
}

impl RecordingTransport {
    fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Confirms every message with status 200.
    pub fn accepting() -> Self {
        Self::new(Behavior::Accept)
    }

    /// Fails every message as if the provider could not be reached.
    pub fn unreachable() -> Self {
        Self::new(Behavior::Unreachable)
    }

    /// Answers 2xx without a delivery status.
    pub fn unconfirmed() -> Self {
        Self::new(Behavior::Unconfirmed)
    }

    /// Accepts after sleeping for `delay`.
    pub fn delayed(delay: Duration) -> Self {
        Self::new(Behavior::Delay(delay))
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    fn kind(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, message: &OutboundMessage) -> Result<Delivery, TransportError> {
        if let Behavior::Delay(delay) = self.behavior {
            tokio::time::sleep(delay).await;
        }
        self.sent.lock().unwrap().push(message.clone());

        match self.behavior {
            Behavior::Accept | Behavior::Delay(_) => Ok(Delivery {
                provider_status: Some(200),
                reference: Some("test-message-id".to_string()),
            }),
            Behavior::Unreachable => Err(TransportError::Connection(
                "error sending request for url (http://127.0.0.1:9/send): connection refused".to_string(),
            )),
            Behavior::Unconfirmed => Err(TransportError::UnexpectedResponse {
                status: 200,
                detail: "OK".to_string(),
            }),
        }
    }
}
