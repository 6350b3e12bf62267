//! Submission client for the relay.
//!
//! [`ContactClient`] posts a [`ContactForm`] as multipart data, the way the browser script does.
//! [`ContactFormController`] adds the page behaviour on top: loading, sent and error indicators,
//! a notification, clearing the message after success, and remembering name and address through
//! a [`PrefillStore`].
//!
//! ```no_run
//! use formrelay::client::{ContactClient, ContactFormController, JsonFilePrefillStore};
//! use std::time::Duration;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = ContactClient::new("https://relay.example.com/contact".parse()?, Duration::from_secs(30))?;
//! let mut controller = ContactFormController::new(client, JsonFilePrefillStore::new("storage.json"));
//! controller.restore_prefill();
//!
//! let form = controller.form_mut();
//! form.name = "Anna Muster".to_string();
//! form.email = "anna@example.com".to_string();
//! form.message = "Ich möchte die Wohnung besichtigen.".to_string();
//!
//! let state = controller.submit().await;
//! println!("{:?}", state.notification);
//! # Ok(())
//! # }
//! ```

use reqwest::multipart;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::submission::{Attachment, HONEYPOT_FIELD};

mod prefill;

pub use prefill::{JsonFilePrefillStore, Prefill, PrefillError, PrefillStore, STORAGE_KEY};

/// Shown when the relay confirms without a message of its own.
pub const DEFAULT_SENT_MESSAGE: &str = "Ihre Nachricht wurde gesendet.";
/// Shown when the relay refuses without a message of its own.
pub const DEFAULT_FAILED_MESSAGE: &str = "Fehler beim Senden";
/// Shown when the relay cannot be reached or gives no usable answer.
pub const NETWORK_FAILED_MESSAGE: &str = "Fehler beim Senden (Netzwerk)";

/// Field name used for file parts.
const ATTACHMENT_FIELD: &str = "attachments[]";

/// The values of the contact form.
#[derive(Debug, Clone, Default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    /// Hidden honeypot, left empty by people
    pub website: String,
    pub attachments: Vec<Attachment>,
}

impl ContactForm {
    fn to_multipart(&self) -> Result<multipart::Form, ClientError> {
        let mut form = multipart::Form::new()
            .text("name", self.name.clone())
            .text("email", self.email.clone())
            .text("subject", self.subject.clone())
            .text("message", self.message.clone())
            .text(HONEYPOT_FIELD, self.website.clone());

        for attachment in &self.attachments {
            let part = multipart::Part::bytes(attachment.data.to_vec())
                .file_name(attachment.filename.clone())
                .mime_str(&attachment.content_type)
                .map_err(|e| ClientError::Request(format!("attachment {}: {e}", attachment.filename)))?;
            form = form.part(ATTACHMENT_FIELD, part);
        }

        Ok(form)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("could not build request: {0}")]
    Request(String),

    #[error("relay unreachable: {0}")]
    Network(#[from] reqwest::Error),

    #[error("relay answered HTTP {status} without a JSON outcome: {detail}")]
    InvalidResponse { status: u16, detail: String },
}

/// The relay's answer, read as leniently as the browser script reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResponse {
    pub status: u16,
    pub success: bool,
    pub message: Option<String>,
}

pub type SubmitResult = Result<SubmitResponse, ClientError>;

#[derive(Debug, Deserialize)]
struct OutcomeBody {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

/// Posts contact forms to one relay endpoint.
#[derive(Debug, Clone)]
pub struct ContactClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl ContactClient {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Send the form once. There are no retries.
    ///
    /// Any JSON answer is returned whatever its HTTP status, since the relay reports refusals in
    /// the body.
    pub async fn submit(&self, form: &ContactForm) -> SubmitResult {
        let response = self
            .http
            .post(self.endpoint.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .multipart(form.to_multipart()?)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        let outcome: OutcomeBody = serde_json::from_str(&body).map_err(|e| ClientError::InvalidResponse {
            status,
            detail: e.to_string(),
        })?;

        Ok(SubmitResponse {
            status,
            success: outcome.success,
            message: outcome.message.filter(|m| !m.trim().is_empty()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

/// What the page shows around the form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub loading: bool,
    pub sent_visible: bool,
    /// Text of the error indicator; `None` while it is hidden
    pub error_message: Option<String>,
    pub notification: Option<Notification>,
}

impl FormState {
    fn begin_submit(&mut self) {
        self.loading = true;
        self.sent_visible = false;
        self.error_message = None;
    }

    fn sent(&mut self, message: String) {
        self.loading = false;
        self.sent_visible = true;
        self.notification = Some(Notification {
            kind: NotificationKind::Success,
            message,
        });
    }

    fn failed(&mut self, message: String) {
        self.loading = false;
        self.error_message = Some(message.clone());
        self.notification = Some(Notification {
            kind: NotificationKind::Error,
            message,
        });
    }
}

/// Drives one contact form through its submissions.
pub struct ContactFormController<S: PrefillStore> {
    client: ContactClient,
    store: S,
    form: ContactForm,
    state: FormState,
}

impl<S: PrefillStore> ContactFormController<S> {
    pub fn new(client: ContactClient, store: S) -> Self {
        Self {
            client,
            store,
            form: ContactForm::default(),
            state: FormState::default(),
        }
    }

    pub fn form(&self) -> &ContactForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut ContactForm {
        &mut self.form
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    /// Fill empty name and email fields from the store.
    pub fn restore_prefill(&mut self) {
        let prefill = match self.store.load() {
            Ok(Some(prefill)) => prefill,
            Ok(None) => return,
            Err(e) => {
                debug!("Ignoring unreadable prefill storage: {}", e);
                return;
            }
        };

        if self.form.name.is_empty() && !prefill.name.is_empty() {
            self.form.name = prefill.name;
        }
        if self.form.email.is_empty() && !prefill.email.is_empty() {
            self.form.email = prefill.email;
        }
    }

    pub async fn submit(&mut self) -> &FormState {
        self.state.begin_submit();

        match self.client.submit(&self.form).await {
            Ok(response) if response.success => {
                self.state
                    .sent(response.message.unwrap_or_else(|| DEFAULT_SENT_MESSAGE.to_string()));
                self.remember_sender();
                self.form.message.clear();
            }
            Ok(response) => {
                debug!(status = response.status, "Relay refused the submission");
                self.state
                    .failed(response.message.unwrap_or_else(|| DEFAULT_FAILED_MESSAGE.to_string()));
            }
            Err(e) => {
                warn!("Contact form submission failed: {}", e);
                self.state.failed(NETWORK_FAILED_MESSAGE.to_string());
            }
        }

        &self.state
    }

    fn remember_sender(&self) {
        let prefill = Prefill {
            name: self.form.name.clone(),
            email: self.form.email.clone(),
        };
        if let Err(e) = self.store.save(&prefill) {
            debug!("Ignoring prefill storage failure: {}", e);
        }
    }
}
