//! The message sent to the site owner, and its Mailjet send-API representation.

use base64::{Engine, engine::general_purpose::STANDARD};
use minijinja::{Environment, context};
use serde::Serialize;

use crate::config::MailConfig;
use crate::errors::{Error, Result};
use crate::submission::{Attachment, ContactSubmission};

const HTML_TEMPLATE_NAME: &str = "contact.html";
const HTML_TEMPLATE: &str = r#"<p><strong>Von:</strong> {{ name }} &lt;{{ email }}&gt;</p>
<p>{% for line in lines %}{{ line }}{% if not loop.last %}<br />
{% endif %}{% endfor %}</p>"#;

/// A named address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub email: String,
    pub name: String,
}

/// Everything a transport needs to deliver one submission.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub from: Address,
    pub to: Address,
    pub reply_to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
    pub attachments: Vec<Attachment>,
}

impl OutboundMessage {
    /// Build the message for a validated submission using the configured sender and recipient.
    pub fn from_submission(submission: ContactSubmission, mail: &MailConfig) -> Result<Self> {
        let recipient = mail
            .recipient_email
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or(Error::NotConfigured {
                missing: vec!["mail.recipient_email"],
            })?;

        let text_body = format!("Von: {} <{}>\n\n{}", submission.name, submission.email, submission.message);
        let html_body = render_html(&submission)?;

        Ok(Self {
            from: Address {
                email: mail.from_email.clone(),
                name: mail.from_name.clone(),
            },
            to: Address {
                email: recipient.to_string(),
                name: mail.recipient_name.clone(),
            },
            reply_to: submission.email,
            subject: submission.subject,
            text_body,
            html_body,
            attachments: submission.attachments,
        })
    }

    /// The `{"Messages": [...]}` body understood by the Mailjet v3.1 send API.
    pub fn to_mailjet_payload(&self) -> SendRequest {
        self.send_request(false)
    }

    /// The Mailjet body with every attachment's content repeated under `Base64`, which older
    /// worker deployments read instead of `Base64Content`.
    pub fn to_worker_payload(&self) -> SendRequest {
        self.send_request(true)
    }

    fn send_request(&self, legacy_base64: bool) -> SendRequest {
        let attachments: Vec<MailjetAttachment> = self
            .attachments
            .iter()
            .map(|a| {
                let encoded = STANDARD.encode(&a.data);
                MailjetAttachment {
                    content_type: a.content_type.clone(),
                    filename: a.filename.clone(),
                    base64: legacy_base64.then(|| encoded.clone()),
                    base64_content: encoded,
                }
            })
            .collect();

        SendRequest {
            messages: vec![MailjetMessage {
                from: MailjetContact::from(&self.from),
                to: vec![MailjetContact::from(&self.to)],
                subject: self.subject.clone(),
                text_part: self.text_body.clone(),
                html_part: self.html_body.clone(),
                headers: MailjetHeaders {
                    reply_to: self.reply_to.clone(),
                },
                attachments: (!attachments.is_empty()).then_some(attachments),
            }],
        }
    }
}

fn render_html(submission: &ContactSubmission) -> Result<String> {
    let mut env = Environment::new();
    // The .html suffix turns on HTML auto-escaping for every interpolated value
    env.add_template(HTML_TEMPLATE_NAME, HTML_TEMPLATE)
        .map_err(|e| Error::Internal {
            operation: format!("compile message template: {e}"),
        })?;

    let lines: Vec<&str> = submission.message.lines().collect();
    env.get_template(HTML_TEMPLATE_NAME)
        .and_then(|template| {
            template.render(context! {
                name => &submission.name,
                email => &submission.email,
                lines => lines,
            })
        })
        .map_err(|e| Error::Internal {
            operation: format!("render message template: {e}"),
        })
}

#[derive(Debug, Serialize)]
pub struct SendRequest {
    #[serde(rename = "Messages")]
    pub messages: Vec<MailjetMessage>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MailjetMessage {
    pub from: MailjetContact,
    pub to: Vec<MailjetContact>,
    pub subject: String,
    pub text_part: String,
    #[serde(rename = "HTMLPart")]
    pub html_part: String,
    pub headers: MailjetHeaders,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<MailjetAttachment>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MailjetContact {
    pub email: String,
    pub name: String,
}

impl From<&Address> for MailjetContact {
    fn from(address: &Address) -> Self {
        Self {
            email: address.email.clone(),
            name: address.name.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MailjetHeaders {
    #[serde(rename = "Reply-To")]
    pub reply_to: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MailjetAttachment {
    pub content_type: String,
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base64: Option<String>,
    pub base64_content: String,
}
