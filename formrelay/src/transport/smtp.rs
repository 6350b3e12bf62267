//! Direct SMTP transport.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
    message::{Attachment as MimeAttachment, Mailbox, MultiPart, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use std::time::Duration;

use crate::config::SmtpEncryption;
use crate::errors::Error;
use crate::message::{Address, OutboundMessage};
use crate::transport::{Delivery, MailTransport, TransportError};

pub struct SmtpTransport {
    inner: AsyncSmtpTransport<Tokio1Executor>,
    timeout: Duration,
}

impl SmtpTransport {
    pub fn new(
        host: &str,
        port: u16,
        credentials: Option<(String, String)>,
        encryption: SmtpEncryption,
        timeout: Duration,
    ) -> Result<Self, Error> {
        if encryption == SmtpEncryption::None {
            tracing::warn!("SMTP encryption is disabled - this is not recommended for production");
        }

        let builder = match encryption {
            SmtpEncryption::Starttls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host),
            SmtpEncryption::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(host),
            SmtpEncryption::None => Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)),
        }
        .map_err(|e| Error::Internal {
            operation: format!("create SMTP transport: {e}"),
        })?
        .port(port)
        .timeout(Some(timeout));

        let builder = match credentials {
            Some((username, password)) => builder.credentials(Credentials::new(username, password)),
            None => builder,
        };

        Ok(Self {
            inner: builder.build(),
            timeout,
        })
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    fn kind(&self) -> &'static str {
        "smtp"
    }

    async fn send(&self, message: &OutboundMessage) -> Result<Delivery, TransportError> {
        let email = build_mime_message(message)?;

        let response = self.inner.send(email).await.map_err(|e| {
            let status = e.status().and_then(|code| code.to_string().parse::<u16>().ok());
            if e.is_timeout() {
                TransportError::Timeout(self.timeout)
            } else if e.is_permanent() || e.is_transient() {
                TransportError::Rejected {
                    status,
                    detail: e.to_string(),
                }
            } else {
                TransportError::Connection(e.to_string())
            }
        })?;

        let status = response.code().to_string().parse::<u16>().ok();
        if !response.is_positive() {
            return Err(TransportError::Rejected {
                status,
                detail: response.message().collect::<Vec<_>>().join(" "),
            });
        }

        Ok(Delivery {
            provider_status: status,
            reference: response.first_line().map(str::to_string),
        })
    }
}

fn mailbox(address: &Address) -> Result<Mailbox, TransportError> {
    let email = address
        .email
        .parse()
        .map_err(|e| TransportError::InvalidMessage(format!("parse address: {e}")))?;
    let name = Some(address.name.clone()).filter(|n| !n.trim().is_empty());
    Ok(Mailbox::new(name, email))
}

/// Build the MIME message: plain text and HTML alternatives, followed by the attachments.
pub(crate) fn build_mime_message(message: &OutboundMessage) -> Result<lettre::Message, TransportError> {
    let reply_to = message
        .reply_to
        .parse()
        .map(|email| Mailbox::new(None, email))
        .map_err(|e| TransportError::InvalidMessage(format!("parse reply-to: {e}")))?;

    let alternative = MultiPart::alternative_plain_html(message.text_body.clone(), message.html_body.clone());

    let body = if message.attachments.is_empty() {
        alternative
    } else {
        let mut mixed = MultiPart::mixed().multipart(alternative);
        for attachment in &message.attachments {
            let content_type = ContentType::parse(&attachment.content_type)
                .or_else(|_| ContentType::parse("application/octet-stream"))
                .map_err(|e| TransportError::InvalidMessage(format!("attachment content type: {e}")))?;
            mixed = mixed.singlepart(MimeAttachment::new(attachment.filename.clone()).body(attachment.data.to_vec(), content_type));
        }
        mixed
    };

    lettre::Message::builder()
        .from(mailbox(&message.from)?)
        .to(mailbox(&message.to)?)
        .reply_to(reply_to)
        .subject(message.subject.clone())
        .multipart(body)
        .map_err(|e| TransportError::InvalidMessage(format!("build email message: {e}")))
}
