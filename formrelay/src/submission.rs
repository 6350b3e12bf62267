//! Contact submissions: reading the multipart body, enforcing attachment ceilings and validating
//! the fields before anything is handed to a transport.

use axum::extract::{
    Multipart,
    multipart::{Field, MultipartError},
};
use axum::http::StatusCode;
use bytes::{Bytes, BytesMut};
use email_address::EmailAddress;

use crate::config::AttachmentLimits;
use crate::errors::{Error, Result};

/// Hidden form field that people never fill in.
pub const HONEYPOT_FIELD: &str = "website";

/// Subject used when the form leaves it empty.
pub const DEFAULT_SUBJECT: &str = "Kontaktanfrage";

const NAME_MAX_CHARS: usize = 256;
const SUBJECT_MAX_CHARS: usize = 256;
const MESSAGE_MAX_CHARS: usize = 10_000;

const INCOMPLETE_MESSAGE: &str = "Bitte gültige Daten eingeben.";
const INVALID_EMAIL_MESSAGE: &str = "Bitte geben Sie eine gültige E-Mail-Adresse ein.";

/// A file uploaded with the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

impl Attachment {
    pub fn new(filename: &str, content_type: Option<&str>, data: Bytes) -> Self {
        let filename = sanitize_filename(filename);
        let content_type = content_type
            .map(str::trim)
            .filter(|ct| !ct.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| mime_guess::from_path(&filename).first_or_octet_stream().to_string());

        Self {
            filename,
            content_type,
            data,
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Raw form values as posted, before trimming and validation.
#[derive(Debug, Default)]
pub struct SubmissionForm {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub honeypot: String,
    pub attachments: Vec<Attachment>,
}

/// A validated submission, ready to be turned into an outbound message.
#[derive(Debug, Clone)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub attachments: Vec<Attachment>,
}

impl ContactSubmission {
    pub fn total_attachment_bytes(&self) -> u64 {
        self.attachments.iter().map(Attachment::size).sum()
    }
}

impl SubmissionForm {
    /// Check the honeypot, required fields and address syntax.
    pub fn validate(self) -> Result<ContactSubmission> {
        if !self.honeypot.trim().is_empty() {
            return Err(Error::Spam {
                length: self.honeypot.len(),
            });
        }

        let name = self.name.trim();
        let email = self.email.trim();
        let message = self.message.trim();

        if name.is_empty() || email.is_empty() || message.is_empty() {
            return Err(Error::Validation {
                message: INCOMPLETE_MESSAGE.to_string(),
            });
        }

        if !is_valid_email(email) {
            return Err(Error::Validation {
                message: INVALID_EMAIL_MESSAGE.to_string(),
            });
        }

        let subject = single_line(&self.subject);
        let subject = if subject.is_empty() {
            DEFAULT_SUBJECT.to_string()
        } else {
            subject
        };

        check_length("Name", name, NAME_MAX_CHARS)?;
        check_length("Betreff", &subject, SUBJECT_MAX_CHARS)?;
        check_length("Nachricht", message, MESSAGE_MAX_CHARS)?;

        Ok(ContactSubmission {
            name: name.to_string(),
            email: email.to_string(),
            subject,
            message: message.to_string(),
            attachments: self.attachments,
        })
    }
}

/// Read every part of the contact form.
///
/// Parts carrying a filename are attachments regardless of their field name. Attachments are
/// buffered in memory. Once a ceiling is crossed the remaining files are skipped unread, but the
/// text parts are still read so that a filled honeypot is reported as spam rather than as an
/// oversized upload.
pub async fn read_multipart(mut multipart: Multipart, limits: &AttachmentLimits) -> Result<SubmissionForm> {
    let mut form = SubmissionForm::default();
    let mut total_size = 0u64;
    let mut rejection: Option<Error> = None;

    while let Some(mut field) = multipart.next_field().await.map_err(|e| multipart_error(e, limits))? {
        let field_name = field.name().unwrap_or("").to_string();

        if let Some(file_name) = field.file_name().map(str::to_string) {
            // Browsers send an empty part for a file input left blank
            if file_name.trim().is_empty() || rejection.is_some() {
                continue;
            }

            if form.attachments.len() >= limits.max_files {
                rejection = Some(Error::PayloadTooLarge {
                    message: format!("Es sind höchstens {} Anhänge erlaubt.", limits.max_files),
                });
                continue;
            }

            let content_type = field.content_type().map(str::to_string);
            let data = match read_file(&mut field, &file_name, total_size, limits).await {
                Ok(data) => data,
                Err(e @ Error::PayloadTooLarge { .. }) => {
                    rejection = Some(e);
                    continue;
                }
                Err(e) => return Err(e),
            };
            if data.is_empty() {
                continue;
            }

            total_size += data.len() as u64;
            tracing::debug!(field = %field_name, size = data.len(), "Received attachment");
            form.attachments.push(Attachment::new(&file_name, content_type.as_deref(), data));
            continue;
        }

        let value = field.text().await.map_err(|e| multipart_error(e, limits))?;
        match field_name.as_str() {
            "name" => form.name = value,
            "email" => form.email = value,
            "subject" => form.subject = value,
            "message" => form.message = value,
            HONEYPOT_FIELD => {
                // No need to read the rest of a bot's upload
                if !value.trim().is_empty() {
                    return Err(Error::Spam { length: value.len() });
                }
                form.honeypot = value;
            }
            other => tracing::debug!(field = other, "Ignoring unknown form field"),
        }
    }

    match rejection {
        Some(e) => Err(e),
        None => Ok(form),
    }
}

async fn read_file(field: &mut Field<'_>, file_name: &str, already_received: u64, limits: &AttachmentLimits) -> Result<Bytes> {
    let mut data = BytesMut::new();

    while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(e, limits))? {
        let size = (data.len() + chunk.len()) as u64;

        if size > limits.max_file_size {
            tracing::warn!(size, max_file_size = limits.max_file_size, "Attachment exceeds per-file limit");
            return Err(Error::PayloadTooLarge {
                message: format!(
                    "Die Datei „{}“ überschreitet die maximale Größe von {} pro Datei.",
                    sanitize_filename(file_name),
                    human_size(limits.max_file_size)
                ),
            });
        }

        if already_received + size > limits.max_total_size {
            tracing::warn!(
                size = already_received + size,
                max_total_size = limits.max_total_size,
                "Attachments exceed total limit"
            );
            return Err(total_size_error(limits));
        }

        data.extend_from_slice(&chunk);
    }

    Ok(data.freeze())
}

fn total_size_error(limits: &AttachmentLimits) -> Error {
    Error::PayloadTooLarge {
        message: format!(
            "Die Anhänge überschreiten zusammen die maximale Größe von {}.",
            human_size(limits.max_total_size)
        ),
    }
}

fn multipart_error(err: MultipartError, limits: &AttachmentLimits) -> Error {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        total_size_error(limits)
    } else {
        Error::MalformedBody { detail: err.body_text() }
    }
}

fn is_valid_email(email: &str) -> bool {
    // Display names and folded whitespace belong in headers we build ourselves, not in the field
    !email.chars().any(|c| c.is_whitespace() || c == '<' || c == '>') && EmailAddress::is_valid(email)
}

fn check_length(label: &str, value: &str, max_chars: usize) -> Result<()> {
    if value.chars().count() > max_chars {
        return Err(Error::Validation {
            message: format!("{label} ist zu lang (höchstens {max_chars} Zeichen)."),
        });
    }
    Ok(())
}

/// Collapse CR/LF runs into single spaces so the value is safe for a mail header.
pub fn single_line(value: &str) -> String {
    value
        .split(['\r', '\n'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Keep only the final path component of a client-supplied filename.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base.chars().filter(|c| !c.is_control()).collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        "attachment".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Render a byte count the way limits are communicated to people ("10 MB", "512 KB").
pub fn human_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;

    if bytes >= MIB {
        let mb = bytes as f64 / MIB as f64;
        let formatted = format!("{mb:.1}");
        format!("{} MB", formatted.trim_end_matches(".0"))
    } else if bytes >= KIB {
        format!("{} KB", bytes / KIB)
    } else {
        format!("{bytes} Bytes")
    }
}
