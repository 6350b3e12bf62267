use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::submission::ContactSubmission;

/// Message returned after a successful relay.
pub const SENT_MESSAGE: &str = "Nachricht gesendet.";

/// Normalized answer of the contact endpoint.
///
/// Every response from the relay, successful or not, has this shape. `message` is always safe to
/// show to the visitor.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RelayOutcome {
    pub success: bool,
    pub message: String,
    /// Status reported by the mail provider, present after a successful relay
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_status: Option<u16>,
    /// Summary of the forwarded attachments, present after a successful relay
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments_meta: Option<AttachmentsMeta>,
}

impl RelayOutcome {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            provider_status: None,
            attachments_meta: None,
        }
    }

    pub fn sent(provider_status: Option<u16>, attachments_meta: AttachmentsMeta) -> Self {
        Self {
            success: true,
            message: SENT_MESSAGE.to_string(),
            provider_status,
            attachments_meta: Some(attachments_meta),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AttachmentsMeta {
    pub count: usize,
    pub total_bytes: u64,
    pub files: Vec<AttachmentMeta>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AttachmentMeta {
    pub filename: String,
    pub bytes: u64,
}

impl From<&ContactSubmission> for AttachmentsMeta {
    fn from(submission: &ContactSubmission) -> Self {
        Self {
            count: submission.attachments.len(),
            total_bytes: submission.total_attachment_bytes(),
            files: submission
                .attachments
                .iter()
                .map(|a| AttachmentMeta {
                    filename: a.filename.clone(),
                    bytes: a.size(),
                })
                .collect(),
        }
    }
}
