//! HTTP handler for the contact form endpoint.

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::Method,
};

use crate::{
    AppState,
    api::models::contact::{AttachmentsMeta, RelayOutcome},
    errors::{Error, Result},
    message::OutboundMessage,
    submission::read_multipart,
    transport::deliver,
};

/// Relay a contact form submission to the site owner.
#[utoipa::path(
    post,
    path = "/contact",
    tag = "contact",
    summary = "Submit contact form",
    description = "Validate a contact form submission and relay it, with its attachments, through the configured mail transport.",
    request_body(
        content_type = "multipart/form-data",
        description = "Fields `name`, `email`, `message`, optional `subject`, the honeypot `website`, and any number of file parts"
    ),
    responses(
        (status = 200, description = "Message relayed", body = RelayOutcome),
        (status = 400, description = "Missing or invalid fields, or spam", body = RelayOutcome),
        (status = 405, description = "Method not allowed", body = RelayOutcome),
        (status = 413, description = "Attachment too large or too many attachments", body = RelayOutcome),
        (status = 500, description = "Service not configured", body = RelayOutcome),
        (status = 502, description = "Mail transport failed", body = RelayOutcome),
        (status = 504, description = "Mail transport timed out", body = RelayOutcome)
    )
)]
#[tracing::instrument(skip_all)]
pub async fn submit_contact(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<RelayOutcome>> {
    let Some(transport) = state.transport.clone() else {
        return Err(Error::NotConfigured {
            missing: state.config.mail.missing_keys(),
        });
    };

    let multipart = multipart.map_err(|e| Error::MalformedBody { detail: e.body_text() })?;
    let submission = read_multipart(multipart, &state.config.attachments).await?.validate()?;

    let attachments_meta = AttachmentsMeta::from(&submission);
    let message = OutboundMessage::from_submission(submission, &state.config.mail)?;

    let delivery = deliver(transport.as_ref(), &message, state.config.mail.timeout)
        .await
        .map_err(|source| Error::Delivery {
            transport: transport.kind(),
            source,
        })?;

    tracing::info!(
        transport = transport.kind(),
        provider_status = ?delivery.provider_status,
        reference = ?delivery.reference,
        attachments = attachments_meta.count,
        attachment_bytes = attachments_meta.total_bytes,
        "Contact message relayed"
    );
    metrics::counter!("formrelay_submissions_total", "outcome" => "sent").increment(1);

    Ok(Json(RelayOutcome::sent(delivery.provider_status, attachments_meta)))
}

/// Every other method on the contact route.
pub async fn method_not_allowed(method: Method) -> Error {
    Error::MethodNotAllowed {
        method: method.to_string(),
    }
}
