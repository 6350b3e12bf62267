use crate::api::models::contact::RelayOutcome;
use crate::transport::TransportError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

/// Generic message for every failure that must not reveal provider internals.
const SEND_FAILED_MESSAGE: &str = "Die Nachricht konnte nicht gesendet werden. Bitte versuchen Sie es später erneut.";

#[derive(ThisError, Debug)]
pub enum Error {
    /// The contact route only accepts POST
    #[error("Method {method} not allowed")]
    MethodNotAllowed { method: String },

    /// The honeypot field was filled in
    #[error("Honeypot field filled in (field length {length})")]
    Spam { length: usize },

    /// Missing or malformed submission fields
    #[error("{message}")]
    Validation { message: String },

    /// An attachment or the whole request exceeded a configured ceiling
    #[error("{message}")]
    PayloadTooLarge { message: String },

    /// The multipart body could not be parsed
    #[error("Malformed multipart body: {detail}")]
    MalformedBody { detail: String },

    /// Recipient or transport credentials are absent
    #[error("Mail transport not configured, missing keys: {}", missing.join(", "))]
    NotConfigured { missing: Vec<&'static str> },

    /// The transport failed or did not confirm delivery
    #[error("Delivery via {transport} failed: {source}")]
    Delivery {
        transport: &'static str,
        #[source]
        source: TransportError,
    },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Error::Spam { .. } | Error::Validation { .. } | Error::MalformedBody { .. } => StatusCode::BAD_REQUEST,
            Error::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Error::NotConfigured { .. } | Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Delivery { source, .. } => match source {
                TransportError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::BAD_GATEWAY,
            },
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::MethodNotAllowed { .. } => "Nur POST-Anfragen sind erlaubt.".to_string(),
            Error::Spam { .. } => SEND_FAILED_MESSAGE.to_string(),
            Error::Validation { message } | Error::PayloadTooLarge { message } => message.clone(),
            Error::MalformedBody { .. } => "Die Formulardaten konnten nicht gelesen werden.".to_string(),
            Error::NotConfigured { .. } => "Dienst nicht konfiguriert.".to_string(),
            Error::Delivery { .. } | Error::Internal { .. } => SEND_FAILED_MESSAGE.to_string(),
        }
    }

    /// Label used for the submissions counter.
    pub fn outcome_label(&self) -> &'static str {
        match self {
            Error::MethodNotAllowed { .. } => "method_not_allowed",
            Error::Spam { .. } => "spam",
            Error::Validation { .. } | Error::MalformedBody { .. } => "invalid",
            Error::PayloadTooLarge { .. } => "too_large",
            Error::NotConfigured { .. } => "not_configured",
            Error::Delivery { .. } => "delivery_failed",
            Error::Internal { .. } => "internal",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Internal { .. } | Error::NotConfigured { .. } => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Delivery { .. } => {
                tracing::error!("Transport error: {:#}", self);
            }
            Error::Spam { .. } => {
                tracing::info!("Rejected submission: {}", self);
            }
            Error::MethodNotAllowed { .. }
            | Error::Validation { .. }
            | Error::PayloadTooLarge { .. }
            | Error::MalformedBody { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        metrics::counter!("formrelay_submissions_total", "outcome" => self.outcome_label()).increment(1);

        let status = self.status_code();
        let body = RelayOutcome::failure(self.user_message());

        (status, Json(body)).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
