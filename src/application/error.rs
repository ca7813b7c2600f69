use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::Response;
use storegate_api_types::ErrorEnvelope;
use thiserror::Error;

use crate::infra::error::InfraError;

use super::envelope::Envelope;
use super::upstream::UpstreamError;

/// Server-side diagnostic attached to failed responses.
///
/// The logging middleware removes it from the response extensions, so the
/// message chain is logged but never sent to the client.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

const MISSING_CREDENTIALS: &str = "Missing WooCommerce credentials";

/// Failure taxonomy of a proxied call.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Required upstream credentials are not configured.
    #[error("Missing WooCommerce credentials")]
    MissingCredentials,
    /// The inbound request is missing or has malformed fields.
    #[error("{0}")]
    Validation(String),
    /// Upstream answered with a non-2xx status.
    #[error("upstream responded with {status}")]
    UpstreamStatus { status: StatusCode, body: String },
    #[error(transparent)]
    Transport(#[from] UpstreamError),
    #[error("upstream response could not be decoded: {0}")]
    Decode(String),
    #[error("invalid upstream url: {0}")]
    Url(#[from] url::ParseError),
}

impl ProxyError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Validation(_) => StatusCode::BAD_REQUEST,
            ProxyError::UpstreamStatus { status, .. }
                if status.is_client_error() || status.is_server_error() =>
            {
                *status
            }
            ProxyError::UpstreamStatus { .. } => StatusCode::BAD_GATEWAY,
            ProxyError::MissingCredentials
            | ProxyError::Transport(_)
            | ProxyError::Decode(_)
            | ProxyError::Url(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Convert into the client-facing error envelope.
    ///
    /// `action` names the failed operation (e.g. "Failed to fetch products").
    pub fn into_envelope(self, source: &'static str, action: &str) -> Envelope {
        let status = self.status();
        let report = ErrorReport::from_error(source, status, &self);
        let body = match self {
            ProxyError::MissingCredentials => ErrorEnvelope::new(MISSING_CREDENTIALS),
            ProxyError::Validation(message) => ErrorEnvelope::new(message),
            ProxyError::UpstreamStatus { status, body } => ErrorEnvelope::with_details(
                format!(
                    "{action}: {}",
                    status.canonical_reason().unwrap_or("Upstream error")
                ),
                body,
            ),
            ProxyError::Transport(err) => ErrorEnvelope::with_details(action, err.to_string()),
            ProxyError::Decode(_) => {
                ErrorEnvelope::with_details(action, "upstream returned malformed data")
            }
            ProxyError::Url(_) => ErrorEnvelope::with_details(action, "invalid upstream url"),
        };
        Envelope::error(status, body).with_report(report)
    }
}

/// Process-level failure surfaced by `main`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}
