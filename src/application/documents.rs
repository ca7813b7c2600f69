//! Binary document passthrough.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use axum::http::StatusCode;
use bytes::Bytes;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use storegate_api_types::ErrorEnvelope;
use thiserror::Error;
use tracing::{debug, instrument};

use super::envelope::Envelope;
use super::error::{ErrorReport, ProxyError};

const SOURCE: &str = "application::documents";

#[derive(Debug, Clone)]
pub struct Document {
    pub bytes: Bytes,
    /// Content type reported by the backend, if it knows one.
    pub content_type: Option<String>,
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document not found")]
    NotFound,
    #[error("invalid document path")]
    InvalidPath,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Upstream(#[from] ProxyError),
}

/// Backend holding the storefront's documents (lab results, certificates).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// `category` and `file` are single, already validated path segments.
    async fn fetch(&self, category: Option<&str>, file: &str) -> Result<Document, DocumentError>;
}

/// Query string of `GET /api/file-proxy`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentQuery {
    pub file: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DocumentReply {
    pub bytes: Bytes,
    pub content_type: String,
    /// Quoted strong validator: the SHA-256 of the bytes.
    pub etag: String,
    pub max_age: Duration,
}

pub struct DocumentService {
    store: Arc<dyn DocumentStore>,
    max_age: Duration,
}

impl DocumentService {
    pub fn new(store: Arc<dyn DocumentStore>, max_age: Duration) -> Self {
        Self { store, max_age }
    }

    #[instrument(skip(self))]
    pub async fn fetch(&self, query: &DocumentQuery) -> Result<DocumentReply, Envelope> {
        let Some(file) = query.file.as_deref().filter(|file| !file.is_empty()) else {
            return Err(failure(
                StatusCode::BAD_REQUEST,
                "File parameter is required",
                None,
            ));
        };
        let category = query
            .category
            .as_deref()
            .filter(|category| !category.is_empty());

        if !is_safe_segment(file) || !category.is_none_or(is_safe_segment) {
            return Err(failure(StatusCode::BAD_REQUEST, "Invalid file path", None));
        }

        let document = match self.store.fetch(category, file).await {
            Ok(document) => document,
            Err(DocumentError::NotFound) => {
                return Err(failure(StatusCode::NOT_FOUND, "Document not found", None));
            }
            Err(DocumentError::InvalidPath) => {
                return Err(failure(StatusCode::BAD_REQUEST, "Invalid file path", None));
            }
            Err(DocumentError::Upstream(err)) => {
                return Err(err.into_envelope(SOURCE, "Failed to fetch document"));
            }
            Err(err @ DocumentError::Io(_)) => {
                return Err(failure(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to read document",
                    Some(&err),
                ));
            }
        };

        let content_type = document.content_type.unwrap_or_else(|| {
            mime_guess::from_path(file)
                .first_or_octet_stream()
                .to_string()
        });
        let digest = Sha256::digest(&document.bytes);
        let etag = format!("\"{}\"", hex::encode(&digest[..]));
        debug!(size = document.bytes.len(), content_type = %content_type, "document served");

        Ok(DocumentReply {
            bytes: document.bytes,
            content_type,
            etag,
            max_age: self.max_age,
        })
    }
}

/// A single non-empty path segment that cannot climb out of its directory.
fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\', '\0'])
        && !segment.contains(':')
}

fn failure(status: StatusCode, message: &str, error: Option<&DocumentError>) -> Envelope {
    let report = match error {
        Some(error) => ErrorReport::from_error(SOURCE, status, error),
        None => ErrorReport::from_message(SOURCE, status, message),
    };
    Envelope::error(status, ErrorEnvelope::new(message)).with_report(report)
}
