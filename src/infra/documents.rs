//! Document store backends.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use bytes::Bytes;
use tokio::fs;
use url::Url;

use crate::application::documents::{Document, DocumentError, DocumentStore};
use crate::application::error::ProxyError;
use crate::application::upstream::{Upstream, UpstreamRequest, UpstreamTarget};

/// Documents stored below a local directory as `<category>/<file>`.
#[derive(Debug)]
pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn resolve(&self, category: Option<&str>, file: &str) -> Result<PathBuf, DocumentError> {
        let relative = match category {
            Some(category) => Path::new(category).join(file),
            None => PathBuf::from(file),
        };
        if relative.is_absolute()
            || relative.components().any(|component| {
                matches!(
                    component,
                    Component::ParentDir | Component::RootDir | Component::Prefix(_)
                )
            })
        {
            return Err(DocumentError::InvalidPath);
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn fetch(&self, category: Option<&str>, file: &str) -> Result<Document, DocumentError> {
        let absolute = self.resolve(category, file)?;
        match fs::read(&absolute).await {
            Ok(data) => Ok(Document {
                bytes: Bytes::from(data),
                content_type: None,
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(DocumentError::NotFound),
            Err(err) => Err(DocumentError::Io(err)),
        }
    }
}

/// Documents served by a remote file host as `<base>/<category>/<file>`.
pub struct RemoteDocumentStore {
    upstream: Arc<dyn Upstream>,
    base_url: Url,
}

impl RemoteDocumentStore {
    pub fn new(upstream: Arc<dyn Upstream>, base_url: Url) -> Self {
        Self { upstream, base_url }
    }

    fn document_url(&self, category: Option<&str>, file: &str) -> Result<Url, DocumentError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| DocumentError::InvalidPath)?;
            segments.pop_if_empty();
            if let Some(category) = category {
                segments.push(category);
            }
            segments.push(file);
        }
        Ok(url)
    }
}

#[async_trait]
impl DocumentStore for RemoteDocumentStore {
    async fn fetch(&self, category: Option<&str>, file: &str) -> Result<Document, DocumentError> {
        let url = self.document_url(category, file)?;
        let response = self
            .upstream
            .send(UpstreamRequest::get(UpstreamTarget::Documents, url))
            .await
            .map_err(ProxyError::from)?;

        if response.status == StatusCode::NOT_FOUND {
            return Err(DocumentError::NotFound);
        }
        if !response.status.is_success() {
            return Err(ProxyError::UpstreamStatus {
                status: response.status,
                body: response.body_text(),
            }
            .into());
        }

        Ok(Document {
            bytes: response.body,
            content_type: response.content_type,
        })
    }
}
