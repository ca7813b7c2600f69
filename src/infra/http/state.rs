use std::{sync::Arc, time::Duration};

use crate::application::{
    auth::AuthService,
    catalog::CatalogService,
    customers::CustomerService,
    documents::{DocumentService, DocumentStore},
    gateway::{StoreGateway, UpstreamEndpoints},
    upstream::Upstream,
};
use crate::cache::{CacheConfig, Clock};
use crate::config::Settings;
use crate::infra::documents::{FsDocumentStore, RemoteDocumentStore};

/// Shared services behind every route.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogService>,
    pub auth: Arc<AuthService>,
    pub customers: Arc<CustomerService>,
    pub documents: Arc<DocumentService>,
}

impl AppState {
    pub fn new(
        gateway: Arc<StoreGateway>,
        cache: CacheConfig,
        clock: Arc<dyn Clock>,
        documents: Arc<dyn DocumentStore>,
        document_max_age: Duration,
    ) -> Self {
        Self {
            catalog: Arc::new(CatalogService::new(gateway.clone(), cache, clock)),
            auth: Arc::new(AuthService::new(gateway.clone())),
            customers: Arc::new(CustomerService::new(gateway)),
            documents: Arc::new(DocumentService::new(documents, document_max_age)),
        }
    }

    /// Wire every service from resolved settings. Documents come from the
    /// remote base URL when one is configured, otherwise from the directory.
    pub fn from_settings(
        settings: &Settings,
        upstream: Arc<dyn Upstream>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let gateway = Arc::new(StoreGateway::new(
            upstream.clone(),
            UpstreamEndpoints::from(&settings.upstream),
        ));
        let documents: Arc<dyn DocumentStore> = match settings.documents.base_url.clone() {
            Some(base_url) => Arc::new(RemoteDocumentStore::new(upstream, base_url)),
            None => Arc::new(FsDocumentStore::new(settings.documents.directory.clone())),
        };

        Self::new(
            gateway,
            CacheConfig::from(&settings.cache),
            clock,
            documents,
            settings.documents.max_age,
        )
    }
}
