//! Product, category and variation reads, plus the stock write path.

use std::sync::Arc;

use axum::http::Method;
use serde::Deserialize;
use serde_json::{Value, json};
use storegate_api_types::{
    CategoriesEnvelope, ProductEnvelope, ProductsEnvelope, StockUpdateEnvelope,
    StockUpdateRequest, VariationsEnvelope,
};
use tracing::{info, instrument};

use crate::cache::{CacheConfig, CacheKey, CacheStore, Clock, ResourceFamily};

use super::envelope::{Envelope, ProxyResponse};
use super::error::ProxyError;
use super::gateway::StoreGateway;
use super::proxy::fetch_cached;

const SOURCE: &str = "application::catalog";

/// Page size for collections the storefront always wants in full.
const COLLECTION_PAGE_SIZE: u32 = 100;
const MAX_PAGE_SIZE: u32 = 100;

const FETCH_PRODUCTS: &str = "Failed to fetch products";
const FETCH_PRODUCT: &str = "Failed to fetch product";
const FETCH_CATEGORIES: &str = "Failed to fetch categories";
const FETCH_VARIATIONS: &str = "Failed to fetch variations";
const UPDATE_STOCK: &str = "Failed to update stock";

/// Query string of `GET /api/products`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductQuery {
    pub id: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub featured: Option<bool>,
    pub on_sale: Option<bool>,
    pub orderby: Option<String>,
    pub order: Option<String>,
}

impl ProductQuery {
    /// The requested product id, if this is a single-product lookup.
    pub fn product_id(&self) -> Result<Option<u64>, ProxyError> {
        match non_empty(self.id.as_deref()) {
            Some(raw) => parse_id(raw).map(Some),
            None => Ok(None),
        }
    }

    /// List parameters in cache key order. Empty strings count as absent.
    pub fn list_params(&self) -> Result<Vec<(&'static str, String)>, ProxyError> {
        if self.page == Some(0) {
            return Err(ProxyError::validation("page must be at least 1"));
        }
        if let Some(per_page) = self.per_page
            && !(1..=MAX_PAGE_SIZE).contains(&per_page)
        {
            return Err(ProxyError::validation(format!(
                "per_page must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }

        let mut params = Vec::new();
        let mut push = |name: &'static str, value: Option<String>| {
            if let Some(value) = value {
                params.push((name, value));
            }
        };
        push("page", self.page.map(|page| page.to_string()));
        push("per_page", self.per_page.map(|size| size.to_string()));
        push("category", non_empty(self.category.as_deref()).map(str::to_string));
        push("search", non_empty(self.search.as_deref()).map(str::to_string));
        push("featured", self.featured.map(|flag| flag.to_string()));
        push("on_sale", self.on_sale.map(|flag| flag.to_string()));
        push("orderby", non_empty(self.orderby.as_deref()).map(str::to_string));
        push("order", non_empty(self.order.as_deref()).map(str::to_string));
        Ok(params)
    }
}

/// One cache store per resource family.
#[derive(Clone)]
pub struct CatalogStores {
    pub products: Arc<CacheStore<Envelope>>,
    pub categories: Arc<CacheStore<Envelope>>,
    pub variations: Arc<CacheStore<Envelope>>,
}

impl CatalogStores {
    pub fn new(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let store = |family| Arc::new(CacheStore::from_config(family, config, clock.clone()));
        Self {
            products: store(ResourceFamily::Products),
            categories: store(ResourceFamily::Categories),
            variations: store(ResourceFamily::Variations),
        }
    }

    pub fn for_family(&self, family: ResourceFamily) -> &CacheStore<Envelope> {
        match family {
            ResourceFamily::Products => &self.products,
            ResourceFamily::Categories => &self.categories,
            ResourceFamily::Variations => &self.variations,
        }
    }
}

pub struct CatalogService {
    gateway: Arc<StoreGateway>,
    config: CacheConfig,
    stores: Option<CatalogStores>,
}

impl CatalogService {
    /// Stores are only built when caching is enabled.
    pub fn new(gateway: Arc<StoreGateway>, config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let stores = config
            .enabled
            .then(|| CatalogStores::new(&config, clock));
        Self {
            gateway,
            config,
            stores,
        }
    }

    pub fn stores(&self) -> Option<&CatalogStores> {
        self.stores.as_ref()
    }

    fn store(&self, family: ResourceFamily) -> Option<&CacheStore<Envelope>> {
        self.stores.as_ref().map(|stores| stores.for_family(family))
    }

    /// Single product when `id` is present, otherwise a product listing.
    pub async fn products(&self, query: &ProductQuery) -> ProxyResponse {
        match query.product_id() {
            Ok(Some(id)) => self.product(id).await,
            Ok(None) => self.product_list(query).await,
            Err(err) => ProxyResponse::uncached(err.into_envelope(SOURCE, FETCH_PRODUCTS)),
        }
    }

    #[instrument(skip(self))]
    pub async fn product(&self, id: u64) -> ProxyResponse {
        if let Err(err) = self.gateway.ensure_credentials() {
            return ProxyResponse::uncached(err.into_envelope(SOURCE, FETCH_PRODUCT));
        }

        let key = CacheKey::product(id);
        let store = self.store(ResourceFamily::Products);
        fetch_cached(store, self.config.product_ttl, &key, || async move {
            match self.gateway.store_get(&format!("products/{id}"), &[]).await {
                Ok(product) => Envelope::ok(&ProductEnvelope {
                    success: true,
                    status: 200,
                    product,
                }),
                Err(err) => err.into_envelope(SOURCE, FETCH_PRODUCT),
            }
        })
        .await
    }

    #[instrument(skip_all)]
    pub async fn product_list(&self, query: &ProductQuery) -> ProxyResponse {
        if let Err(err) = self.gateway.ensure_credentials() {
            return ProxyResponse::uncached(err.into_envelope(SOURCE, FETCH_PRODUCTS));
        }
        let params = match query.list_params() {
            Ok(params) => params,
            Err(err) => {
                return ProxyResponse::uncached(err.into_envelope(SOURCE, FETCH_PRODUCTS));
            }
        };

        let key = CacheKey::product_list(
            params
                .iter()
                .map(|(name, value)| (*name, value.as_str())),
        );
        let store = self.store(ResourceFamily::Products);
        fetch_cached(store, self.config.product_ttl, &key, || async move {
            match self.gateway.store_get("products", &params).await {
                Ok(value) => match into_array(value) {
                    Ok(products) => Envelope::ok(&ProductsEnvelope {
                        success: true,
                        status: 200,
                        product_count: products.len(),
                        products,
                    }),
                    Err(err) => err.into_envelope(SOURCE, FETCH_PRODUCTS),
                },
                Err(err) => err.into_envelope(SOURCE, FETCH_PRODUCTS),
            }
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn categories(&self) -> ProxyResponse {
        if let Err(err) = self.gateway.ensure_credentials() {
            return ProxyResponse::uncached(err.into_envelope(SOURCE, FETCH_CATEGORIES));
        }

        let key = CacheKey::all_categories();
        let store = self.store(ResourceFamily::Categories);
        fetch_cached(store, self.config.category_ttl, &key, || async move {
            let query = [("per_page", COLLECTION_PAGE_SIZE.to_string())];
            match self.gateway.store_get("products/categories", &query).await {
                Ok(value) => match into_array(value) {
                    Ok(categories) => Envelope::ok(&CategoriesEnvelope {
                        success: true,
                        status: 200,
                        category_count: categories.len(),
                        categories,
                    }),
                    Err(err) => err.into_envelope(SOURCE, FETCH_CATEGORIES),
                },
                Err(err) => err.into_envelope(SOURCE, FETCH_CATEGORIES),
            }
        })
        .await
    }

    /// Variations of the product identified by the raw path segment.
    #[instrument(skip(self))]
    pub async fn variations(&self, product_id: &str) -> ProxyResponse {
        let product_id = match parse_id(product_id) {
            Ok(id) => id,
            Err(err) => {
                return ProxyResponse::uncached(err.into_envelope(SOURCE, FETCH_VARIATIONS));
            }
        };
        if let Err(err) = self.gateway.ensure_credentials() {
            return ProxyResponse::uncached(err.into_envelope(SOURCE, FETCH_VARIATIONS));
        }

        let key = CacheKey::variations(product_id);
        let store = self.store(ResourceFamily::Variations);
        fetch_cached(store, self.config.variation_ttl, &key, || async move {
            let path = format!("products/{product_id}/variations");
            let query = [("per_page", COLLECTION_PAGE_SIZE.to_string())];
            match self.gateway.store_get(&path, &query).await {
                Ok(value) => match into_array(value) {
                    Ok(variations) => Envelope::ok(&VariationsEnvelope {
                        success: true,
                        status: 200,
                        product_id,
                        variation_count: variations.len(),
                        variations,
                    }),
                    Err(err) => err.into_envelope(SOURCE, FETCH_VARIATIONS),
                },
                Err(err) => err.into_envelope(SOURCE, FETCH_VARIATIONS),
            }
        })
        .await
    }

    /// Write the new stock level upstream, then drop the cached product.
    #[instrument(skip_all)]
    pub async fn update_stock(&self, request: StockUpdateRequest) -> ProxyResponse {
        let envelope = match self.write_stock(request).await {
            Ok(envelope) => envelope,
            Err(err) => err.into_envelope(SOURCE, UPDATE_STOCK),
        };
        ProxyResponse::uncached(envelope)
    }

    async fn write_stock(&self, request: StockUpdateRequest) -> Result<Envelope, ProxyError> {
        let (Some(product_id), Some(stock_quantity)) =
            (request.product_id, request.stock_quantity)
        else {
            return Err(ProxyError::validation(
                "Product ID and stock quantity are required",
            ));
        };
        if product_id == 0 {
            return Err(ProxyError::validation("Invalid product ID"));
        }
        if stock_quantity < 0 {
            return Err(ProxyError::validation(
                "stock quantity must not be negative",
            ));
        }
        self.gateway.ensure_credentials()?;

        let product = self
            .gateway
            .store_send(
                Method::PUT,
                &format!("products/{product_id}"),
                json!({ "manage_stock": true, "stock_quantity": stock_quantity }),
            )
            .await?;

        if let Some(store) = self.store(ResourceFamily::Products) {
            store.invalidate(&CacheKey::product(product_id));
        }
        info!(product_id, stock_quantity, "stock updated");

        Ok(Envelope::ok(&StockUpdateEnvelope {
            success: true,
            product_id,
            stock_quantity: product.get("stock_quantity").and_then(Value::as_i64),
            stock_status: product
                .get("stock_status")
                .and_then(Value::as_str)
                .map(str::to_string),
        }))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn parse_id(raw: &str) -> Result<u64, ProxyError> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ProxyError::validation("Invalid product ID"))
}

fn into_array(value: Value) -> Result<Vec<Value>, ProxyError> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(ProxyError::decode(format!(
            "expected a JSON array, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
