use std::sync::Arc;

use axum::http::Method;
use serde_json::Value;
use storegate_api_types::CustomerEnvelope;
use tracing::instrument;

use super::envelope::Envelope;
use super::error::ProxyError;
use super::gateway::StoreGateway;

const SOURCE: &str = "application::customers";

const FETCH_CUSTOMER: &str = "Failed to fetch customer";
const UPDATE_CUSTOMER: &str = "Failed to update customer";

/// Uncached passthrough for WooCommerce customer records.
pub struct CustomerService {
    gateway: Arc<StoreGateway>,
}

impl CustomerService {
    pub fn new(gateway: Arc<StoreGateway>) -> Self {
        Self { gateway }
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Envelope {
        let result = async {
            let id = parse_customer_id(id)?;
            self.gateway
                .store_get(&format!("customers/{id}"), &[])
                .await
        }
        .await;
        respond(result, FETCH_CUSTOMER)
    }

    /// Forward a partial customer update. The body must be a JSON object.
    #[instrument(skip(self, changes))]
    pub async fn update(&self, id: &str, changes: Value) -> Envelope {
        let result = async {
            let id = parse_customer_id(id)?;
            if !changes.is_object() {
                return Err(ProxyError::validation("Customer update must be a JSON object"));
            }
            self.gateway
                .store_send(Method::PUT, &format!("customers/{id}"), changes)
                .await
        }
        .await;
        respond(result, UPDATE_CUSTOMER)
    }
}

fn parse_customer_id(raw: &str) -> Result<u64, ProxyError> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ProxyError::validation("Invalid customer ID"))
}

fn respond(result: Result<Value, ProxyError>, action: &str) -> Envelope {
    match result {
        Ok(customer) => Envelope::ok(&CustomerEnvelope {
            success: true,
            customer,
        }),
        Err(err) => err.into_envelope(SOURCE, action),
    }
}
