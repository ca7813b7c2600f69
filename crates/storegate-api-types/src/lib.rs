//! Wire types for the storegate storefront proxy.
//!
//! Response envelopes use camelCase field names because the storefront UI
//! consumes them directly. Request bodies keep every field optional so the
//! proxy can answer a missing field with its own 400 envelope instead of a
//! deserializer rejection.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error envelope returned for every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

// -------- Catalog --------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductsEnvelope {
    pub success: bool,
    pub status: u16,
    pub products: Vec<Value>,
    pub product_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductEnvelope {
    pub success: bool,
    pub status: u16,
    pub product: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoriesEnvelope {
    pub success: bool,
    pub status: u16,
    pub categories: Vec<Value>,
    pub category_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariationsEnvelope {
    pub success: bool,
    pub status: u16,
    pub product_id: u64,
    pub variations: Vec<Value>,
    pub variation_count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockUpdateRequest {
    pub product_id: Option<u64>,
    pub stock_quantity: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockUpdateEnvelope {
    pub success: bool,
    pub product_id: u64,
    pub stock_quantity: Option<i64>,
    pub stock_status: Option<String>,
}

// -------- Auth --------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidateRequest {
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub email: String,
    pub nicename: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginEnvelope {
    pub success: bool,
    pub token: String,
    pub user: AuthUser,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    pub id: u64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterEnvelope {
    pub success: bool,
    pub customer: CustomerSummary,
}

/// Token validation result. Always serialized with `valid`; `data` is set on
/// success and `error` on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateEnvelope {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// -------- Customers --------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerEnvelope {
    pub success: bool,
    pub customer: Value,
}
