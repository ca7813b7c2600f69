//! Login, registration and token validation passthrough.
//!
//! Nothing here is cached. Credentials are forwarded to the WordPress JWT
//! endpoint (login, validate) or to WooCommerce (register) and the answer is
//! reshaped for the storefront.

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use storegate_api_types::{
    AuthUser, CustomerSummary, ErrorEnvelope, LoginEnvelope, LoginRequest, RegisterEnvelope,
    RegisterRequest, ValidateEnvelope, ValidateRequest,
};
use tracing::{info, instrument};

use super::envelope::Envelope;
use super::error::{ErrorReport, ProxyError};
use super::gateway::StoreGateway;
use super::upstream::{UpstreamRequest, UpstreamTarget};

const SOURCE: &str = "application::auth";

const LOGIN_FAILED: &str = "Authentication failed";
const REGISTER_FAILED: &str = "Registration failed";
const INVALID_TOKEN: &str = "Invalid token";

/// Successful answer of the JWT token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
    #[serde(default)]
    user_email: String,
    #[serde(default)]
    user_nicename: String,
    #[serde(default)]
    user_display_name: String,
}

#[derive(Debug, Deserialize)]
struct CreatedCustomer {
    id: u64,
    #[serde(default)]
    email: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
}

pub struct AuthService {
    gateway: Arc<StoreGateway>,
}

impl AuthService {
    pub fn new(gateway: Arc<StoreGateway>) -> Self {
        Self { gateway }
    }

    #[instrument(skip_all)]
    pub async fn login(&self, request: LoginRequest) -> Envelope {
        let (Some(email), Some(password)) = (
            present(request.email.as_deref()),
            present(request.password.as_deref()),
        ) else {
            return ProxyError::validation("Email and password are required")
                .into_envelope(SOURCE, LOGIN_FAILED);
        };

        let url = match self.gateway.identity_url("token") {
            Ok(url) => url,
            Err(err) => return err.into_envelope(SOURCE, LOGIN_FAILED),
        };
        let request = UpstreamRequest::new(UpstreamTarget::Identity, Method::POST, url)
            .with_json(json!({ "username": email, "password": password }));

        let value = match self.gateway.call_json(request).await {
            Ok(value) => value,
            Err(ProxyError::UpstreamStatus { status, body }) => {
                let status = if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
                {
                    StatusCode::UNAUTHORIZED
                } else {
                    status
                };
                return rejection(status, upstream_message(&body, LOGIN_FAILED));
            }
            Err(err) => return err.into_envelope(SOURCE, LOGIN_FAILED),
        };

        match serde_json::from_value::<TokenResponse>(value) {
            Ok(token) => {
                info!("login succeeded");
                Envelope::ok(&LoginEnvelope {
                    success: true,
                    token: token.token,
                    user: AuthUser {
                        email: token.user_email,
                        nicename: token.user_nicename,
                        display_name: token.user_display_name,
                    },
                })
            }
            Err(err) => ProxyError::decode(err.to_string()).into_envelope(SOURCE, LOGIN_FAILED),
        }
    }

    /// Create a WooCommerce customer. The email doubles as the username.
    #[instrument(skip_all)]
    pub async fn register(&self, request: RegisterRequest) -> Envelope {
        let (Some(email), Some(password)) = (
            present(request.email.as_deref()),
            present(request.password.as_deref()),
        ) else {
            return ProxyError::validation("Email and password are required")
                .into_envelope(SOURCE, REGISTER_FAILED);
        };

        let body = json!({
            "email": email,
            "password": password,
            "first_name": request.first_name.as_deref().unwrap_or_default(),
            "last_name": request.last_name.as_deref().unwrap_or_default(),
            "username": email,
        });

        let value = match self.gateway.store_send(Method::POST, "customers", body).await {
            Ok(value) => value,
            Err(ProxyError::UpstreamStatus { status, body }) => {
                return rejection(status, upstream_message(&body, REGISTER_FAILED));
            }
            Err(err) => return err.into_envelope(SOURCE, REGISTER_FAILED),
        };

        match serde_json::from_value::<CreatedCustomer>(value) {
            Ok(customer) => {
                info!(customer_id = customer.id, "customer registered");
                Envelope::json(
                    StatusCode::CREATED,
                    &RegisterEnvelope {
                        success: true,
                        customer: CustomerSummary {
                            id: customer.id,
                            email: customer.email,
                            first_name: customer.first_name,
                            last_name: customer.last_name,
                        },
                    },
                )
            }
            Err(err) => {
                ProxyError::decode(err.to_string()).into_envelope(SOURCE, REGISTER_FAILED)
            }
        }
    }

    /// Check a JWT with the identity service. Any upstream rejection is a 401.
    #[instrument(skip_all)]
    pub async fn validate(&self, request: ValidateRequest) -> Envelope {
        let Some(token) = present(request.token.as_deref()) else {
            return invalid(StatusCode::BAD_REQUEST, "Token is required");
        };

        let url = match self.gateway.identity_url("token/validate") {
            Ok(url) => url,
            Err(err) => return invalid(err.status(), INVALID_TOKEN),
        };
        let request =
            UpstreamRequest::new(UpstreamTarget::Identity, Method::POST, url).with_bearer(token);

        match self.gateway.call_json(request).await {
            Ok(mut value) => {
                let data = match value.get_mut("data").map(Value::take) {
                    Some(data) if !data.is_null() => data,
                    _ => value,
                };
                Envelope::ok(&ValidateEnvelope {
                    valid: true,
                    data: Some(data),
                    error: None,
                })
            }
            Err(ProxyError::UpstreamStatus { body, .. }) => invalid(
                StatusCode::UNAUTHORIZED,
                &upstream_message(&body, INVALID_TOKEN),
            ),
            Err(err) => {
                let status = err.status();
                let report = ErrorReport::from_error(SOURCE, status, &err);
                invalid(status, "Token validation failed").with_report(report)
            }
        }
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

fn rejection(status: StatusCode, message: String) -> Envelope {
    let report = ErrorReport::from_message(SOURCE, status, message.clone());
    Envelope::error(status, ErrorEnvelope::new(message)).with_report(report)
}

fn invalid(status: StatusCode, message: &str) -> Envelope {
    Envelope::json(
        status,
        &ValidateEnvelope {
            valid: false,
            data: None,
            error: Some(message.to_string()),
        },
    )
}

/// The `message` field of a JSON error body with markup removed, or `fallback`.
pub fn upstream_message(body: &str, fallback: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .as_ref()
        .and_then(|value| value.get("message"))
        .and_then(Value::as_str)
        .map(strip_tags)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// Drop `<...>` markup and collapse whitespace.
pub fn strip_tags(input: &str) -> String {
    let mut text = String::with_capacity(input.len());
    let mut in_tag = false;
    for ch in input.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                text.push(' ');
            }
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
