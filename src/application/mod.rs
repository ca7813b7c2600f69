//! Application services: envelope construction, the upstream call wrapper
//! and the catalog, auth, customer and document services built on it.

pub mod auth;
pub mod catalog;
pub mod customers;
pub mod documents;
pub mod envelope;
pub mod error;
pub mod gateway;
pub mod proxy;
pub mod upstream;

pub(crate) use gateway::METRIC_UPSTREAM_REQUEST_MS;
