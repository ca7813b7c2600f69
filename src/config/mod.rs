//! Configuration layer: typed settings with layered precedence
//! (file → `STOREGATE__*` env → legacy env names → CLI).

mod cli;

use std::{
    fmt,
    net::SocketAddr,
    num::NonZeroUsize,
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

pub use cli::{CliArgs, Command, ServeArgs, ServeOverrides};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "storegate";
const ENV_PREFIX: &str = "STOREGATE";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_STORE_URL: &str = "https://cms.storegate.local";
const DEFAULT_API_PREFIX: &str = "wc/v3";
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CACHE_CAPACITY: u64 = 512;
const DEFAULT_PRODUCT_TTL_SECS: u64 = 10 * 60;
const DEFAULT_CATEGORY_TTL_SECS: u64 = 15 * 60;
const DEFAULT_VARIATION_TTL_SECS: u64 = 10 * 60;
const DEFAULT_DOCUMENTS_DIR: &str = "documents";
const DEFAULT_DOCUMENTS_MAX_AGE_SECS: u64 = 60 * 60;

/// Environment names honoured when the layered settings leave a value unset,
/// checked in order.
const LEGACY_STORE_URL: &[&str] = &[
    "WOOCOMMERCE_URL",
    "NEXT_PUBLIC_WOOCOMMERCE_URL",
    "WORDPRESS_URL",
];
const LEGACY_CONSUMER_KEY: &[&str] = &["WOOCOMMERCE_CONSUMER_KEY", "WC_CONSUMER_KEY"];
const LEGACY_CONSUMER_SECRET: &[&str] = &["WOOCOMMERCE_CONSUMER_SECRET", "WC_CONSUMER_SECRET"];
const LEGACY_JWT_BASE_URL: &[&str] = &["WORDPRESS_JWT_URL", "NEXT_PUBLIC_WORDPRESS_URL"];

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub upstream: UpstreamSettings,
    pub cache: CacheSettings,
    pub documents: DocumentSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Clone)]
pub struct UpstreamSettings {
    pub store_url: Url,
    pub jwt_base_url: Url,
    pub api_prefix: String,
    pub consumer_key: Option<String>,
    pub consumer_secret: Option<String>,
    pub timeout: Duration,
}

impl UpstreamSettings {
    pub fn has_credentials(&self) -> bool {
        self.consumer_key.is_some() && self.consumer_secret.is_some()
    }
}

impl fmt::Debug for UpstreamSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamSettings")
            .field("store_url", &self.store_url.as_str())
            .field("jwt_base_url", &self.jwt_base_url.as_str())
            .field("api_prefix", &self.api_prefix)
            .field("consumer_key", &self.consumer_key)
            .field(
                "consumer_secret",
                &self.consumer_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub enabled: bool,
    pub capacity: NonZeroUsize,
    pub product_ttl: Duration,
    pub category_ttl: Duration,
    pub variation_ttl: Duration,
    /// Zero disables failure caching.
    pub failure_ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct DocumentSettings {
    pub directory: PathBuf,
    /// When set, documents are fetched from this base URL instead of `directory`.
    pub base_url: Option<Url>,
    pub max_age: Duration,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence.
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    load_with_env(cli, |name| std::env::var(name).ok())
}

fn load_with_env(
    cli: &CliArgs,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_legacy_env(lookup);

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::CheckConfig) | None => {}
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    upstream: RawUpstreamSettings,
    cache: RawCacheSettings,
    documents: RawDocumentSettings,
}

impl RawSettings {
    /// Fill upstream values the layered sources left unset from the legacy
    /// variable names. Blank values are ignored.
    fn apply_legacy_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let first_set = |names: &[&str]| {
            names
                .iter()
                .filter_map(|name| lookup(*name))
                .map(|value| value.trim().to_string())
                .find(|value| !value.is_empty())
        };

        let upstream = &mut self.upstream;
        if blank(&upstream.store_url) {
            upstream.store_url = first_set(LEGACY_STORE_URL);
        }
        if blank(&upstream.consumer_key) {
            upstream.consumer_key = first_set(LEGACY_CONSUMER_KEY);
        }
        if blank(&upstream.consumer_secret) {
            upstream.consumer_secret = first_set(LEGACY_CONSUMER_SECRET);
        }
        if blank(&upstream.jwt_base_url) {
            upstream.jwt_base_url = first_set(LEGACY_JWT_BASE_URL);
        }
    }

    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.upstream_store_url.as_ref() {
            self.upstream.store_url = Some(url.to_string());
        }
        if let Some(url) = overrides.upstream_jwt_base_url.as_ref() {
            self.upstream.jwt_base_url = Some(url.to_string());
        }
        if let Some(seconds) = overrides.upstream_timeout_seconds {
            self.upstream.timeout_seconds = Some(seconds);
        }
        if let Some(enabled) = overrides.cache_enabled {
            self.cache.enabled = Some(enabled);
        }
        if let Some(capacity) = overrides.cache_capacity {
            self.cache.capacity = Some(capacity);
        }
        if let Some(directory) = overrides.documents_directory.as_ref() {
            self.documents.directory = Some(directory.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            upstream,
            cache,
            documents,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            upstream: build_upstream_settings(upstream)?,
            cache: build_cache_settings(cache)?,
            documents: build_document_settings(documents)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    Ok(ServerSettings { addr })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_upstream_settings(upstream: RawUpstreamSettings) -> Result<UpstreamSettings, LoadError> {
    let store_url = match trimmed(upstream.store_url) {
        Some(value) => parse_http_url(&value, "upstream.store_url")?,
        None => parse_http_url(DEFAULT_STORE_URL, "upstream.store_url")?,
    };
    let jwt_base_url = match trimmed(upstream.jwt_base_url) {
        Some(value) => parse_http_url(&value, "upstream.jwt_base_url")?,
        None => store_url.clone(),
    };

    let api_prefix = trimmed(upstream.api_prefix)
        .map(|prefix| prefix.trim_matches('/').to_string())
        .unwrap_or_else(|| DEFAULT_API_PREFIX.to_string());
    if api_prefix.is_empty() {
        return Err(LoadError::invalid(
            "upstream.api_prefix",
            "must not be empty",
        ));
    }

    let timeout_secs = upstream
        .timeout_seconds
        .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_SECS);
    let timeout = non_zero_secs(timeout_secs, "upstream.timeout_seconds")?;

    Ok(UpstreamSettings {
        store_url,
        jwt_base_url,
        api_prefix,
        consumer_key: trimmed(upstream.consumer_key),
        consumer_secret: trimmed(upstream.consumer_secret),
        timeout,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let capacity = cache.capacity.unwrap_or(DEFAULT_CACHE_CAPACITY);
    let capacity = usize::try_from(capacity)
        .ok()
        .and_then(NonZeroUsize::new)
        .ok_or_else(|| {
            LoadError::invalid("cache.capacity", "must be greater than zero and fit in usize")
        })?;

    Ok(CacheSettings {
        enabled: cache.enabled.unwrap_or(true),
        capacity,
        product_ttl: non_zero_secs(
            cache.product_ttl_seconds.unwrap_or(DEFAULT_PRODUCT_TTL_SECS),
            "cache.product_ttl_seconds",
        )?,
        category_ttl: non_zero_secs(
            cache
                .category_ttl_seconds
                .unwrap_or(DEFAULT_CATEGORY_TTL_SECS),
            "cache.category_ttl_seconds",
        )?,
        variation_ttl: non_zero_secs(
            cache
                .variation_ttl_seconds
                .unwrap_or(DEFAULT_VARIATION_TTL_SECS),
            "cache.variation_ttl_seconds",
        )?,
        failure_ttl: Duration::from_secs(cache.failure_ttl_seconds.unwrap_or(0)),
    })
}

fn build_document_settings(documents: RawDocumentSettings) -> Result<DocumentSettings, LoadError> {
    let directory = documents
        .directory
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DOCUMENTS_DIR));
    if directory.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "documents.directory",
            "path must not be empty",
        ));
    }

    let base_url = trimmed(documents.base_url)
        .map(|value| parse_http_url(&value, "documents.base_url"))
        .transpose()?;

    let max_age = Duration::from_secs(
        documents
            .max_age_seconds
            .unwrap_or(DEFAULT_DOCUMENTS_MAX_AGE_SECS),
    );

    Ok(DocumentSettings {
        directory,
        base_url,
        max_age,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Clone, Deserialize, Default)]
#[serde(default)]
struct RawUpstreamSettings {
    store_url: Option<String>,
    consumer_key: Option<String>,
    consumer_secret: Option<String>,
    jwt_base_url: Option<String>,
    api_prefix: Option<String>,
    timeout_seconds: Option<u64>,
}

impl fmt::Debug for RawUpstreamSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawUpstreamSettings")
            .field("store_url", &self.store_url)
            .field("consumer_key", &self.consumer_key)
            .field(
                "consumer_secret",
                &self.consumer_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("jwt_base_url", &self.jwt_base_url)
            .field("api_prefix", &self.api_prefix)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    enabled: Option<bool>,
    capacity: Option<u64>,
    product_ttl_seconds: Option<u64>,
    category_ttl_seconds: Option<u64>,
    variation_ttl_seconds: Option<u64>,
    failure_ttl_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDocumentSettings {
    directory: Option<PathBuf>,
    base_url: Option<String>,
    max_age_seconds: Option<u64>,
}

fn blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|value| value.trim().is_empty())
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn parse_http_url(value: &str, key: &'static str) -> Result<Url, LoadError> {
    let url = Url::parse(value)
        .map_err(|err| LoadError::invalid(key, format!("invalid url `{value}`: {err}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(LoadError::invalid(
            key,
            format!("unsupported scheme `{scheme}`, expected http or https"),
        )),
    }
}

fn non_zero_secs(value: u64, key: &'static str) -> Result<Duration, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(Duration::from_secs(value))
}
