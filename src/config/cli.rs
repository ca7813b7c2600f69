use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use url::Url;

/// Command-line arguments for the storegate binary.
#[derive(Debug, Parser)]
#[command(name = "storegate", version, about = "Caching storefront proxy")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "STOREGATE_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the proxy HTTP service.
    Serve(Box<ServeArgs>),
    /// Resolve and validate configuration, print a redacted summary, then exit.
    #[command(name = "check-config")]
    CheckConfig,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the WooCommerce store base URL.
    #[arg(long = "upstream-store-url", value_name = "URL")]
    pub upstream_store_url: Option<Url>,

    /// Override the WordPress JWT endpoint base URL.
    #[arg(long = "upstream-jwt-base-url", value_name = "URL")]
    pub upstream_jwt_base_url: Option<Url>,

    /// Override the per-request upstream timeout.
    #[arg(long = "upstream-timeout-seconds", value_name = "SECONDS")]
    pub upstream_timeout_seconds: Option<u64>,

    /// Enable or disable response caching.
    #[arg(
        long = "cache-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub cache_enabled: Option<bool>,

    /// Override the per-family cache capacity.
    #[arg(long = "cache-capacity", value_name = "ENTRIES")]
    pub cache_capacity: Option<u64>,

    /// Override the document directory.
    #[arg(long = "documents-directory", value_name = "PATH")]
    pub documents_directory: Option<PathBuf>,
}
