use std::{process, sync::Arc};

use storegate::{
    application::error::AppError,
    cache::SystemClock,
    config::{self, Settings},
    infra::{
        error::InfraError,
        http::{self, AppState},
        telemetry,
        upstream::HttpUpstream,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    match command {
        config::Command::Serve(_) => {
            telemetry::init(&settings.logging).map_err(AppError::from)?;
            run_serve(settings).await
        }
        config::Command::CheckConfig => {
            print_config_summary(&settings);
            Ok(())
        }
    }
}

async fn run_serve(settings: Settings) -> Result<(), AppError> {
    if !settings.upstream.has_credentials() {
        tracing::warn!("store credentials are not configured; catalog routes will answer 500");
    }

    let upstream = Arc::new(HttpUpstream::new(settings.upstream.timeout)?);
    let state = AppState::from_settings(&settings, upstream, Arc::new(SystemClock));
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        addr = %settings.server.addr,
        store = %settings.upstream.store_url,
        cache_enabled = settings.cache.enabled,
        "storegate listening"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    info!("storegate stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
    }
}

fn print_config_summary(settings: &Settings) {
    let upstream = &settings.upstream;
    let cache = &settings.cache;
    println!("server.addr            = {}", settings.server.addr);
    println!("logging.level          = {}", settings.logging.level);
    println!("upstream.store_url     = {}", upstream.store_url);
    println!("upstream.jwt_base_url  = {}", upstream.jwt_base_url);
    println!("upstream.api_prefix    = {}", upstream.api_prefix);
    println!(
        "upstream.credentials   = {}",
        if upstream.has_credentials() { "set" } else { "missing" }
    );
    println!("upstream.timeout       = {}s", upstream.timeout.as_secs());
    println!("cache.enabled          = {}", cache.enabled);
    println!("cache.capacity         = {}", cache.capacity);
    println!("cache.product_ttl      = {}s", cache.product_ttl.as_secs());
    println!("cache.category_ttl     = {}s", cache.category_ttl.as_secs());
    println!("cache.variation_ttl    = {}s", cache.variation_ttl.as_secs());
    println!("cache.failure_ttl      = {}s", cache.failure_ttl.as_secs());
    match settings.documents.base_url.as_ref() {
        Some(base) => println!("documents.source       = {base}"),
        None => println!(
            "documents.source       = {}",
            settings.documents.directory.display()
        ),
    }
}
