//! clbscaled — KEDA external scaler daemon for Tencent Cloud CLB.
//!
//! Startup order:
//! - Tencent Cloud client
//! - Metric catalogs for both load balancer namespaces (fatal on failure)
//! - Health probe server
//! - gRPC external scaler server, marked ready once bound
//!
//! # Usage
//!
//! ```text
//! clbscaled --region ap-guangzhou --secret-id AKID... --secret-key ...
//! ```

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use clbscale_core::{Catalogs, QueryBuilder, ResourceCache};
use clbscale_scaler::ScalerService;
use clbscale_tencent::{Credential, TencentCloudClient};
use clbscaled::{Config, Readiness, build_router};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_stream::wrappers::TcpListenerStream;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info,clbscaled=debug,clbscale=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_tracing(config.log_json);

    info!(region = %config.region, "clbscaled starting");

    // ── Cloud client ───────────────────────────────────────────

    let mut credential = Credential::new(&config.secret_id, &config.secret_key);
    if let Some(token) = &config.session_token {
        credential = credential.with_token(token);
    }
    let client = Arc::new(
        TencentCloudClient::new(
            credential,
            &config.region,
            &config.api_endpoint_suffix,
            config.api_timeout(),
        )
        .context("failed to create cloud client")?,
    );

    // ── Metric catalogs ────────────────────────────────────────

    let catalogs = Catalogs::build(client.as_ref(), config.catalog_timeout())
        .await
        .context("failed to build metric catalogs")?;
    let queries = QueryBuilder::new(
        Arc::new(ResourceCache::new(client.clone())),
        Arc::new(catalogs),
    );
    let service = ScalerService::new(client, queries);

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    // ── Health probe server ────────────────────────────────────

    let readiness = Readiness::new();
    let health_listener = TcpListener::bind(config.health_probe_bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.health_probe_bind_address))?;
    info!(addr = %config.health_probe_bind_address, "health probe server starting");

    let health_readiness = readiness.clone();
    let health_shutdown = shutdown_rx.clone();
    let health_handle = tokio::spawn(async move {
        axum::serve(health_listener, build_router(health_readiness))
            .with_graceful_shutdown(wait_for(health_shutdown))
            .await
    });

    // ── gRPC server ────────────────────────────────────────────

    let grpc_listener = TcpListener::bind(config.metrics_service_bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.metrics_service_bind_address))?;
    info!(addr = %config.metrics_service_bind_address, "gRPC scaler server starting");
    readiness.set_ready();

    tonic::transport::Server::builder()
        .add_service(service.into_service())
        .serve_with_incoming_shutdown(
            TcpListenerStream::new(grpc_listener),
            wait_for(shutdown_rx),
        )
        .await
        .context("gRPC server failed")?;

    health_handle
        .await
        .context("health probe server panicked")?
        .context("health probe server failed")?;

    info!("clbscaled stopped");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn wait_for(mut shutdown: watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
