// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::Result;
use clap::Parser;
use kube::Client;
use kube_route53_dns::{
    aws::{load_sdk_config, ElbProvider, Route53Provider},
    cluster::KubeCluster,
    config::{Cli, SyncConfig},
    constants::RUNTIME_THREAD_NAME,
    dns_errors::StartupError,
    reconciler::Reconciler,
    server,
};
use std::future::Future;
use tracing::{debug, info};

fn main() -> Result<()> {
    // Cycles run sequentially, so a single-threaded runtime is enough
    let runtime = tokio::runtime::Builder::new_current_thread()
        .thread_name(RUNTIME_THREAD_NAME)
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

async fn async_main() -> Result<()> {
    // Initialize logging with custom format
    // Format: timestamp file:line LEVEL message
    //
    // Respects RUST_LOG environment variable if set, otherwise defaults to INFO level
    // Respects RUST_LOG_FORMAT environment variable for output format (json or text)
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    let cli = Cli::parse();
    let config = SyncConfig::from_cli(&cli)?;

    info!(
        record_type = %config.record_defaults.record_type,
        ttl = config.record_defaults.ttl,
        dry_run = config.dry_run,
        service_selector = %config.service_selector,
        ingress_service_selector = %config.ingress_service_selector,
        existence_check = config.existence_check,
        "Starting Route53 DNS controller"
    );

    debug!("Initializing Kubernetes client");
    let client = Client::try_default().await.map_err(StartupError::from)?;
    debug!("Kubernetes client initialized successfully");

    debug!("Loading AWS configuration");
    let sdk_config = load_sdk_config(cli.region.as_deref()).await?;
    info!(
        "Using AWS region {}",
        sdk_config
            .region()
            .map(ToString::to_string)
            .unwrap_or_default()
    );

    if let Some(addr) = cli.metrics_addr {
        let listener = server::bind(addr).await?;
        tokio::spawn(server::serve(listener));
    }

    let reconciler = Reconciler::new(
        KubeCluster::new(client),
        Route53Provider::new(&sdk_config),
        ElbProvider::new(&sdk_config),
        config,
    );

    reconciler.run(shutdown_signal()?).await;

    info!("Route53 DNS controller stopped");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
///
/// The SIGTERM handler is installed before the first cycle so a termination
/// request during that cycle is not lost.
#[cfg(unix)]
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;

    Ok(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("Received SIGINT"),
            _ = sigterm.recv() => info!("Received SIGTERM"),
        }
    })
}

/// Resolves on Ctrl+C.
#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    Ok(async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received Ctrl+C");
    })
}
