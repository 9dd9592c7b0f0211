//! hookpipe server
//!
//! Loads a declarative endpoint configuration, registers the built-in
//! actions, and serves the webhook receiver until interrupted.
//!
//! # Usage
//!
//! ```bash
//! hookpipe --config hookpipe.json --listen 0.0.0.0:9001
//!
//! # with a Prometheus scrape endpoint
//! hookpipe --config hookpipe.json --metrics-addr 0.0.0.0:9090
//! ```
//!
//! Any configuration error — an unknown action name, a duplicate
//! registration, an invalid pattern — aborts startup before the listener
//! is bound.

mod config;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Parser;
use hookpipe_core::ActionRegistry;
use hookpipe_web::Endpoint;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;

/// Configuration-driven webhook receiver.
#[derive(Debug, Parser)]
#[command(name = "hookpipe", version, about)]
struct Args {
    /// Path to the endpoint configuration file.
    #[arg(long, default_value = "hookpipe.json")]
    config: PathBuf,

    /// Address to serve webhooks on.
    #[arg(long, default_value = "0.0.0.0:9001")]
    listen: SocketAddr,

    /// Address to expose Prometheus metrics on. Disabled when absent.
    #[arg(long)]
    metrics_addr: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,hookpipe=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = ServerConfig::load(&args.config)?;
    tracing::info!(
        config = %args.config.display(),
        endpoints = config.endpoints.len(),
        "configuration loaded"
    );

    let mut registry = ActionRegistry::new();
    hookpipe_actions::register_builtin_actions(&mut registry)?;
    tracing::debug!(actions = ?registry.known_names(), "built-in actions registered");

    let mut endpoints = Vec::with_capacity(config.endpoints.len());
    for declaration in &config.endpoints {
        endpoints.push(Endpoint::from_config(declaration, &registry)?);
    }

    hookpipe_web::register_metrics();
    if let Some(addr) = args.metrics_addr {
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("failed to install the Prometheus exporter")?;
        tracing::info!(%addr, "metrics exporter listening");
    }

    let router = hookpipe_web::build_router(endpoints)?;

    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("failed to bind {}", args.listen))?;
    tracing::info!(addr = %args.listen, "hookpipe is accepting webhooks");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;

    Ok(())
}
