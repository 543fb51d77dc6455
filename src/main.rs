// src/main.rs
use anyhow::Result;
use std::net::SocketAddr;
use tokio::signal;
use tracing::info;

mod body;
mod check;
mod condition;
mod endpoint;
mod probes;
mod route;
mod server;
mod status;

use crate::{
    check::Check,
    condition::Condition,
    endpoint::HealthEndpoint,
    server::{HealthService, ServerBuilder},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("health_endpoint=debug".parse()?)
                .add_directive("hyper=info".parse()?),
        )
        .init();

    let addr: SocketAddr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "0.0.0.0:8080".to_string())
        .parse()?;

    // Demo wiring: two in-process conditions plus the service's own version.
    let endpoint = HealthEndpoint::builder()
        .condition(
            Condition::new("redis:connection")
                .call(|| async { Ok(Check::new().with_status("pass")) }),
        )
        .condition(
            Condition::new("postgres:connection")
                .blocking_call(|| Ok(Check::new().with_status("pass"))),
        )
        .allow_version(true)
        .service_version(env!("CARGO_PKG_VERSION"))
        .build()?;

    info!("starting health endpoint on {}", addr);

    let server = ServerBuilder::new(addr).with_handler(HealthService::new(endpoint));

    tokio::select! {
        result = server.serve() => result?,
        _ = shutdown_signal() => {}
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
