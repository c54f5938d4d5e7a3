use anyhow::{Context, Result};
use clap::Parser;
use mock_gateway::{serve, GatewayConfig};
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "mock-gateway")]
#[command(about = "Local rate-limited endpoint (token bucket) for exercising rate-probe")]
struct Args {
    /// Optional TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen address (overrides config)
    #[arg(long)]
    bind: Option<String>,

    /// Endpoint path (overrides config)
    #[arg(long)]
    route: Option<String>,

    /// Steady-state requests per second (overrides config)
    #[arg(long)]
    rate: Option<u64>,

    /// Burst capacity (overrides config)
    #[arg(long)]
    burst: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => GatewayConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => GatewayConfig::default(),
    };

    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    if let Some(route) = args.route {
        config.route = route;
    }
    if let Some(rate) = args.rate {
        config.rate_per_sec = rate;
    }
    if let Some(burst) = args.burst {
        config.burst = burst;
    }
    config.validate()?;

    let listener = TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;

    info!(
        "Mock gateway listening on http://{}{} (rate={}/s, burst={})",
        listener.local_addr()?,
        config.route,
        config.rate_per_sec,
        config.burst
    );

    serve(listener, config, shutdown_signal()).await?;

    info!("Mock gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
}
