use std::net::SocketAddr;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use media_gateway::config::GatewayConfig;
use media_gateway::observability::init_tracing;
use media_gateway::web::{create_router, AppState};

#[derive(Parser)]
#[command(name = "media-gateway")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Media access gateway: extracts and brokers delivery of social-media content")]
struct Cli {
    /// Configuration file path (TOML); compiled-in defaults apply if omitted
    #[arg(short, long)]
    config: Option<String>,

    /// Listening IP address (overrides config file)
    #[arg(short = 'H', long, value_name = "IP")]
    host: Option<String>,

    /// Listening port (overrides config file)
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Log level (overrides config file unless RUST_LOG is set)
    #[arg(short = 'l', long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = GatewayConfig::load(cli.config.as_deref().map(std::path::Path::new))?;

    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(log_level) = cli.log_level {
        config.server.log_level = log_level;
    }

    init_tracing(&config.server.log_level, config.server.log_json);
    info!("starting media gateway v{}", env!("CARGO_PKG_VERSION"));

    let host = config.server.host.clone();
    let port = config.server.port;

    let state = AppState::new(config)?;
    state.registry.clone().spawn_sweeper(std::time::Duration::from_secs(60));

    let router = create_router(state);

    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {addr}");

    axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
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
