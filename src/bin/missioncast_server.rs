//! missioncast gRPC Server
//!
//! A standalone server binary exposing the prediction service over gRPC.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tonic::transport::Server;
use tracing::info;

use missioncast::config::ForecastConfig;
use missioncast::service::ForecastService;
use missioncast::telemetry::init_tracing;
use missioncast::transport::MissionForecastServiceImpl;

/// Mission risk and energy prediction server.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:50051")]
    addr: SocketAddr,

    /// TOML configuration file; compiled defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, default_value_t = false)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.log_json)?;

    let config = match &cli.config {
        Some(path) => {
            info!(path = %path.display(), "loading configuration");
            ForecastConfig::load(path)?
        }
        None => ForecastConfig::from_env()?,
    };

    let service = Arc::new(ForecastService::new(config)?);
    let svc = MissionForecastServiceImpl::new(service).into_server();

    info!(version = env!("CARGO_PKG_VERSION"), addr = %cli.addr, "starting gRPC server");

    Server::builder()
        .add_service(svc)
        .serve_with_shutdown(cli.addr, async {
            let _ = signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .await?;

    info!("shut down");
    Ok(())
}
