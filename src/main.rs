use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dirserve::{AppState, Config, build_router, store};

#[derive(Parser, Debug)]
#[command(name = "dirserve")]
#[command(about = "Small HTTP resource API over a host directory tree")]
#[command(version)]
struct Cli {
    /// Port to listen on
    #[arg(short, long, env = "DIRSERVE_PORT", default_value = "8080")]
    port: u16,

    /// Address to bind to
    #[arg(short, long, env = "DIRSERVE_BIND", default_value = "0.0.0.0")]
    bind: String,

    /// Directory whose contents the file API exposes (created if missing)
    #[arg(short, long, env = "DIRSERVE_DATA", default_value = "data")]
    data: PathBuf,

    /// Directory with the client bundle to serve next to the API
    #[arg(long, env = "DIRSERVE_PUBLIC")]
    public: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, env = "DIRSERVE_VERBOSE")]
    verbose: bool,

    /// Config file path (optional)
    #[arg(short, long, env = "DIRSERVE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "dirserve=debug,tower_http=debug"
    } else {
        "dirserve=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        Config::default()
    };
    if cli.public.is_some() {
        config.public_dir = cli.public;
    }

    let root_dir = store::prepare_root(&cli.data)?;
    info!("Serving files from: {}", root_dir.display());
    info!("File API mounted at: {}", config.mount_path());
    if let Some(public_dir) = &config.public_dir {
        info!("Serving client bundle from: {}", public_dir.display());
    }

    let app = build_router(AppState::with_config(root_dir, config));

    let addr: SocketAddr = format!("{}:{}", cli.bind, cli.port).parse()?;
    info!("Starting dirserve on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
