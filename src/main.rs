//! Omny HTTP/1.1 router.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ net::Listener ──▶ http::server ──▶ Router::dispatch
//!                                                          │
//!                                       handlers (HIGH → DEFAULT → LOW)
//!                                                          │
//!                                       route table ──▶ route ──▶ view
//!                                                          │
//!     Client Response ◀──────────────── http::Response ◀───┘
//!
//!     Cross-cutting: config (+ watcher), observability, lifecycle
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::sync::mpsc;

use omny::config::{load_config, ConfigWatcher, OmnyConfig, StaticFilesConfig};
use omny::handlers::StaticPolicy;
use omny::lifecycle::{shutdown_signal, Shutdown};
use omny::net::Listener;
use omny::observability::{logging, metrics};
use omny::{HttpServer, Router};

#[derive(Parser, Debug, Clone)]
#[command(name = "omny")]
#[command(about = "Minimal HTTP/1.1 router", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Serve a directory of static files, loaded at startup.
    #[arg(short = 's', long = "static")]
    static_dir: Option<PathBuf>,

    /// Policy for --static.
    #[arg(long, value_enum, default_value = "on-startup-load")]
    static_policy: CliStaticPolicy,

    /// Reload the configuration file when it changes.
    #[arg(short, long, requires = "config")]
    watch: bool,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
enum CliStaticPolicy {
    OnStartupLoad,
    ForEachRequest,
    RequestAndLoad,
}

impl From<CliStaticPolicy> for StaticPolicy {
    fn from(policy: CliStaticPolicy) -> Self {
        match policy {
            CliStaticPolicy::OnStartupLoad => StaticPolicy::OnStartupLoad,
            CliStaticPolicy::ForEachRequest => StaticPolicy::ForEachRequest,
            CliStaticPolicy::RequestAndLoad => StaticPolicy::RequestAndLoad,
        }
    }
}

impl Cli {
    /// Apply command line overrides on top of a loaded configuration.
    fn apply(&self, config: &mut OmnyConfig) {
        if let Some(bind) = &self.bind {
            config.listener.bind_address = bind.clone();
        }
        if let Some(dir) = &self.static_dir {
            config.static_files.push(StaticFilesConfig {
                dir: dir.clone(),
                policy: self.static_policy.into(),
            });
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => OmnyConfig::default(),
    };
    cli.apply(&mut config);

    logging::init_logging(&config.observability);
    tracing::info!("omny v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        routes = config.routes.len(),
        static_dirs = config.static_files.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let router = Router::from_config(&config)?;
    let listener = Listener::bind(&config.listener).await?;

    // Reloaded configurations get the same command line overrides.
    let (update_tx, update_rx) = mpsc::unbounded_channel();
    let _watcher = match (&cli.config, cli.watch) {
        (Some(path), true) => {
            let (watcher, mut raw_rx) = ConfigWatcher::new(path);
            let watcher = watcher.run()?;
            let cli = cli.clone();
            tokio::spawn(async move {
                while let Some(mut config) = raw_rx.recv().await {
                    cli.apply(&mut config);
                    if update_tx.send(config).is_err() {
                        break;
                    }
                }
            });
            Some(watcher)
        }
        _ => None,
    };

    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    let server = HttpServer::new(router, &config.listener);
    server.run(listener, update_rx, shutdown_rx).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
