mod app;
mod cache;
mod download_queue;
mod http;
mod keymap;
mod process;
mod prompt;
mod sources;
mod supervisor;
mod theme;
mod ui;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use deck_proto::config::Config;
use deck_proto::state::SharedState;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::download_queue::DownloadWorker;
use crate::process::{Launcher, SystemLauncher};
use crate::sources::{HttpFetch, ReqwestFetch};

/// Terminal browser for online video feeds and a local download folder.
#[derive(Debug, Parser)]
#[command(name = "feeddeck")]
struct Cli {
    /// Port for the remote-control listener (0 disables it).
    port: Option<u16>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let data_dir = deck_proto::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("feeddeck.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // RUST_LOG wins; otherwise keep HTTP client internals quiet.
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    eprintln!("feeddeck log: {}", log_path.display());
    info!("feeddeck starting");

    // ── Config ───────────────────────────────────────────────────────────────
    let mut config = Config::load().unwrap_or_else(|e| {
        warn!("config not loaded, using defaults: {:#}", e);
        Config::default()
    });
    if let Some(port) = cli.port {
        config.remote.port = port;
    }

    // ── Runtime for the listener and HTTP client ─────────────────────────────
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let shared = SharedState::new();
    let launcher: Arc<dyn Launcher> = Arc::new(SystemLauncher);
    let http: Arc<dyn HttpFetch> = Arc::new(ReqwestFetch::new(
        rt.handle().clone(),
        &config.feed.user_agent,
    )?);

    // ── Remote control ───────────────────────────────────────────────────────
    let shutdown = CancellationToken::new();
    let server = if config.remote.port != 0 {
        let _guard = rt.enter();
        Some(http::start_server(
            config.remote.bind_address.clone(),
            config.remote.port,
            shared.clone(),
            shutdown.clone(),
        ))
    } else {
        info!("remote control disabled");
        None
    };

    // ── Download worker ──────────────────────────────────────────────────────
    let worker = DownloadWorker::new(
        shared.clone(),
        launcher.clone(),
        config.commands.downloader.clone(),
        config.paths.files_dir.clone(),
    )
    .spawn(config.worker.poll_interval())?;

    // ── UI (blocks until quit) ───────────────────────────────────────────────
    let result = app::App::new(&config, shared.clone(), launcher, http).run();
    if let Err(e) = &result {
        warn!("ui exited with error: {:#}", e);
    }

    // ── Shutdown ─────────────────────────────────────────────────────────────
    shared.request_shutdown();
    worker.thread().unpark();
    if worker.join().is_err() {
        warn!("download worker panicked");
    }
    shutdown.cancel();
    if let Some(server) = server {
        if let Err(e) = rt.block_on(server) {
            warn!("remote control task failed: {}", e);
        }
    }
    rt.shutdown_timeout(Duration::from_secs(1));
    info!("feeddeck stopped");

    result
}
