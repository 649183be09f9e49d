mod catalog;
mod client;
mod config;
mod error;
mod extract;
mod git;
mod handlers;
mod logger;
mod models;
mod routes;
mod status;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use tokio::net::TcpListener;
use tracing::{error, info};

use client::{GitHubClient, GitHubError};
use config::{AppConfig, ConfigError};
use git::{GitCli, LocalRepoProbe, RepoInspector};
use status::StatusAggregator;

// shared with every handler; everything inside is immutable,
// so cloning per request only bumps reference counts
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub status: StatusAggregator
}

impl AppState {

    pub fn new(config: Arc<AppConfig>, probe: Arc<dyn LocalRepoProbe>, started_at: Instant) -> Self {

        let status = StatusAggregator::new(config.clone(), probe, started_at);
        AppState { config, status }

    }

}

#[derive(Debug, thiserror::Error)]
enum StartupError {

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("GitHub client: {0}")]
    GitHub(#[from] GitHubError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error
    },

    #[error("server failed: {0}")]
    Serve(std::io::Error)

}

// logs what the service knows about its own repository, once, at boot
async fn log_repository_summary(inspector: RepoInspector) {

    let info = inspector.all_info().await;

    match &info.local {
        Some(local) => info!(branch = %local.branch, commit = %local.last_commit.hash, "local checkout"),
        None => info!("not running from a git checkout")
    }

    if let Some(remote) = &info.github {
        info!(
            repo = %remote.repo.full_name,
            branches = remote.branches.len(),
            latest = remote.latest_commit.as_ref().map(|c| c.hash.as_str()).unwrap_or("-"),
            "GitHub repository"
        );
    }

    if let Some(runs) = &info.workflows {
        info!(count = runs.len(), "recent workflow runs");
    }

}

async fn shutdown_signal() {

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutting down");

}

async fn run() -> Result<(), StartupError> {

    let started_at = Instant::now();
    let config = Arc::new(AppConfig::from_env()?);

    let probe: Arc<dyn LocalRepoProbe> = Arc::new(GitCli::new(config.git_workdir.clone(), config.git_timeout));
    let inspector = RepoInspector::new(probe.clone(), GitHubClient::new(config.github.clone())?);
    tokio::spawn(log_repository_summary(inspector));

    let state = AppState::new(config.clone(), probe, started_at);
    let app = routes::build_router(state);

    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind { addr, source })?;

    info!(environment = %config.environment, "Server is running on port {}", config.port);
    info!("Health check available at http://localhost:{}/health", config.port);
    info!("API documentation at http://localhost:{}/api", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(StartupError::Serve)

}

#[tokio::main]
async fn main() {

    dotenvy::dotenv().ok();
    logger::init_tracing(logger::DEFAULT_LOG_DIRECTIVE);

    if let Err(e) = run().await {
        error!("{}", e);
        eprintln!("{}", e);
        std::process::exit(1);
    }

}
