// SPDX-License-Identifier: MIT

//! `hearthd` — the Hearth server binary: loads configuration, wires every
//! service together behind an [`AppState`](hearth_server::AppState), and
//! serves the HTTP surface until `SIGINT`/`SIGTERM`.

use hearth_auth::{AuthConfig, AuthService, CredentialTable};
use hearth_core::SystemClock;
use hearth_events::EventHub;
use hearth_files::{FileService, SearchService};
use hearth_jobs::JobScheduler;
use hearth_server::{AppState, Config};
use hearth_transfer::TransferEngine;
use hearth_vfs::{MountRegistry, OsFs};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const JOB_WORKER_COUNT: usize = 4;
const JOB_QUEUE_CAPACITY: usize = 64;
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);
const UPLOAD_IDLE_TIMEOUT_MS: u64 = 30 * 60 * 1000;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive("hearth=info".parse()?))
        .init();

    let config_path = std::env::var("HEARTH_CONFIG").unwrap_or_else(|_| "hearth.toml".to_string());
    let config = Config::load(&PathBuf::from(config_path))?;

    std::fs::create_dir_all(&config.scratch_dir)?;

    let registry = Arc::new(MountRegistry::new(config.mounts.clone())?);
    let fs = Arc::new(OsFs);
    let files = Arc::new(FileService::new(registry.clone(), fs.clone()));
    let search = Arc::new(SearchService::new(registry.clone(), fs.clone()));

    let events = Arc::new(EventHub::new());
    let transfer =
        Arc::new(TransferEngine::new(registry.clone(), fs.clone(), config.scratch_dir.clone(), SystemClock));
    let jobs = JobScheduler::new(
        registry.clone(),
        fs.clone(),
        SystemClock,
        events.clone() as Arc<dyn hearth_jobs::JobObserver>,
        JOB_WORKER_COUNT,
        JOB_QUEUE_CAPACITY,
    );

    let credentials = CredentialTable::new(config.users.clone());
    let auth = Arc::new(AuthService::new(
        credentials,
        config.signing_secret.clone().into_bytes(),
        SystemClock,
        AuthConfig::default(),
    ));

    let stat_probe: Arc<dyn hearth_vfs::StatProbe> = Arc::new(hearth_vfs::statvfs::OsStatProbe);
    let login_limiter = Arc::new(hearth_server::admission::RateLimiter::new(config.rate_limit_per_sec));

    let state = Arc::new(AppState {
        registry,
        fs,
        files,
        search,
        transfer: transfer.clone(),
        jobs,
        events,
        auth: auth.clone(),
        stat_probe,
        display_names: config.display_names.clone(),
        login_limiter,
        allowed_origins: config.allowed_origins.clone(),
        clock: SystemClock,
    });

    let shutdown = CancellationToken::new();
    let upload_sweeper = tokio::spawn(hearth_transfer::sweeper::run(
        transfer,
        SWEEP_INTERVAL,
        UPLOAD_IDLE_TIMEOUT_MS,
        shutdown.clone(),
    ));
    let revocation_sweeper = tokio::spawn(hearth_auth::registry::run_sweeper(
        auth.revocation_registry(),
        SystemClock,
        SWEEP_INTERVAL,
        shutdown.clone(),
    ));

    let app = hearth_server::router(state);
    let addr: SocketAddr = config.bind_addr().parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "hearthd listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(wait_for_shutdown_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    upload_sweeper.abort();
    revocation_sweeper.abort();

    Ok(())
}

async fn wait_for_shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut signal) = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            signal.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received");
    shutdown.cancel();
}
