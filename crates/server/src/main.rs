mod api;
mod config;

use std::sync::Arc;

use anyhow::Context;
use jia_file_engine::FileServiceFacade;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use api::AppState;
use config::{LogSection, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::load().context("failed to load server config")?;
    // guard 释放时才会刷新日志文件，必须活到进程退出。
    let _log_guard = init_tracing(&config.log)?;

    info!("starting jia-file server");
    let files = FileServiceFacade::new(&config.file_service_config())
        .context("failed to initialize file service")?;
    if let Some(root) = files.resolver().root() {
        info!(root = %root.display(), "file operations confined to root");
    }

    let state = Arc::new(AppState::new(Arc::new(files)));
    let app = api::create_router(state, config.file.max_size);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "server is ready, press Ctrl+C to shut down");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated unexpectedly")?;

    info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received, stopping server");
}

/// 日志同时输出到 stdout 和 `log.dir` 下按天滚动的 `app.YYYY-MM-DD.log`。
fn init_tracing(log: &LogSection) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(&log.dir)
        .with_context(|| format!("failed to create log dir: {}", log.dir.display()))?;
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("app")
        .filename_suffix("log")
        .build(&log.dir)
        .context("failed to create log file appender")?;
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&log.level))?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .init();
    Ok(guard)
}
