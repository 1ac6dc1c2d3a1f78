//! Run the HTTP service and the retention sweeper until shutdown.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::broadcast;

use masker_common::config::ServiceConfig;
use masker_http_api::{build_router, AppState};
use masker_retention::RetentionSweeper;
use masker_transcode_engine::{command_exists, FfmpegRunner, FfprobeProbe, MaskPipeline};

pub async fn run(config: ServiceConfig) -> anyhow::Result<()> {
    config
        .ensure_dirs()
        .context("Failed to create upload/output directories")?;

    tracing::info!(
        port = config.port,
        ttl_minutes = config.ttl_minutes,
        max_file_mb = config.max_file_mb,
        upload_dir = %config.upload_dir.display(),
        output_dir = %config.output_dir.display(),
        sweep_interval_secs = config.sweep_interval_secs,
        "Starting mask service"
    );

    let probe = FfprobeProbe::new(config.ffprobe_path.clone());
    let runner = FfmpegRunner::new(config.ffmpeg_path.clone());
    warn_if_missing("ffprobe", probe.binary());
    warn_if_missing("ffmpeg", runner.binary());

    let pipeline = MaskPipeline::new(Arc::new(probe), Arc::new(runner), config.output_dir.clone());

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let sweeper = RetentionSweeper::from_config(&config);
    let sweeper_handle = tokio::spawn(sweeper.run(shutdown_tx.subscribe()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let router = build_router(AppState::new(config, pipeline));

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(%addr, "HTTP server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("Shutdown signal received, stopping sweeper");
    let _ = shutdown_tx.send(());
    if let Err(err) = sweeper_handle.await {
        tracing::warn!(error = %err, "Retention sweeper task ended abnormally");
    }

    tracing::info!("Mask service stopped");
    Ok(())
}

fn warn_if_missing(label: &str, binary: &Path) {
    if !command_exists(binary) {
        tracing::warn!(
            tool = label,
            binary = %binary.display(),
            "External tool not found; requests that need it will fail"
        );
    }
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
