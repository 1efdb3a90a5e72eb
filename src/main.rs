use std::sync::Arc;

use podkiller::metrics;
use podkiller::Controller;
use podkiller::Error;
use podkiller::KubeClusterApi;
use podkiller::Result;
use podkiller::Settings;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    // Initializing Logs
    let _guard = init_observability();

    let settings = Settings::new()?.validate()?;
    info!(?settings, "configuration loaded");

    // Initializing Shutdown Signal
    let shutdown = CancellationToken::new();

    let metrics_handle = settings
        .monitoring
        .endpoint_port()
        .map(|port| tokio::spawn(metrics::start_server(port, shutdown.clone())));

    let api = Arc::new(KubeClusterApi::try_default().await?);
    let controller = Controller::new(&settings, api, shutdown.clone())?;

    info!("Application started. Waiting for SIGINT/SIGTERM...");
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = graceful_shutdown(signal_token).await {
            error!("Failed to shutdown: {}", e);
        }
    });

    if let Err(e) = controller.run().await {
        error!("controller stopped: {}", e);
    }

    if let Some(handle) = metrics_handle {
        let _ = handle.await;
    }
    info!("Exiting program.");
    Ok(())
}

async fn graceful_shutdown(shutdown: CancellationToken) -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| Error::Fatal(format!("cannot listen for SIGINT: {e}")))?;
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| Error::Fatal(format!("cannot listen for SIGTERM: {e}")))?;
    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT detected.");
        },
        _ = sigterm.recv() => {
            info!("SIGTERM detected.");
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C detected.");
        },
    }

    shutdown.cancel();
    info!("Shutdown signal sent");
    Ok(())
}

fn init_observability() -> WorkerGuard {
    let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stdout());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let base_subscriber = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_filter(filter);
    tracing_subscriber::registry().with(base_subscriber).init();

    guard
}
