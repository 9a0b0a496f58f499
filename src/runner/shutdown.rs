//! OS signal handling.

use tracing::{info, warn};

/// Resolve on Ctrl-C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => info!("Received signal: SIGTERM"),
                    res = tokio::signal::ctrl_c() => on_ctrl_c(res).await,
                }
                return;
            }
            Err(e) => warn!("Failed to listen for SIGTERM: {}", e),
        }
    }

    on_ctrl_c(tokio::signal::ctrl_c().await).await;
}

async fn on_ctrl_c(res: std::io::Result<()>) {
    match res {
        Ok(()) => info!("Received signal: SIGINT"),
        Err(e) => {
            // No handler installed: never resolves.
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await
        }
    }
}
