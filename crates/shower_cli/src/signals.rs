//! Signal handling for a clean exit.
//!
//! Waits for SIGINT/SIGTERM on Unix and Ctrl+C elsewhere.

use tokio::signal;
use tracing::info;

/// Resolves once a termination signal arrives.
pub async fn shutdown_signal() -> Result<(), Box<dyn std::error::Error>> {
    wait_for_signal().await?;
    info!("📡 Received shutdown signal");
    Ok(())
}

async fn wait_for_signal() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(unix)]
    {
        use signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = sigint.recv() => (),
            _ = sigterm.recv() => ()
        }
    }

    #[cfg(not(unix))]
    signal::ctrl_c().await?;

    Ok(())
}
