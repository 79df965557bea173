//! OS signal handling.
//!
//! Ctrl-C (SIGINT) triggers the shared `Shutdown`, which cancels every
//! running status poll.

use crate::lifecycle::Shutdown;

/// Wait for Ctrl-C, then trigger `shutdown`.
///
/// If the handler cannot be installed the error is logged and shutdown is
/// triggered immediately.
pub async fn wait_for_shutdown_signal(shutdown: Shutdown) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => tracing::error!(error = %e, "Failed to install Ctrl+C handler"),
    }
    shutdown.trigger();
}
