use anyhow::Result;
use tokio_util::sync::CancellationToken;

/// Resolves on SIGINT/SIGTERM (Ctrl+C / Ctrl+Break elsewhere).
pub async fn wait_for_shutdown() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        tokio::select! {
            _ = sigterm.recv() => tracing::info!("shutdown: SIGTERM"),
            _ = sigint.recv()  => tracing::info!("shutdown: SIGINT"),
        }
        Ok(())
    }

    #[cfg(windows)]
    {
        use tokio::signal::windows::{ctrl_break, ctrl_c};
        let mut c = ctrl_c()?;
        let mut br = ctrl_break()?;
        tokio::select! {
            _ = c.recv()  => tracing::info!("shutdown: Ctrl+C"),
            _ = br.recv() => tracing::info!("shutdown: Ctrl+Break"),
        }
        Ok(())
    }
}

/// Token cancelled once a shutdown signal arrives. Must be called inside a
/// Tokio runtime.
pub fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown().await {
            tracing::error!(error = %e, "signal handler failed; shutting down");
        }
        trigger.cancel();
    });
    token
}
