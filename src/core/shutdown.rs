//! # OS termination signals as an external stop signal.
//!
//! A controller process normally stops its supervisor when the orchestrator
//! asks it to. [`signal_token`] turns that request into the
//! [`CancellationToken`] passed to [`Supervisor::start`](crate::Supervisor::start):
//!
//! ```text
//! SIGTERM / SIGINT / SIGQUIT / Ctrl-C ──► wait_for_shutdown_signal() ──► token.cancel()
//!                                                                          │
//!                                             every loop's stop token ◄────┘
//! ```
//!
//! On non-unix targets only Ctrl-C is observed.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Resolves on the first SIGINT, SIGTERM, SIGQUIT or Ctrl-C.
///
/// Fails only if a signal handler cannot be installed.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut quit = signal(SignalKind::quit())?;

    let name = tokio::select! {
        _ = interrupt.recv() => "SIGINT",
        _ = terminate.recv() => "SIGTERM",
        _ = quit.recv() => "SIGQUIT",
        res = tokio::signal::ctrl_c() => {
            res?;
            "ctrl-c"
        }
    };
    info!(signal = name, "termination signal received");
    Ok(())
}

/// Resolves on Ctrl-C.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await?;
    info!(signal = "ctrl-c", "termination signal received");
    Ok(())
}

/// Returns a token cancelled on the first termination signal.
///
/// If handlers cannot be installed the token is cancelled right away, so a
/// caller never runs loops nothing can stop. Must be called inside a tokio runtime.
pub fn signal_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown_signal().await {
            warn!(error = %e, "cannot install signal handlers; stopping");
        }
        trigger.cancel();
    });
    token
}
