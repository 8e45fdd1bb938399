//! # Example: namespaces
//!
//! Runs one claim-reconciler loop per namespace under `ContinueOnError`.
//!
//! Shows how to:
//! - Implement [`LoopFactory`] that builds namespace-scoped state once per namespace.
//! - Keep siblings running while one namespace keeps failing.
//! - Stop everything on Ctrl-C via [`shutdown::signal_token`].
//!
//! ## Flow
//! ```text
//! signal_token() ──► Supervisor::start([team-a, team-b, quarantined])
//!     ├─► team-a       reconciles every 500ms until stopped
//!     ├─► team-b       reconciles every 500ms until stopped
//!     └─► quarantined  factory fails ──► ErrorStream ──► printed, siblings untouched
//! Ctrl-C ──► handle.shutdown() (grace 5s)
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example namespaces
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use nsvisor::{
    FailurePolicy, LogWriter, LoopError, LoopFactory, LoopFn, LoopRef, Namespace, Supervisor,
    shutdown,
};

/// Builds a reconciler for storage claims scoped to one namespace.
struct ClaimReconcilers {
    interval: Duration,
}

#[async_trait]
impl LoopFactory for ClaimReconcilers {
    async fn build(&self, ns: &Namespace) -> Result<LoopRef, LoopError> {
        if ns.as_str() == "quarantined" {
            return Err(LoopError::factory(ns, "service account lacks list permission"));
        }

        let ns = ns.clone();
        let interval = self.interval;
        Ok(LoopFn::boxed(move |stop: CancellationToken| async move {
            let mut ticker = tokio::time::interval(interval);
            let mut passes = 0u64;
            loop {
                tokio::select! {
                    _ = stop.cancelled() => {
                        info!(namespace = %ns, passes, "reconciler stopping");
                        return Ok(());
                    }
                    _ = ticker.tick() => {
                        passes += 1;
                        info!(namespace = %ns, passes, "reconciled claims");
                    }
                }
            }
        }))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let sup = Supervisor::builder(Arc::new(ClaimReconcilers {
        interval: Duration::from_millis(500),
    }))
    .with_policy(FailurePolicy::ContinueOnError)
    .with_grace(Duration::from_secs(5))
    .with_subscriber(Arc::new(LogWriter::new()))
    .build();

    let stop = shutdown::signal_token();
    let (handle, mut errors) = sup.start(["team-a", "team-b", "quarantined"], stop.clone());

    tokio::select! {
        _ = stop.cancelled() => {}
        _ = async {
            while let Some(err) = errors.recv().await {
                println!("[caller] {err}");
            }
        } => {}
    }

    stop.cancelled().await;
    handle.shutdown().await?;
    sup.flush().await;
    Ok(())
}
