//! # Example: fail_fast
//!
//! Three namespace loops under `FailFast`; one loses its watch after a while.
//!
//! ## Flow
//! ```text
//! Supervisor::start([alpha, beta, gamma])
//!     ├─► alpha, gamma  park on their stop token
//!     └─► beta          fails after 300ms
//!            └─► coordinator: forward error ─► cancel alpha, gamma ─► close channel
//! caller: recv() = Some(beta error), recv() = None
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example fail_fast
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use nsvisor::{FactoryFn, FailurePolicy, LogWriter, LoopError, LoopFn, Namespace, Supervisor};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let factory = FactoryFn::arc(|ns: &Namespace| {
        let ns = ns.clone();
        Ok(LoopFn::boxed(move |stop: CancellationToken| async move {
            if ns.as_str() == "beta" {
                tokio::select! {
                    _ = stop.cancelled() => return Ok(()),
                    _ = tokio::time::sleep(Duration::from_millis(300)) => {}
                }
                return Err(LoopError::failed(ns, "watch stream terminated by server"));
            }
            stop.cancelled().await;
            Ok(())
        }))
    });

    let sup = Supervisor::builder(factory)
        .with_policy(FailurePolicy::FailFast)
        .with_subscriber(Arc::new(LogWriter::new()))
        .build();

    let (mut handle, mut errors) =
        sup.start(["alpha", "beta", "gamma"], CancellationToken::new());

    while let Some(err) = errors.recv().await {
        println!("[caller] {err}");
    }
    println!("[caller] error channel closed: {}", errors.is_closed());

    handle.wait().await;
    sup.flush().await;
    Ok(())
}
