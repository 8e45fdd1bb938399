//! # Loop factory.
//!
//! A [`LoopFactory`] is the external capability that builds everything one
//! namespace's loop needs (scoped event interactor, scoped resource client)
//! and hands back a ready-to-run [`LoopRef`]. The supervisor calls it exactly
//! once per listed namespace, concurrently, from inside that namespace's task.
//!
//! A factory failure is reported exactly like a loop runtime failure.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::LoopError;
use crate::loops::{LoopRef, Namespace};

/// Shared handle to a factory.
pub type FactoryRef = Arc<dyn LoopFactory>;

/// Builds one control loop per namespace.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use nsvisor::{LoopError, LoopFactory, LoopFn, LoopRef, Namespace};
///
/// struct Claims;
///
/// #[async_trait]
/// impl LoopFactory for Claims {
///     async fn build(&self, ns: &Namespace) -> Result<LoopRef, LoopError> {
///         let ns = ns.clone();
///         Ok(LoopFn::boxed(move |stop: CancellationToken| async move {
///             let _ = ns;
///             stop.cancelled().await;
///             Ok(())
///         }))
///     }
/// }
/// ```
#[async_trait]
pub trait LoopFactory: Send + Sync + 'static {
    /// Builds the loop for `namespace`.
    ///
    /// Return [`LoopError::Factory`] when a scoped client cannot be constructed.
    async fn build(&self, namespace: &Namespace) -> Result<LoopRef, LoopError>;
}

/// Factory backed by a synchronous closure.
pub struct FactoryFn<F> {
    f: F,
}

impl<F> FactoryFn<F>
where
    F: Fn(&Namespace) -> Result<LoopRef, LoopError> + Send + Sync + 'static,
{
    /// Creates a new closure-backed factory.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the factory and returns it as a shared handle.
    pub fn arc(f: F) -> FactoryRef {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F> LoopFactory for FactoryFn<F>
where
    F: Fn(&Namespace) -> Result<LoopRef, LoopError> + Send + Sync + 'static,
{
    async fn build(&self, namespace: &Namespace) -> Result<LoopRef, LoopError> {
        (self.f)(namespace)
    }
}
