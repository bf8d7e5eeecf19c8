//! Script transport: render, check, execute, decode.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use jlmap_core::config::TransportConfig;
use jlmap_core::error::{JlMapError, Result};

use crate::envelope::Envelope;
use crate::executor::ScriptExecutor;
use crate::syntax::check_balanced;

/// Sends envelopes to the hosting engine. Cheap to clone.
#[derive(Clone)]
pub struct Transport {
    executor: Arc<dyn ScriptExecutor>,
    settings: TransportConfig,
}

impl Transport {
    pub fn new(executor: Arc<dyn ScriptExecutor>) -> Self {
        Self::with_config(executor, TransportConfig::default())
    }

    pub fn with_config(executor: Arc<dyn ScriptExecutor>, settings: TransportConfig) -> Self {
        Self { executor, settings }
    }

    /// Execute and decode the completion value into `T`.
    pub async fn execute<T: DeserializeOwned>(&self, envelope: Envelope) -> Result<T> {
        let value = self.execute_raw(envelope).await?;
        decode(value)
    }

    /// Execute, ignoring the completion value.
    pub async fn execute_void(&self, envelope: Envelope) -> Result<()> {
        self.execute_raw(envelope).await.map(|_| ())
    }

    pub async fn execute_raw(&self, envelope: Envelope) -> Result<Value> {
        let script = envelope.render()?;
        if self.settings.validate_scripts {
            check_balanced(&script)?;
        }
        if self.settings.trace_scripts {
            trace!(target_id = ?envelope.target, %script, "Executing script");
        }

        match self.executor.execute(&script).await {
            Ok(value) => {
                debug!(target_id = ?envelope.target, bytes = script.len(), "Script executed");
                Ok(value)
            }
            Err(fault) => {
                warn!(target_id = ?envelope.target, error = %fault, "Script execution failed");
                Err(JlMapError::ScriptExecution {
                    script,
                    message: fault.message,
                })
            }
        }
    }

    /// Start executing on the current tokio runtime and return immediately.
    pub fn submit<T>(&self, envelope: Envelope) -> Deferred<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let transport = self.clone();
                handle.spawn(async move {
                    let result = transport.execute::<T>(envelope).await;
                    // the receiver may have been dropped; nothing to report then
                    let _ = tx.send(result);
                });
            }
            Err(e) => {
                let _ = tx.send(Err(JlMapError::Other(anyhow::anyhow!(
                    "no async runtime to submit script on: {e}"
                ))));
            }
        }
        Deferred { rx }
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value.clone()).map_err(|e| JlMapError::conversion(value.to_string(), e))
}

/// A script result that is not available yet.
///
/// Await it from async code, or call [`Deferred::blocking_resolve`] from a
/// thread outside the runtime.
#[must_use = "a deferred result does nothing unless resolved"]
pub struct Deferred<T> {
    rx: oneshot::Receiver<Result<T>>,
}

impl<T> Deferred<T> {
    pub fn blocking_resolve(self) -> Result<T> {
        self.rx.blocking_recv().unwrap_or_else(|_| Err(dropped()))
    }
}

impl<T> Future for Deferred<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or_else(|_| Err(dropped())))
    }
}

fn dropped() -> JlMapError {
    JlMapError::Other(anyhow::anyhow!("script task ended without a result"))
}
