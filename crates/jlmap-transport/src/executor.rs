//! The executor capability supplied by the hosting toolkit.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// A script evaluation fault reported by the hosting engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ScriptFault {
    pub message: String,
}

impl ScriptFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Evaluates raw script text in the engine hosting the map.
///
/// The returned value is the JSON form of the script's completion value
/// (`Value::Null` for `undefined`/void scripts).
#[async_trait]
pub trait ScriptExecutor: Send + Sync {
    async fn execute(&self, script: &str) -> Result<Value, ScriptFault>;
}

/// Adapts a synchronous evaluation primitive.
pub struct BlockingExecutor<F> {
    eval: F,
}

impl<F> BlockingExecutor<F>
where
    F: Fn(&str) -> Result<Value, ScriptFault> + Send + Sync,
{
    pub fn new(eval: F) -> Self {
        Self { eval }
    }
}

#[async_trait]
impl<F> ScriptExecutor for BlockingExecutor<F>
where
    F: Fn(&str) -> Result<Value, ScriptFault> + Send + Sync,
{
    async fn execute(&self, script: &str) -> Result<Value, ScriptFault> {
        (self.eval)(script)
    }
}

type Responder = Box<dyn Fn(&str) -> Result<Value, ScriptFault> + Send + Sync>;

/// Headless executor: records every script and answers from a responder.
///
/// Used for dry runs (nothing is evaluated) and for driving sessions in tests.
pub struct MemoryExecutor {
    scripts: Mutex<Vec<String>>,
    responder: Responder,
}

impl MemoryExecutor {
    /// Every script completes with `null`.
    pub fn new() -> Self {
        Self::with_responder(|_| Ok(Value::Null))
    }

    pub fn with_responder(
        responder: impl Fn(&str) -> Result<Value, ScriptFault> + Send + Sync + 'static,
    ) -> Self {
        Self {
            scripts: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        }
    }

    /// Scripts executed so far, in order.
    pub fn scripts(&self) -> Vec<String> {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn take_scripts(&self) -> Vec<String> {
        std::mem::take(&mut *self.scripts.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn len(&self) -> usize {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScriptExecutor for MemoryExecutor {
    async fn execute(&self, script: &str) -> Result<Value, ScriptFault> {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(script.to_string());
        (self.responder)(script)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_memory_executor_records_in_order() {
        let executor = MemoryExecutor::new();
        executor.execute("a();").await.unwrap();
        executor.execute("b();").await.unwrap();
        assert_eq!(executor.scripts(), vec!["a();", "b();"]);
        assert_eq!(executor.take_scripts().len(), 2);
        assert!(executor.is_empty());
    }

    #[tokio::test]
    async fn test_memory_executor_responder() {
        let executor = MemoryExecutor::with_responder(|script| {
            if script.contains("getZoom") {
                Ok(json!(12))
            } else {
                Err(ScriptFault::new("ReferenceError: nope is not defined"))
            }
        });
        assert_eq!(executor.execute("this.map.getZoom();").await.unwrap(), json!(12));
        let fault = executor.execute("nope();").await.unwrap_err();
        assert!(fault.message.contains("ReferenceError"));
        assert_eq!(executor.len(), 2);
    }

    #[tokio::test]
    async fn test_blocking_executor() {
        let executor = BlockingExecutor::new(|script: &str| Ok(json!(script.len())));
        assert_eq!(executor.execute("abc").await.unwrap(), json!(3));
    }
}
