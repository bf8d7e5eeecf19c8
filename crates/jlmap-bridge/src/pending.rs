//! Correlation ids and in-flight inbound calls.

use std::fmt;

use chrono::Utc;
use rand::Rng;
use rand::distr::Alphanumeric;

const SUFFIX_LEN: usize = 8;

/// Tags one inbound call for logging. Opaque to the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// `call_<unix millis>_<random suffix>`, the same shape the bootstrap
    /// script produces.
    pub fn generate() -> Self {
        let suffix: String = rand::rng()
            .sample_iter(Alphanumeric)
            .take(SUFFIX_LEN)
            .map(char::from)
            .collect();
        Self(format!("call_{}_{suffix}", Utc::now().timestamp_millis()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CorrelationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for CorrelationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One `jlObjectBridgeCall` invocation, consumed when it is answered.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCall {
    pub correlation_id: CorrelationId,
    pub object_id: String,
    pub method_name: String,
    /// JSON text of the single argument; `None` when the call has none.
    pub args_json: Option<String>,
}

impl PendingCall {
    pub fn new(
        correlation_id: impl Into<CorrelationId>,
        object_id: impl Into<String>,
        method_name: impl Into<String>,
        args_json: Option<&str>,
    ) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            object_id: object_id.into(),
            method_name: method_name.into(),
            args_json: args_json
                .map(str::trim)
                .filter(|raw| !matches!(*raw, "" | "null" | "undefined"))
                .map(str::to_string),
        }
    }
}
