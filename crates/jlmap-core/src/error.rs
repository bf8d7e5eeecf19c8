use thiserror::Error;

use crate::types::ObjectKind;

#[derive(Debug, Error)]
pub enum JlMapError {
    /// The embedded engine rejected or faulted on injected script.
    #[error("Script execution failed: {message}")]
    ScriptExecution { script: String, message: String },

    #[error("Unknown object: {0}")]
    UnknownObject(String),

    #[error("Unsupported method '{method}' for {kind}")]
    UnsupportedMethod { kind: ObjectKind, method: String },

    /// A payload from the embedded engine could not be decoded.
    #[error("Conversion error: {reason} (payload: {payload})")]
    Conversion { payload: String, reason: String },

    #[error("Malformed script: {0}")]
    MalformedScript(String),

    #[error("Invalid object id '{id}': {reason}")]
    InvalidObjectId { id: String, reason: String },

    #[error("Duplicate object: {0}")]
    DuplicateObject(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl JlMapError {
    pub fn conversion(payload: impl Into<String>, reason: impl ToString) -> Self {
        Self::Conversion {
            payload: payload.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, JlMapError>;
