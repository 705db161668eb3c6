//! Error types for rendering.
//!
//! [`RenderError`] covers every failure a render pass can hit: template
//! compilation, serialization of cells, writes to the output channel, and
//! fill targets refusing an element.

use thiserror::Error;

/// Error type for render operations.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Template syntax error or compilation failure.
    #[error("template error: {0}")]
    Template(String),

    /// A cell or document could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Output channel failure (stream write, file write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A fill target rejected an element.
    #[error("{target} rejected '{name}': {reason}")]
    FillRejected {
        target: &'static str,
        name: String,
        reason: String,
    },

    /// A formatting rule or renderer option is invalid.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// The renderer cannot perform the requested operation.
    #[error("{renderer} renderer does not support {operation}")]
    Unsupported {
        renderer: &'static str,
        operation: &'static str,
    },
}

impl RenderError {
    pub fn serialization(err: impl std::fmt::Display) -> Self {
        RenderError::Serialization(err.to_string())
    }

    pub fn fill_rejected(target: &'static str, name: impl Into<String>, reason: String) -> Self {
        RenderError::FillRejected {
            target,
            name: name.into(),
            reason,
        }
    }
}

impl From<csv::Error> for RenderError {
    fn from(err: csv::Error) -> Self {
        RenderError::Serialization(err.to_string())
    }
}

impl From<csv::IntoInnerError<csv::Writer<Vec<u8>>>> for RenderError {
    fn from(err: csv::IntoInnerError<csv::Writer<Vec<u8>>>) -> Self {
        RenderError::Serialization(err.to_string())
    }
}

impl From<std::string::FromUtf8Error> for RenderError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        RenderError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(err: serde_json::Error) -> Self {
        RenderError::Serialization(err.to_string())
    }
}

impl From<minijinja::Error> for RenderError {
    fn from(err: minijinja::Error) -> Self {
        use minijinja::ErrorKind;

        match err.kind() {
            ErrorKind::BadSerialization => RenderError::Serialization(err.to_string()),
            _ => RenderError::Template(err.to_string()),
        }
    }
}

/// Result type for render operations.
pub type Result<T> = std::result::Result<T, RenderError>;
