//! Error types for tree synthesis.

use thiserror::Error;

/// Errors raised while configuring, generating or exporting a tree.
///
/// Grammar expansion and turtle interpretation never fail: malformed input is
/// logged and skipped there. Only configuration and file I/O surface errors.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid geometry parameters: {0}")]
    InvalidParameters(String),

    #[error("'{0}' is not a rewritable symbol (expected one of F, X, A, C)")]
    UnknownSymbol(char),
}
