//! Error types for voskpipe
//!
//! Uses thiserror for ergonomic error definitions with clear messages
//! that guide users toward fixing common issues.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the voskpipe crate
#[derive(Error, Debug)]
pub enum VoskpipeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Provisioning error: {0}")]
    Provision(#[from] ProvisionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while creating or probing a recognition session
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Recognizer binary not found at {0}.\n  Set recognizer.path in config or install the recognizer CLI on PATH.")]
    ExecutableNotFound(PathBuf),

    #[error("Failed to spawn recognizer {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Recognizer {0} pipe was not captured")]
    PipeUnavailable(&'static str),

    #[error("Recognizer query failed: {0}")]
    QueryFailed(String),

    #[error("Recognizer query returned invalid JSON: {0}")]
    QueryParse(#[from] serde_json::Error),
}

/// Errors raised by the model download/extract/install pipeline
///
/// Every variant is fatal to the provisioning attempt. The provisioner
/// removes its scratch workspace before one of these propagates.
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Download failed for {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("Archive extraction failed: {0}")]
    Extract(String),

    #[error("Extracted archive contains no top-level directory (model files at the archive root are not supported)")]
    NoModelRoot,

    #[error("Model marker missing after install: {0}")]
    MarkerMissing(PathBuf),

    #[error("Failed to install model at {path}: {source}")]
    Install {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Provisioning I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Provisioning task was aborted before completion")]
    TaskAborted,
}

/// Result type alias using VoskpipeError
pub type Result<T> = std::result::Result<T, VoskpipeError>;
