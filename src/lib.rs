//! Voskpipe: managed sessions and model provisioning for a Vosk recognizer CLI
//!
//! This library provides the core functionality for:
//! - Spawning an external Vosk-based recognizer process and decoding its
//!   newline-delimited JSON output into a stream of recognition events
//! - Cancelling a running session and observing its lifecycle
//! - Downloading, extracting and atomically installing model archives,
//!   with idempotent skip-if-present semantics
//! - Querying the recognizer binary for its version and capture devices
//!
//! # Architecture
//!
//! ```text
//!   caller ──▶ Recognizer ──▶ recognition session ──▶ recognizer process
//!                 │                    │                     │ stdout
//!                 │                    └── LineEventDecoder ◀┘
//!                 │                              │ events
//!                 │                          EventSink ──▶ caller
//!                 │
//!                 └──▶ model provisioner ──▶ archive installer ──▶ filesystem
//!                        (idempotence,          (download, extract,
//!                         scratch cleanup)       atomic move)
//! ```
//!
//! The two pipelines share no runtime state, only the path convention for
//! "model directory": a directory is a valid model iff it contains the
//! `conf/model.conf` marker file.

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod recognizer;
pub mod session;

pub use config::Config;
pub use error::{ProvisionError, Result, SessionError, VoskpipeError};
pub use model::{ensure_model, is_valid_model};
pub use recognizer::{AudioDevice, Recognizer, RecognizerInfo};
pub use session::{EventSink, RecognitionEvent, SessionHandle, SessionOptions, SessionState};
