//! Recognition sessions against the external recognizer process
//!
//! A session is one run of the recognizer binary plus its decoded event
//! stream. The process is spawned with stdout piped; bytes are fed through
//! a [`LineEventDecoder`] and each decoded event is handed to the caller's
//! [`EventSink`] in arrival order. The session is a two-state machine:
//! `Running` until the process exits, then `Ended` — with the decoder's
//! end-of-stream flush performed as part of that transition, never skipped.

pub mod decoder;

pub use decoder::{LineEventDecoder, RecognitionEvent};

use crate::error::{Result, SessionError, VoskpipeError};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::{watch, Notify};

/// Observer receiving decoded recognition events
///
/// Passed once at session start and held for the session's lifetime.
/// Events arrive synchronously, in stream order, on the runtime's I/O
/// context; the sink should hand heavy work off rather than block.
pub trait EventSink: Send + Sync {
    fn on_event(&self, event: RecognitionEvent);
}

impl<F> EventSink for F
where
    F: Fn(RecognitionEvent) + Send + Sync,
{
    fn on_event(&self, event: RecognitionEvent) {
        self(event)
    }
}

/// Lifecycle of a recognition session
///
/// `Ended` is reachable only via process exit. No events are delivered
/// after the transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Running,
    Ended,
}

/// Options for starting a session
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Audio device index passed as `-d` (the recognizer defaults to 0)
    pub device_index: i32,
    /// Model directory passed as `-m`; omitted entirely when `None`
    pub model_path: Option<PathBuf>,
}

/// Caller-facing handle to a running session
///
/// Dropping the handle does not stop the session; call [`cancel`] to
/// request termination or [`wait`] to block until the process exits.
///
/// [`cancel`]: SessionHandle::cancel
/// [`wait`]: SessionHandle::wait
#[derive(Debug)]
pub struct SessionHandle {
    cancel: Arc<Notify>,
    state: watch::Receiver<SessionState>,
    task: tokio::task::JoinHandle<std::io::Result<ExitStatus>>,
}

impl SessionHandle {
    /// Request termination of the recognizer process
    ///
    /// Best-effort and asynchronous: the kill signal is delivered by the
    /// session task, and the final decoder flush may still run after this
    /// returns. Once the process has fully exited no further events are
    /// delivered. Safe to call multiple times.
    pub fn cancel(&self) {
        self.cancel.notify_one();
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Subscribe to state transitions
    pub fn state_watch(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Wait for the session to end, returning the process exit status
    ///
    /// Any exit code ends the session normally; a non-zero status is the
    /// recognizer's business, not a session error.
    pub async fn wait(self) -> Result<ExitStatus> {
        match self.task.await {
            Ok(status) => status.map_err(VoskpipeError::Io),
            Err(join_err) => Err(VoskpipeError::Io(std::io::Error::other(join_err))),
        }
    }
}

/// Spawn the recognizer and start streaming events into `sink`
///
/// Fails synchronously if the binary cannot be spawned; after that, the
/// only fatal session condition is process exit. Malformed stdout lines
/// are dropped by the decoder and never abort the stream.
pub fn start(
    exe: &Path,
    options: SessionOptions,
    sink: impl EventSink + 'static,
) -> Result<SessionHandle> {
    let mut cmd = Command::new(exe);
    cmd.arg("-d")
        .arg(options.device_index.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    if let Some(model) = options.model_path.as_ref().filter(|p| !p.as_os_str().is_empty()) {
        cmd.arg("-m").arg(model);
    }

    tracing::info!(
        "Starting recognition session: {:?} (device {})",
        exe,
        options.device_index
    );

    let mut child = cmd.spawn().map_err(|source| SessionError::Spawn {
        path: exe.to_path_buf(),
        source,
    })?;

    let stdout = child
        .stdout
        .take()
        .ok_or(SessionError::PipeUnavailable("stdout"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or(SessionError::PipeUnavailable("stderr"))?;

    // Drain stderr so the recognizer never blocks on a full pipe. The
    // content is diagnostic only, never parsed as events.
    tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            tracing::debug!("recognizer stderr: {}", line);
        }
    });

    let cancel = Arc::new(Notify::new());
    let (state_tx, state_rx) = watch::channel(SessionState::Running);

    let task = tokio::spawn(run_session(
        child,
        stdout,
        Arc::clone(&cancel),
        state_tx,
        Box::new(sink),
    ));

    Ok(SessionHandle {
        cancel,
        state: state_rx,
        task,
    })
}

/// Session task: pump stdout through the decoder until process exit
async fn run_session(
    mut child: Child,
    mut stdout: ChildStdout,
    cancel: Arc<Notify>,
    state_tx: watch::Sender<SessionState>,
    sink: Box<dyn EventSink>,
) -> std::io::Result<ExitStatus> {
    let mut decoder = LineEventDecoder::new();
    let mut buf = [0u8; 4096];

    loop {
        tokio::select! {
            read = stdout.read(&mut buf) => match read {
                Ok(0) => break,
                Ok(n) => {
                    for event in decoder.push(&buf[..n]) {
                        sink.on_event(event);
                    }
                }
                Err(err) => {
                    tracing::warn!("Recognizer stdout read failed: {}", err);
                    break;
                }
            },
            _ = cancel.notified() => {
                tracing::debug!("Session cancelled, signalling recognizer");
                if let Err(err) = child.start_kill() {
                    tracing::warn!("Failed to kill recognizer: {}", err);
                }
                // Keep reading: the stream ends when the process does,
                // and the flush below still runs.
            }
        }
    }

    // Mandatory transition action: flush a trailing unterminated line
    // before the session counts as ended.
    if let Some(event) = decoder.finish() {
        sink.on_event(event);
    }
    if decoder.malformed_lines() > 0 {
        tracing::debug!(
            "Session dropped {} malformed stdout lines",
            decoder.malformed_lines()
        );
    }

    let status = child.wait().await;
    match &status {
        Ok(code) => tracing::info!("Recognition session ended: {}", code),
        Err(err) => tracing::warn!("Recognition session wait failed: {}", err),
    }
    let _ = state_tx.send(SessionState::Ended);
    status
}
