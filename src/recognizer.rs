//! Recognizer binary resolution and one-shot queries
//!
//! The recognizer CLI serves two roles: `-l` prints a single JSON object
//! with its version and the available capture devices, and `-d`/`-m`
//! starts a streaming recognition run. This module owns the resolved
//! binary path, the blocking `-l` query, and session start-up on top of
//! [`crate::session`].

use crate::error::{Result, SessionError};
use crate::session::{self, EventSink, SessionHandle, SessionOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;

/// One capture device reported by the recognizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioDevice {
    pub index: i32,
    pub id: String,
    pub name: String,
}

/// Output of the recognizer's `-l` query
#[derive(Debug, Clone, Deserialize)]
pub struct RecognizerInfo {
    pub version: String,
    #[serde(default)]
    pub devices: Vec<AudioDevice>,
}

/// A resolved recognizer binary
#[derive(Debug, Clone)]
pub struct Recognizer {
    exe: PathBuf,
}

impl Recognizer {
    /// Use an explicit binary path
    pub fn new(exe: impl Into<PathBuf>) -> std::result::Result<Self, SessionError> {
        let exe = exe.into();
        if !exe.exists() {
            return Err(SessionError::ExecutableNotFound(exe));
        }
        Ok(Self { exe })
    }

    /// Resolve the recognizer binary
    ///
    /// An explicitly configured path wins and must exist. Otherwise the
    /// usual suspects are tried in order: PATH, system locations, then
    /// the user's local bin.
    pub fn resolve(configured: Option<&Path>) -> std::result::Result<Self, SessionError> {
        if let Some(path) = configured {
            return Self::new(path);
        }

        let candidates = [
            which::which("vosk-cli").ok(),
            which::which("stt_cli").ok(),
            Some(PathBuf::from("/usr/local/bin/vosk-cli")),
            Some(PathBuf::from("/usr/bin/vosk-cli")),
            directories::BaseDirs::new().map(|d| d.home_dir().join(".local/bin/vosk-cli")),
        ];

        for candidate in candidates.into_iter().flatten() {
            if candidate.exists() {
                tracing::debug!("Resolved recognizer binary: {:?}", candidate);
                return Ok(Self { exe: candidate });
            }
        }

        Err(SessionError::ExecutableNotFound(PathBuf::from("vosk-cli")))
    }

    /// Path of the resolved binary
    pub fn exe_path(&self) -> &Path {
        &self.exe
    }

    /// Run the blocking `-l` query and parse the result
    ///
    /// This is a short-lived synchronous subprocess invocation, separate
    /// from the streaming session machinery.
    pub fn probe(&self) -> std::result::Result<RecognizerInfo, SessionError> {
        let output = Command::new(&self.exe)
            .arg("-l")
            .output()
            .map_err(|source| SessionError::Spawn {
                path: self.exe.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SessionError::QueryFailed(format!(
                "{} ({})",
                stderr.trim(),
                output.status
            )));
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }

    /// Recognizer version string from the `-l` query
    pub fn version(&self) -> std::result::Result<String, SessionError> {
        Ok(self.probe()?.version)
    }

    /// Capture devices from the `-l` query
    pub fn devices(&self) -> std::result::Result<Vec<AudioDevice>, SessionError> {
        Ok(self.probe()?.devices)
    }

    /// Start a streaming recognition session with this binary
    pub fn start_session(
        &self,
        options: SessionOptions,
        sink: impl EventSink + 'static,
    ) -> Result<SessionHandle> {
        session::start(&self.exe, options, sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_path_must_exist() {
        let err = Recognizer::resolve(Some(Path::new("/nonexistent/vosk-cli"))).unwrap_err();
        assert!(matches!(err, SessionError::ExecutableNotFound(_)));
    }

    #[cfg(unix)]
    mod with_stub {
        use super::*;
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        /// Write an executable shell stub that prints `body` on `-l`
        fn stub_recognizer(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("vosk-cli");
            fs::write(&path, format!("#!/bin/sh\nprintf '%s\\n' '{}'\n", body)).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[test]
        fn probe_parses_version_and_devices() {
            let dir = tempfile::tempdir().unwrap();
            let exe = stub_recognizer(
                dir.path(),
                r#"{"devices":[{"index":0,"id":"dev0","name":"Built-in Mic"}],"version":"1.0.0"}"#,
            );

            let recognizer = Recognizer::new(&exe).unwrap();
            let info = recognizer.probe().unwrap();
            assert_eq!(info.version, "1.0.0");
            assert_eq!(info.devices.len(), 1);
            assert_eq!(info.devices[0].name, "Built-in Mic");

            assert_eq!(recognizer.version().unwrap(), "1.0.0");
            assert_eq!(recognizer.devices().unwrap()[0].index, 0);
        }

        #[test]
        fn probe_rejects_non_json_output() {
            let dir = tempfile::tempdir().unwrap();
            let exe = stub_recognizer(dir.path(), "this is not json");

            let recognizer = Recognizer::new(&exe).unwrap();
            let err = recognizer.probe().unwrap_err();
            assert!(matches!(err, SessionError::QueryParse(_)));
        }
    }
}
