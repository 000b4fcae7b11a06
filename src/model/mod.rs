//! Model provisioning: idempotency and scratch-space lifecycle
//!
//! The provisioner wraps the installer with the two guarantees the
//! installer itself does not give: skip the whole pipeline when a valid
//! model is already in place, and remove the scratch workspace whether
//! the attempt succeeded or failed. Installer failures propagate to the
//! caller unmasked, after cleanup.
//!
//! Concurrent provisioning of the *same* destination from two processes
//! is not coordinated here; callers that need that must serialize
//! themselves. Distinct attempts always get distinct scratch workspaces.

pub mod install;

use crate::error::{ProvisionError, Result, VoskpipeError};
use std::fs;
use std::path::{Path, PathBuf};

/// Marker file whose presence defines "this directory is a valid model"
pub const MODEL_MARKER: &str = "conf/model.conf";

/// Presence check for the model marker
///
/// This is not an integrity check: a partially written model directory
/// that happens to contain the marker passes.
pub fn is_valid_model(path: &Path) -> bool {
    path.join(MODEL_MARKER).exists()
}

/// Blocking download-extract-install pipeline with cleanup
///
/// Returns immediately when `destination` already holds a valid model and
/// `force` is false — no network, no filesystem mutation beyond the
/// marker check. Otherwise a uniquely named scratch workspace is created
/// under `temp_root`, the installer runs inside it, and the workspace is
/// removed recursively before this returns, success or failure.
pub fn provision(
    url: &str,
    destination: &Path,
    temp_root: &Path,
    force: bool,
) -> std::result::Result<(), ProvisionError> {
    if is_valid_model(destination) && !force {
        tracing::debug!("Valid model already at {:?}, nothing to do", destination);
        return Ok(());
    }

    fs::create_dir_all(temp_root)?;
    let scratch = tempfile::Builder::new()
        .prefix("voskpipe-model-")
        .tempdir_in(temp_root)?;
    tracing::debug!("Provisioning into scratch workspace {:?}", scratch.path());

    let outcome = install::install(url, destination, scratch.path());

    // Explicit close surfaces removal problems on the spot; the TempDir
    // drop guard would otherwise swallow them. Either way the workspace
    // does not outlive the attempt.
    if let Err(err) = scratch.close() {
        tracing::warn!("Could not remove scratch workspace: {}", err);
    }

    outcome?;

    if !is_valid_model(destination) {
        return Err(ProvisionError::MarkerMissing(destination.join(MODEL_MARKER)));
    }
    Ok(())
}

/// Ensure a model directory exists at `destination`, downloading if needed
///
/// Async front for [`provision`]; the blocking transfer and filesystem
/// work runs on the blocking thread pool.
pub async fn ensure_model(
    url: impl Into<String>,
    destination: impl Into<PathBuf>,
    temp_root: impl Into<PathBuf>,
    force: bool,
) -> Result<()> {
    let url = url.into();
    let destination = destination.into();
    let temp_root = temp_root.into();

    tokio::task::spawn_blocking(move || provision(&url, &destination, &temp_root, force))
        .await
        .map_err(|_| VoskpipeError::Provision(ProvisionError::TaskAborted))?
        .map_err(VoskpipeError::Provision)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// URL that fails fast without touching the network stack's resolver
    const DEAD_URL: &str = "http://127.0.0.1:1/model.tar.gz";

    fn make_valid_model(root: &Path) -> PathBuf {
        let model = root.join("model");
        fs::create_dir_all(model.join("conf")).unwrap();
        fs::write(model.join(MODEL_MARKER), "").unwrap();
        model
    }

    #[test]
    fn marker_presence_defines_validity() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("m");
        assert!(!is_valid_model(&model));

        // Unrelated files are irrelevant.
        fs::create_dir_all(model.join("am")).unwrap();
        fs::write(model.join("am/final.mdl"), "x").unwrap();
        assert!(!is_valid_model(&model));

        fs::create_dir_all(model.join("conf")).unwrap();
        fs::write(model.join(MODEL_MARKER), "").unwrap();
        assert!(is_valid_model(&model));
    }

    #[test]
    fn valid_model_short_circuits_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let model = make_valid_model(dir.path());
        let temp_root = dir.path().join("tmp");

        // The URL is unreachable; success proves no download was attempted.
        provision(DEAD_URL, &model, &temp_root, false).unwrap();
    }

    #[test]
    fn force_redownloads_even_when_valid() {
        let dir = tempfile::tempdir().unwrap();
        let model = make_valid_model(dir.path());
        let temp_root = dir.path().join("tmp");

        let err = provision(DEAD_URL, &model, &temp_root, true).unwrap_err();
        assert!(matches!(err, ProvisionError::Transport { .. }));
    }

    #[test]
    fn scratch_workspace_removed_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("model");
        let temp_root = dir.path().join("tmp");

        provision(DEAD_URL, &dest, &temp_root, false).unwrap_err();

        let leftovers: Vec<_> = fs::read_dir(&temp_root).unwrap().collect();
        assert!(leftovers.is_empty(), "scratch dir leaked: {:?}", leftovers);
    }

    #[tokio::test]
    async fn ensure_model_is_idempotent_for_valid_destination() {
        let dir = tempfile::tempdir().unwrap();
        let model = make_valid_model(dir.path());
        let temp_root = dir.path().join("tmp");

        ensure_model(DEAD_URL, &model, &temp_root, false).await.unwrap();
        ensure_model(DEAD_URL, &model, &temp_root, false).await.unwrap();
    }
}
