//! Download, extract and promote a model archive
//!
//! The installer owns the download-extract-move sequence for one
//! provisioning attempt. All intermediate artifacts land in the scratch
//! directory handed in by the provisioner; the installer never cleans up
//! after itself, so a failed attempt leaves the scratch contents in place
//! for the provisioner to remove wholesale.

use crate::error::ProvisionError;
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tar::Archive;

/// Filename for the downloaded archive inside the scratch directory
const ARCHIVE_NAME: &str = "model.tar.gz";

/// Subdirectory of scratch the archive is unpacked into
const EXTRACT_DIR: &str = "extracted";

/// RFC 1952 gzip member header magic
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Fetch `url` and install the contained model directory at `destination`
///
/// A non-2xx response is a hard failure; retries are the caller's call,
/// not this layer's.
pub fn install(url: &str, destination: &Path, scratch: &Path) -> Result<(), ProvisionError> {
    let archive_path = scratch.join(ARCHIVE_NAME);
    download(url, &archive_path)?;
    install_archive(&archive_path, destination, scratch)
}

/// Extract an already-downloaded archive and move its model root into place
pub fn install_archive(
    archive: &Path,
    destination: &Path,
    scratch: &Path,
) -> Result<(), ProvisionError> {
    let extract_dir = scratch.join(EXTRACT_DIR);
    extract(archive, &extract_dir)?;
    let model_root = find_model_root(&extract_dir)?;
    promote(&model_root, destination)
}

/// Stream the archive body to disk
fn download(url: &str, dest: &Path) -> Result<(), ProvisionError> {
    tracing::info!("Downloading model archive: {}", url);

    let response = ureq::get(url).call().map_err(|err| ProvisionError::Transport {
        url: url.to_string(),
        reason: err.to_string(),
    })?;

    let mut reader = response.into_reader();
    let mut file = File::create(dest)?;
    let bytes = io::copy(&mut reader, &mut file).map_err(|err| ProvisionError::Transport {
        url: url.to_string(),
        reason: format!("body transfer interrupted: {}", err),
    })?;

    tracing::debug!("Downloaded {:.1} MB to {:?}", bytes as f64 / 1_000_000.0, dest);
    Ok(())
}

/// Unpack the tar.gz into a fresh directory under scratch
fn extract(archive: &Path, into: &Path) -> Result<(), ProvisionError> {
    fs::create_dir_all(into)?;

    let mut tar_gz = File::open(archive)?;

    // Check the gzip magic up front. A server answering the archive URL
    // with an HTML error page, or a mirror shipping zip, would otherwise
    // fail deep inside the decoder with an opaque message.
    let mut magic = [0u8; 2];
    tar_gz
        .read_exact(&mut magic)
        .map_err(|_| ProvisionError::Extract("archive is empty or truncated".to_string()))?;
    if magic != GZIP_MAGIC {
        return Err(ProvisionError::Extract(
            "archive is not gzip-compressed (expected a .tar.gz model archive)".to_string(),
        ));
    }
    tar_gz.seek(SeekFrom::Start(0))?;

    let mut tar = Archive::new(GzDecoder::new(tar_gz));
    tar.unpack(into)
        .map_err(|err| ProvisionError::Extract(err.to_string()))?;

    tracing::debug!("Extracted archive into {:?}", into);
    Ok(())
}

/// Pick the model root among the immediate children of the extraction dir
///
/// Model archives wrap their content in a single top-level directory.
/// Only directory entries qualify; if several exist the lexicographically
/// first wins, so the choice does not depend on readdir order.
fn find_model_root(extract_dir: &Path) -> Result<PathBuf, ProvisionError> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(extract_dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false))
        .map(|entry| entry.path())
        .collect();

    dirs.sort();
    dirs.into_iter().next().ok_or(ProvisionError::NoModelRoot)
}

/// Move the extracted model root onto the destination path
///
/// Rename only. A cross-device boundary or an existing destination is
/// surfaced as an error rather than silently degraded to a copy.
fn promote(model_root: &Path, destination: &Path) -> Result<(), ProvisionError> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|source| ProvisionError::Install {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::rename(model_root, destination).map_err(|source| ProvisionError::Install {
        path: destination.to_path_buf(),
        source,
    })?;

    tracing::info!("Model installed at {:?}", destination);
    Ok(())
}
