//! Raw byte access for tree files and images: local paths, HTTP(S) URLs and
//! gzip compressed variants of either.

use crate::error::StorageError;
use crate::store::format::{is_gzip, is_web_link};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs;
use std::io::{ErrorKind, Read, Write};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Fetch raw bytes from a URL or local path.
///
/// `Ok(None)` means the location does not exist (missing file or a non
/// success HTTP status); other failures are errors.
pub fn fetch_bytes(location: &str, timeout: Duration) -> Result<Option<Vec<u8>>, StorageError> {
    if is_web_link(location) {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        let response = client.get(location).send()?;
        if !response.status().is_success() {
            warn!(url = %location, status = %response.status(), "Remote fetch failed");
            return Ok(None);
        }
        let bytes = response.bytes()?;
        debug!(url = %location, bytes = bytes.len(), "Fetched remote file");
        return Ok(Some(bytes.to_vec()));
    }

    match fs::read(location) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StorageError::io(location, e)),
    }
}

/// Read a tree file, decompressing when the name carries a gzip suffix.
pub fn read_contents(filename: &str, timeout: Duration) -> Result<Option<Vec<u8>>, StorageError> {
    let Some(bytes) = fetch_bytes(filename, timeout)? else {
        return Ok(None);
    };
    if is_gzip(filename) {
        return gunzip(&bytes, filename).map(Some);
    }
    Ok(Some(bytes))
}

/// Write a tree file, compressing when the name carries a gzip suffix.
///
/// Refuses remote destinations, and refuses existing files unless
/// `overwrite` is set.
pub fn write_contents(filename: &str, bytes: &[u8], overwrite: bool) -> Result<(), StorageError> {
    if is_web_link(filename) {
        return Err(StorageError::RemoteWrite(filename.to_string()));
    }
    let path = Path::new(filename);
    if !overwrite && path.exists() {
        return Err(StorageError::AlreadyExists(filename.to_string()));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StorageError::io(parent.display().to_string(), e))?;
    }

    let payload = if is_gzip(filename) {
        gzip(bytes, filename)?
    } else {
        bytes.to_vec()
    };
    fs::write(path, payload).map_err(|e| StorageError::io(filename, e))?;
    debug!(file = %filename, bytes = bytes.len(), "Wrote tree file");
    Ok(())
}

pub fn file_exists(filename: &str) -> bool {
    !is_web_link(filename) && Path::new(filename).exists()
}

fn gunzip(bytes: &[u8], filename: &str) -> Result<Vec<u8>, StorageError> {
    let mut decoder = GzDecoder::new(bytes);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| StorageError::Decode(format!("{}: {}", filename, e)))?;
    Ok(out)
}

fn gzip(bytes: &[u8], filename: &str) -> Result<Vec<u8>, StorageError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(bytes)
        .map_err(|e| StorageError::Encode(format!("{}: {}", filename, e)))?;
    encoder
        .finish()
        .map_err(|e| StorageError::Encode(format!("{}: {}", filename, e)))
}
