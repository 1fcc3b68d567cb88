//! Tile Disk Cache
//!
//! Rendered tiles are stored as JPEG files under
//! `<dir>/<resolution>/<file>/<name>.jpg`, where both path segments are
//! sanitized and suffixed with a content hash. The cache holds at most
//! `capacity` files; storing past capacity removes one file chosen at
//! random. The in-memory count always equals the number of files on disk,
//! provided this instance is the only writer.

use crate::error::StorageError;
use crate::types::Canvas;
use image::codecs::jpeg::JpegEncoder;
use rand::seq::IndexedRandom;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Hex digits of the hash suffix in sanitized names.
const HASH_SUFFIX_LEN: usize = 16;

pub const DEFAULT_JPEG_QUALITY: u8 = 70;

/// Filesystem-safe, deterministic rendering of an arbitrary link.
///
/// Keeps the ASCII alphanumeric characters of `link` and appends a hash of
/// the whole link so distinct links never share a name in practice.
pub fn to_valid_filename(link: &str) -> String {
    let hash = blake3::hash(link.as_bytes()).to_hex();
    link.chars()
        .filter(char::is_ascii_alphanumeric)
        .chain(hash.as_str()[..HASH_SUFFIX_LEN].chars())
        .collect()
}

pub fn encode_jpeg(image: &Canvas, quality: u8) -> Result<Vec<u8>, StorageError> {
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality).encode_image(image)?;
    Ok(bytes)
}

/// Identity of a cached tile.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileKey {
    pub filename: String,
    pub node_name: String,
    pub resolution: u32,
}

impl TileKey {
    pub fn new(filename: impl Into<String>, node_name: impl Into<String>, resolution: u32) -> Self {
        TileKey {
            filename: filename.into(),
            node_name: node_name.into(),
            resolution,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub count: usize,
    pub dir: PathBuf,
    pub used_bytes: u64,
}

#[derive(Debug)]
pub struct TileCache {
    cache_dir: PathBuf,
    capacity: usize,
    cache_count: usize,
    jpeg_quality: u8,
}

impl TileCache {
    /// Open (creating if needed) the cache at `cache_dir`. The count starts
    /// at the number of files already on disk.
    pub fn open(cache_dir: impl Into<PathBuf>, capacity: usize) -> Result<Self, StorageError> {
        let cache_dir = cache_dir.into();
        let cache_count = if cache_dir.is_dir() {
            let count = count_files(&cache_dir);
            info!(dir = %cache_dir.display(), files = count, "Opened existing tile cache");
            count
        } else {
            fs::create_dir_all(&cache_dir)
                .map_err(|e| StorageError::io(cache_dir.display().to_string(), e))?;
            info!(dir = %cache_dir.display(), "Created tile cache directory");
            0
        };
        Ok(TileCache {
            cache_dir,
            capacity,
            cache_count,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        })
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn count(&self) -> usize {
        self.cache_count
    }

    pub fn tile_path(&self, key: &TileKey) -> PathBuf {
        self.cache_dir
            .join(key.resolution.to_string())
            .join(to_valid_filename(&key.filename))
            .join(format!("{}.jpg", to_valid_filename(&key.node_name)))
    }

    pub fn has_image(&self, key: &TileKey) -> bool {
        self.tile_path(key).is_file()
    }

    pub fn get_image(&self, key: &TileKey) -> Result<Canvas, StorageError> {
        let path = self.tile_path(key);
        let bytes = fs::read(&path).map_err(|e| StorageError::io(path.display().to_string(), e))?;
        Ok(image::load_from_memory(&bytes)?.to_rgb8())
    }

    /// Store `image` under `key`, evicting a random other tile when the
    /// cache grows past capacity.
    pub fn put_image(&mut self, image: &Canvas, key: &TileKey) -> Result<(), StorageError> {
        let path = self.tile_path(key);
        let is_new = !path.is_file();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| StorageError::io(parent.display().to_string(), e))?;
        }
        let bytes = encode_jpeg(image, self.jpeg_quality)?;
        fs::write(&path, bytes).map_err(|e| StorageError::io(path.display().to_string(), e))?;
        debug!(path = %path.display(), new = is_new, "Cached tile");

        if is_new {
            self.cache_count += 1;
        }
        while self.cache_count > self.capacity {
            self.remove_random(Some(&path))?;
        }
        Ok(())
    }

    /// Remove one file chosen at random, preferring files other than `keep`.
    pub fn remove_random(&mut self, keep: Option<&Path>) -> Result<(), StorageError> {
        let files = list_files(&self.cache_dir);
        let others: Vec<&PathBuf> = files
            .iter()
            .filter(|f| keep.map_or(true, |k| f.as_path() != k))
            .collect();
        let mut rng = rand::rng();
        let chosen = match others.choose(&mut rng) {
            Some(file) => (*file).clone(),
            None => match files.choose(&mut rng) {
                Some(file) => file.clone(),
                None => {
                    self.cache_count = 0;
                    return Ok(());
                }
            },
        };
        fs::remove_file(&chosen).map_err(|e| StorageError::io(chosen.display().to_string(), e))?;
        self.cache_count = self.cache_count.saturating_sub(1);
        debug!(path = %chosen.display(), "Evicted tile");
        Ok(())
    }

    /// Delete the whole cache directory and reset the count.
    pub fn cache_burst(&mut self) -> Result<String, StorageError> {
        let before = self.stats();
        match fs::remove_dir_all(&self.cache_dir) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(StorageError::io(self.cache_dir.display().to_string(), e)),
        }
        self.cache_count = 0;
        info!(dir = %self.cache_dir.display(), removed = before.count, "Cache burst");
        Ok(format!(
            "Had {} images in disk cache using {} bytes",
            before.count, before.used_bytes
        ))
    }

    pub fn count_files_on_disk(&self) -> usize {
        count_files(&self.cache_dir)
    }

    pub fn stats(&self) -> CacheStats {
        let used_bytes = WalkDir::new(&self.cache_dir)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| entry.metadata().ok())
            .map(|metadata| metadata.len())
            .sum();
        CacheStats {
            count: self.cache_count,
            dir: self.cache_dir.clone(),
            used_bytes,
        }
    }
}

fn list_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect()
}

fn count_files(dir: &Path) -> usize {
    list_files(dir).len()
}
