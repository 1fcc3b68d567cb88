//! Configuration
//!
//! `GraphMapConfig` gathers every tunable of the library. Values merge from
//! built-in defaults, an optional TOML file and `GRAPHMAP__*` environment
//! variables, in that order of precedence (lowest first).

pub mod facade;
pub mod merge;
pub mod sources;

pub use facade::ConfigLoader;

use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphMapConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub tiles: TileConfig,

    #[serde(default)]
    pub fetch: FetchConfig,
}

/// Disk tile cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache directory; None means the platform cache directory
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Maximum number of cached tiles
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,

    /// Tiles rendered by one populate sweep
    #[serde(default = "default_populate_limit")]
    pub populate_limit: usize,
}

fn default_cache_capacity() -> usize {
    1_000_000
}

fn default_populate_limit() -> usize {
    100_000
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: None,
            capacity: default_cache_capacity(),
            populate_limit: default_populate_limit(),
        }
    }
}

impl CacheConfig {
    /// Configured directory, or `<platform cache dir>/tiles`.
    pub fn resolve_dir(&self) -> Option<PathBuf> {
        if let Some(dir) = &self.dir {
            return Some(dir.clone());
        }
        directories::ProjectDirs::from("", "graphmap", "graphmap")
            .map(|dirs| dirs.cache_dir().join("tiles"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileConfig {
    #[serde(default = "default_resolution")]
    pub default_resolution: u32,

    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Deepest zoom level served, and visited when populating the cache
    #[serde(default = "default_max_zoom")]
    pub max_zoom: u32,
}

fn default_resolution() -> u32 {
    256
}

fn default_jpeg_quality() -> u8 {
    70
}

fn default_max_zoom() -> u32 {
    20
}

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            default_resolution: default_resolution(),
            jpeg_quality: default_jpeg_quality(),
            max_zoom: default_max_zoom(),
        }
    }
}

/// Remote fetch settings for tree files and web images
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Fetched images kept in memory per serializer
    #[serde(default = "default_image_cache_capacity")]
    pub image_cache_capacity: usize,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_image_cache_capacity() -> usize {
    1000
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            image_cache_capacity: default_image_cache_capacity(),
            timeout_secs: default_timeout_secs(),
        }
    }
}
