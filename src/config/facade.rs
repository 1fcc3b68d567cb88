//! ConfigLoader facade delegating to merge service.

use super::merge::service::MergeService;
use super::GraphMapConfig;
use crate::error::ApiError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load defaults, the optional file, then the environment overlay.
    pub fn load(config_file: Option<&Path>) -> Result<GraphMapConfig, ApiError> {
        Ok(MergeService::load(config_file)?)
    }

    /// Create default configuration.
    pub fn default() -> GraphMapConfig {
        GraphMapConfig::default()
    }
}
