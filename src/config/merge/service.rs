//! MergeService: orchestrates sources and deserializes to GraphMapConfig.

use crate::config::sources::{environment, file};
use crate::config::GraphMapConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};
use std::path::Path;

/// Merge service for config composition.
pub struct MergeService;

impl MergeService {
    /// Precedence: defaults (lowest) -> config file -> environment (highest).
    pub fn load(config_file: Option<&Path>) -> Result<GraphMapConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = match config_file {
            Some(path) => file::add_to_builder(builder, path)?,
            None => builder,
        };
        let builder = environment::add_to_builder(builder)?;

        builder.build()?.try_deserialize()
    }
}

fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let defaults = Config::try_from(&GraphMapConfig::default())?;
    Ok(Config::builder().add_source(defaults))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_defaults() {
        let config = MergeService::load(None).unwrap();
        assert_eq!(config.tiles.jpeg_quality, 70);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graphmap.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[cache]\ncapacity = 12\n\n[tiles]\nmax_zoom = 5").unwrap();

        let config = MergeService::load(Some(&path)).unwrap();
        assert_eq!(config.cache.capacity, 12);
        assert_eq!(config.tiles.max_zoom, 5);
        assert_eq!(config.cache.populate_limit, 100_000);
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(MergeService::load(Some(&dir.path().join("absent.toml"))).is_err());
    }
}
