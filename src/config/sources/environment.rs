//! Environment variable source: GRAPHMAP__* prefix with __ separator

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Add environment variable overlay to builder.
/// `GRAPHMAP__CACHE__CAPACITY=10` sets `cache.capacity`.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let builder = builder.add_source(
        Environment::with_prefix("GRAPHMAP")
            .separator("__")
            .try_parsing(true),
    );
    Ok(builder)
}
