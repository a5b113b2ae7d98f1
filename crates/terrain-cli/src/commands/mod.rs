//! Subcommand implementations.

pub mod convert;
pub mod inspect;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};
use terrain_mesh::ConversionConfig;
use tracing::info;

/// Start from the TOML file if one was given, otherwise from defaults.
pub fn base_config(config: Option<&Path>) -> Result<ConversionConfig> {
    match config {
        Some(path) => {
            let config = ConversionConfig::from_toml_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            info!(path = %path.display(), "Loaded configuration");
            Ok(config)
        }
        None => Ok(ConversionConfig::default()),
    }
}
