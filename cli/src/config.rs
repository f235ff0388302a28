use std::path::{Path, PathBuf};

use scenepack_core::{DEFAULT_MAX_CONCURRENT_WRITES, PackOptions};
use serde::Deserialize;

/// Top-level configuration loaded from `scenepack.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub export: ExportConfig,
}

/// Defaults for `scenepack pack`. Command line flags take precedence.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Sidecar directory, relative to the working directory.
    pub output_dir: PathBuf,
    pub path_prefix: String,
    pub final_export: bool,
    pub max_concurrent_writes: usize,
    pub compute_missing_bounds: bool,
    /// Remove sidecars the export did not write.
    pub clean_stale: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("geometries"),
            path_prefix: String::new(),
            final_export: false,
            max_concurrent_writes: DEFAULT_MAX_CONCURRENT_WRITES,
            compute_missing_bounds: false,
            clean_stale: false,
        }
    }
}

impl ExportConfig {
    pub fn pack_options(&self) -> PackOptions {
        PackOptions::default()
            .with_final_export(self.final_export)
            .with_path_prefix(self.path_prefix.clone())
            .with_max_concurrent_writes(self.max_concurrent_writes)
            .with_compute_missing_bounds(self.compute_missing_bounds)
    }
}

/// Load a config from a TOML file.
///
/// Returns `Err` with a human-readable message if the file cannot be read
/// or parsed.
pub fn load_config(path: &Path) -> Result<Config, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    parse_config(&content).map_err(|e| format!("failed to parse {}: {e}", path.display()))
}

fn parse_config(content: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(content)
}

/// Load the config, falling back to defaults if the file is missing.
///
/// A file that exists but fails to parse is an error.
pub fn load_or_default(path: &Path) -> Result<Config, String> {
    if !path.exists() {
        log::debug!("No config at {}, using defaults", path.display());
        return Ok(Config::default());
    }
    let config = load_config(path)?;
    log::info!("Loaded config from {}", path.display());
    Ok(config)
}
