//! Pipeline configuration
//!
//! Config is resolved in three layers, later layers winning:
//! 1. Embedded defaults (compiled into binary from `config/northstar.toml`)
//! 2. Override file: an explicit path, or `<data dir>/northstar/config.toml`
//! 3. Environment variables (`NORTHSTAR_MAX_PAYLOAD_BYTES`, `NORTHSTAR_MAX_ISSUES`)

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/northstar.toml");

/// Environment variable overriding the dataset payload ceiling
pub const MAX_PAYLOAD_ENV: &str = "NORTHSTAR_MAX_PAYLOAD_BYTES";

/// Environment variable overriding the validation issue cap
pub const MAX_ISSUES_ENV: &str = "NORTHSTAR_MAX_ISSUES";

/// Default dataset payload ceiling (10 MiB)
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Default number of validation issues returned per import
pub const DEFAULT_MAX_ISSUES: usize = 20;

/// Limits applied by the import pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Serialized dataset JSON above this size is rejected before validation
    pub max_payload_bytes: usize,
    /// Row warnings stop accumulating once this many issues are recorded
    pub max_issues: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            max_issues: DEFAULT_MAX_ISSUES,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    import: ImportSection,
}

#[derive(Debug, Default, Deserialize)]
struct ImportSection {
    max_payload_bytes: Option<usize>,
    max_issues: Option<usize>,
}

impl PipelineConfig {
    /// Load config with full resolution (defaults, override file, environment)
    ///
    /// An explicit `path` must exist; the data-dir override is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::from_toml(DEFAULT_CONFIG)?;

        match path {
            Some(path) => {
                let content = fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                config.apply_toml(&content)?;
                info!("Loaded pipeline config from {}", path.display());
            }
            None => {
                if let Some(default_path) = Self::override_path().filter(|p| p.exists()) {
                    let content = fs::read_to_string(&default_path)?;
                    config.apply_toml(&content)?;
                    info!("Loaded pipeline config from {}", default_path.display());
                }
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok())?;
        debug!(
            max_payload_bytes = config.max_payload_bytes,
            max_issues = config.max_issues,
            "Pipeline config resolved"
        );
        Ok(config)
    }

    /// Parse a TOML document on top of the built-in defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config = Self::default();
        config.apply_toml(content)?;
        Ok(config)
    }

    /// Location of the optional override file in the platform data dir
    pub fn override_path() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("northstar").join("config.toml"))
    }

    fn apply_toml(&mut self, content: &str) -> Result<()> {
        let file: ConfigFile =
            toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))?;

        if let Some(bytes) = file.import.max_payload_bytes {
            self.max_payload_bytes = bytes;
        }
        if let Some(issues) = file.import.max_issues {
            self.max_issues = issues;
        }
        Ok(())
    }

    /// Apply environment-style overrides from a key lookup
    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(MAX_PAYLOAD_ENV) {
            self.max_payload_bytes = parse_limit(MAX_PAYLOAD_ENV, &raw)?;
        }
        if let Some(raw) = lookup(MAX_ISSUES_ENV) {
            self.max_issues = parse_limit(MAX_ISSUES_ENV, &raw)?;
        }
        Ok(())
    }
}

fn parse_limit(key: &str, raw: &str) -> Result<usize> {
    raw.trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} must be a positive integer, got '{}'", key, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_embedded_defaults_match_constants() {
        let config = PipelineConfig::from_toml(DEFAULT_CONFIG).unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.max_payload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.max_issues, 20);
    }

    #[test]
    fn test_partial_override_keeps_other_defaults() {
        let config = PipelineConfig::from_toml("[import]\nmax_issues = 5\n").unwrap();
        assert_eq!(config.max_issues, 5);
        assert_eq!(config.max_payload_bytes, DEFAULT_MAX_PAYLOAD_BYTES);
    }

    #[test]
    fn test_empty_document_is_defaults() {
        let config = PipelineConfig::from_toml("").unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = PipelineConfig::from_toml("[import\nmax_issues = ");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_env_overrides_win() {
        let env: HashMap<&str, &str> =
            HashMap::from([(MAX_ISSUES_ENV, "3"), (MAX_PAYLOAD_ENV, " 2048 ")]);
        let mut config = PipelineConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.max_issues, 3);
        assert_eq!(config.max_payload_bytes, 2048);
    }

    #[test]
    fn test_env_override_rejects_garbage() {
        let mut config = PipelineConfig::default();
        let result = config.apply_overrides(|key| {
            (key == MAX_ISSUES_ENV).then(|| "twenty".to_string())
        });
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[import]\nmax_payload_bytes = 4096").unwrap();

        let config = PipelineConfig::load(Some(file.path())).unwrap();
        // Env vars could be set by the caller's shell; only assert when absent
        if std::env::var(MAX_PAYLOAD_ENV).is_err() {
            assert_eq!(config.max_payload_bytes, 4096);
        }
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let result = PipelineConfig::load(Some(Path::new("/nonexistent/northstar.toml")));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
