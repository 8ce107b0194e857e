use crate::error::{ConvertError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Settings for the postcodes.io lookup client.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub base_url: String,
    pub cache_dir: PathBuf,
    /// Postcode-to-county associations are effectively static, so cached
    /// responses stay valid for a long time.
    pub cache_ttl_days: i64,
    pub timeout_secs: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.postcodes.io".to_string(),
            cache_dir: PathBuf::from(".cache/postcodes"),
            cache_ttl_days: 365,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Upper bound on rows processed concurrently.
    pub max_in_flight: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { max_in_flight: 32 }
    }
}

impl Config {
    /// Loads configuration from `path`. When no path is given, a missing
    /// `config.toml` falls back to defaults; an explicitly requested file
    /// must exist and parse.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (p, true),
            None => (Path::new(DEFAULT_CONFIG_PATH), false),
        };

        let mut config = match fs::read_to_string(path) {
            Ok(contents) => toml::from_str::<Config>(&contents)?,
            Err(err) if !required && err.kind() == std::io::ErrorKind::NotFound => Config::default(),
            Err(err) => {
                return Err(ConvertError::Config(format!(
                    "Failed to read config file '{}': {}",
                    path.display(),
                    err
                )))
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// `CASC_POSTCODES_URL` overrides the configured lookup endpoint.
    fn apply_env_overrides(&mut self) {
        match std::env::var("CASC_POSTCODES_URL") {
            Ok(v) if !v.trim().is_empty() => self.resolver.base_url = v,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_postcodes_io() {
        let config = Config::default();
        assert_eq!(config.resolver.base_url, "https://api.postcodes.io");
        assert_eq!(config.resolver.cache_ttl_days, 365);
        assert_eq!(config.pipeline.max_in_flight, 32);
    }

    #[test]
    fn partial_file_keeps_defaults_for_the_rest() {
        let config: Config = toml::from_str(
            r#"
            [pipeline]
            max_in_flight = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.pipeline.max_in_flight, 4);
        assert_eq!(config.resolver.base_url, "https://api.postcodes.io");
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let err = Config::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConvertError::Config(_)));
    }

    // The only test that touches CASC_POSTCODES_URL, so the process-global
    // environment cannot race under the parallel test runner.
    #[test]
    fn env_var_overrides_the_lookup_endpoint() {
        std::env::set_var("CASC_POSTCODES_URL", "http://localhost:8123");
        let mut overridden = Config::default();
        overridden.apply_env_overrides();

        std::env::set_var("CASC_POSTCODES_URL", "   ");
        let mut blank = Config::default();
        blank.apply_env_overrides();
        std::env::remove_var("CASC_POSTCODES_URL");

        assert_eq!(overridden.resolver.base_url, "http://localhost:8123");
        // A blank value leaves the configured endpoint alone.
        assert_eq!(blank.resolver.base_url, "https://api.postcodes.io");
    }
}
