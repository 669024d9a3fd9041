//! Configuration builder for layered configuration loading

use crate::{ConfigError, ConfigResult, RomeConfig};
use config::{ConfigBuilder as ConfigBuilderInner, Environment, File, FileFormat};
use std::path::{Path, PathBuf};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Separates the prefix, sections and keys of environment overrides
const ENV_SEPARATOR: &str = "__";

/// Configuration builder for loading configuration from multiple sources
#[derive(Debug)]
pub struct ConfigBuilder {
    inner: ConfigBuilderInner<config::builder::DefaultState>,
    sources: Vec<ConfigSource>,
}

#[derive(Debug, Clone)]
enum ConfigSource {
    File { path: PathBuf, format: FileFormat },
    Environment { prefix: String },
}

impl ConfigBuilder {
    /// Create a new configuration builder; built-in defaults are always the
    /// lowest layer
    pub fn new() -> Self {
        Self {
            inner: config::Config::builder(),
            sources: Vec::new(),
        }
    }

    /// Add a configuration file source; missing files are ignored
    pub fn add_source_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let format = Self::detect_format(&path);
        self.sources.push(ConfigSource::File { path, format });
        self
    }

    /// Add environment variable source with prefix
    pub fn add_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.sources.push(ConfigSource::Environment {
            prefix: prefix.into(),
        });
        self
    }

    /// Build the configuration
    pub fn build(mut self) -> ConfigResult<RomeConfig> {
        let defaults_value = serde_yaml::to_value(RomeConfig::default())
            .map_err(|e| ConfigError::other(format!("Failed to serialize defaults: {}", e)))?;
        self.inner = self
            .inner
            .add_source(config::Config::try_from(&defaults_value)?);

        for source in &self.sources {
            match source {
                ConfigSource::File { path, format } => {
                    if path.exists() {
                        self.inner = self
                            .inner
                            .add_source(File::from(path.clone()).format(*format));
                    }
                }
                ConfigSource::Environment { prefix } => {
                    self.inner = self.inner.add_source(
                        Environment::with_prefix(prefix)
                            .prefix_separator(ENV_SEPARATOR)
                            .separator(ENV_SEPARATOR)
                            .try_parsing(true)
                            .list_separator(",")
                            .with_list_parse_key("skip")
                            .with_list_parse_key("build.flavor_order"),
                    );
                }
            }
        }

        let config = self.inner.build()?;
        let result: RomeConfig = config.try_deserialize()?;

        Self::validate(&result)?;

        Ok(result)
    }

    /// Detect file format from extension
    fn detect_format(path: &Path) -> FileFormat {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            Some("toml") => FileFormat::Toml,
            Some("json") => FileFormat::Json,
            _ => FileFormat::Yaml,
        }
    }

    /// Validate the configuration
    ///
    /// Pool sizes are range checked when deserialized; skip rules are
    /// compiled by the engine, so only emptiness is checked here.
    pub fn validate(config: &RomeConfig) -> ConfigResult<()> {
        if let Some(rule) = config.skip.iter().find(|rule| rule.trim().is_empty()) {
            return Err(ConfigError::validation(format!(
                "Skip rules must not be empty (got {:?})",
                rule
            )));
        }

        if config.build.version_token.is_empty() || config.build.flavor_token.is_empty() {
            return Err(ConfigError::validation(
                "Version and flavor tokens must not be empty",
            ));
        }

        if config.build.flavor_order.is_empty() {
            return Err(ConfigError::validation(
                "Flavor order must list at least one flavor",
            ));
        }

        if !LOG_LEVELS.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::validation(
                "Log level must be one of: trace, debug, info, warn, error",
            ));
        }

        Ok(())
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
