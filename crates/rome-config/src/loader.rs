//! Configuration loader utilities

use crate::{ConfigBuilder, ConfigError, ConfigResult, RomeConfig};
use std::path::{Path, PathBuf};

/// Environment prefix for overrides, e.g. `ROME__WORKERS__FILE_WORKERS=8`
pub const ENV_PREFIX: &str = "ROME";

/// Serialization format for `save_to_file` and `render`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// YAML document
    Yaml,
    /// TOML document
    Toml,
    /// Pretty printed JSON
    Json,
}

impl OutputFormat {
    /// Pick a format from a file extension, defaulting to YAML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::Toml,
            Some("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

/// Configuration loader with common loading patterns
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from the working directory and environment
    pub fn load_default() -> ConfigResult<RomeConfig> {
        let mut builder = ConfigBuilder::new();

        if let Some(path) = Self::find_default_config() {
            builder = builder.add_source_file(path);
        }

        builder.add_env_prefix(ENV_PREFIX).build()
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<RomeConfig> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "Configuration file not found",
                ),
            });
        }

        ConfigBuilder::new()
            .add_source_file(path)
            .add_env_prefix(ENV_PREFIX)
            .build()
    }

    /// Render a configuration in the given format
    pub fn render(config: &RomeConfig, format: OutputFormat) -> ConfigResult<String> {
        match format {
            OutputFormat::Yaml => {
                serde_yaml::to_string(config).map_err(|e| ConfigError::Serialization {
                    message: format!("Failed to serialize to YAML: {}", e),
                })
            }
            OutputFormat::Toml => {
                toml::to_string_pretty(config).map_err(|e| ConfigError::Serialization {
                    message: format!("Failed to serialize to TOML: {}", e),
                })
            }
            OutputFormat::Json => {
                serde_json::to_string_pretty(config).map_err(|e| ConfigError::Serialization {
                    message: format!("Failed to serialize to JSON: {}", e),
                })
            }
        }
    }

    /// Save configuration to a file, choosing the format from the extension
    pub fn save_to_file<P: AsRef<Path>>(config: &RomeConfig, path: P) -> ConfigResult<()> {
        let path = path.as_ref();
        let content = Self::render(config, OutputFormat::from_path(path))?;

        std::fs::write(path, content).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    /// Configuration file names searched in the working directory, in order
    fn get_default_config_paths() -> Vec<PathBuf> {
        vec![
            PathBuf::from("rome.yaml"),
            PathBuf::from("rome.yml"),
            PathBuf::from("rome.toml"),
            PathBuf::from(".rome.yaml"),
        ]
    }

    /// First configuration file that exists in the default locations
    fn find_default_config() -> Option<PathBuf> {
        Self::get_default_config_paths()
            .into_iter()
            .find(|path| path.exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case("saved.yaml")]
    #[case("saved.toml")]
    #[case("saved.json")]
    fn test_save_and_load(#[case] name: &str) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(name);

        let mut original = RomeConfig::default();
        original.skip.push("**/.git".to_string());
        original.build.flavor = Some("corp".to_string());
        ConfigLoader::save_to_file(&original, &config_path).unwrap();

        let loaded = ConfigLoader::load_from_file(&config_path).unwrap();
        assert_eq!(loaded.skip, original.skip);
        assert_eq!(loaded.build.flavor, original.build.flavor);
        assert_eq!(loaded.workers, original.workers);
    }

    #[test]
    fn test_load_missing_file() {
        let result = ConfigLoader::load_from_file("/nope/rome.yaml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_render_yaml_mentions_sections() {
        let text = ConfigLoader::render(&RomeConfig::default(), OutputFormat::Yaml).unwrap();
        assert!(text.contains("workers:"));
        assert!(text.contains("file_workers: 40"));
        assert!(text.contains("node_modules"));
    }

    #[test]
    fn test_output_format_from_path() {
        assert_eq!(OutputFormat::from_path(Path::new("a.toml")), OutputFormat::Toml);
        assert_eq!(OutputFormat::from_path(Path::new("a.json")), OutputFormat::Json);
        assert_eq!(OutputFormat::from_path(Path::new("a")), OutputFormat::Yaml);
    }
}
