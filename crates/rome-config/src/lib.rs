//! Configuration management for rome
//!
//! A `RomeConfig` is assembled from built-in defaults, an optional YAML or
//! TOML file and `ROME__*` environment variables, in that order. The command
//! line applies its own flags on top and then freezes the result into the
//! engine's immutable mirror configuration.
//!
//! # Examples
//!
//! ```rust
//! use rome_config::{ConfigBuilder, RomeConfig};
//!
//! let config = ConfigBuilder::new()
//!     .add_source_file("rome.yaml")
//!     .add_env_prefix("ROME")
//!     .build()
//!     .expect("Failed to load configuration");
//!
//! println!("File workers: {}", config.workers.file_workers.get());
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use rome_types::{QueueCapacity, WorkerCount};
use serde::{Deserialize, Serialize};

pub mod builder;
pub mod error;
pub mod loader;

pub use builder::ConfigBuilder;
pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, OutputFormat, ENV_PREFIX};

/// Main configuration structure for rome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RomeConfig {
    /// Directories excluded from the mirror, relative to the source root
    #[serde(default = "default_skip_rules")]
    pub skip: Vec<String>,
    /// Worker pool and queue sizing
    #[serde(default)]
    pub workers: WorkersConfig,
    /// Content transform settings
    #[serde(default)]
    pub build: BuildConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for RomeConfig {
    fn default() -> Self {
        Self {
            skip: default_skip_rules(),
            workers: WorkersConfig::default(),
            build: BuildConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Default skip rules: the root level `node_modules` directory
pub fn default_skip_rules() -> Vec<String> {
    vec!["node_modules".to_string()]
}

/// Worker pool and queue sizing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkersConfig {
    /// Number of file workers
    pub file_workers: WorkerCount,
    /// Capacity of the file job queue
    pub file_queue_capacity: QueueCapacity,
    /// Number of symlink workers
    pub link_workers: WorkerCount,
    /// Capacity of the symlink job queue
    pub link_queue_capacity: QueueCapacity,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            file_workers: WorkerCount::default_file(),
            file_queue_capacity: QueueCapacity::default_file(),
            link_workers: WorkerCount::default_link(),
            link_queue_capacity: QueueCapacity::default_link(),
        }
    }
}

/// Content transform settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Flavor used when none is given on the command line
    #[serde(default)]
    pub flavor: Option<String>,
    /// Token replaced by the build version
    pub version_token: String,
    /// Token replaced by the build flavor
    pub flavor_token: String,
    /// Flavors from lowest to highest; a flavor includes every lower one
    pub flavor_order: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            flavor: None,
            version_token: "@_SUGAR_VERSION".to_string(),
            flavor_token: "@_SUGAR_FLAV".to_string(),
            flavor_order: vec![
                "pro".to_string(),
                "corp".to_string(),
                "ent".to_string(),
                "ult".to_string(),
            ],
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Output format
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Text,
        }
    }
}
