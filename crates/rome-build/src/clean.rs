//! Destination pre-clean

use async_trait::async_trait;
use rome_types::{Clean, Error, Result};
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

/// Removes an existing build and leaves an empty destination root
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryCleaner;

impl DirectoryCleaner {
    /// Create a new cleaner
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Clean for DirectoryCleaner {
    async fn clean(&self, destination: &Path) -> Result<()> {
        match fs::symlink_metadata(destination).await {
            Ok(metadata) if metadata.is_dir() => {
                fs::remove_dir_all(destination).await.map_err(|e| {
                    Error::DestinationUnavailable {
                        path: destination.to_path_buf(),
                        message: format!("Failed to delete directory: {}", e),
                    }
                })?;
            }
            Ok(_) => {
                return Err(Error::DestinationUnavailable {
                    path: destination.to_path_buf(),
                    message: "Destination exists and is not a directory".to_string(),
                });
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Nothing to clean at {}", destination.display());
            }
            Err(e) => {
                return Err(Error::DestinationUnavailable {
                    path: destination.to_path_buf(),
                    message: e.to_string(),
                });
            }
        }

        fs::create_dir_all(destination)
            .await
            .map_err(|e| Error::DestinationUnavailable {
                path: destination.to_path_buf(),
                message: format!("Failed to recreate directory: {}", e),
            })?;

        info!("Cleaned {}", destination.display());
        Ok(())
    }
}
