//! Default content transform

use crate::tags::{FlavorOrder, TagRenderer};
use async_trait::async_trait;
use rome_types::{BuildTarget, Error, Result, Transform};
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tracing::{debug, trace};

/// Bytes inspected when deciding whether a file is binary
const BINARY_SNIFF_LEN: usize = 8 * 1024;

/// Settings for [`BuildTagTransformer`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTagConfig {
    /// Token replaced with the build version
    pub version_token: String,
    /// Token replaced with the build flavor
    pub flavor_token: String,
    /// Flavors from lowest to highest
    pub flavor_order: Vec<String>,
}

impl Default for BuildTagConfig {
    fn default() -> Self {
        Self {
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

/// Writes the flavor/version specific rendition of a source file
///
/// Text files go through a [`TagRenderer`]; binary and non UTF-8 files are
/// copied byte for byte. Unix permission bits are carried over so scripts
/// stay executable.
#[derive(Debug, Clone, Default)]
pub struct BuildTagTransformer {
    renderer: TagRenderer,
}

impl BuildTagTransformer {
    /// Create a transformer with the given settings
    pub fn new(config: BuildTagConfig) -> Self {
        Self {
            renderer: TagRenderer::new(
                config.version_token,
                config.flavor_token,
                FlavorOrder::new(config.flavor_order),
            ),
        }
    }

    /// Renderer used for text files
    pub fn renderer(&self) -> &TagRenderer {
        &self.renderer
    }

    fn render_bytes(
        &self,
        source: &Path,
        destination: &Path,
        bytes: Vec<u8>,
        target: &BuildTarget,
    ) -> Result<Vec<u8>> {
        if is_binary(&bytes) {
            trace!("Copying binary file {}", source.display());
            return Ok(bytes);
        }

        match String::from_utf8(bytes) {
            Ok(text) => self
                .renderer
                .render(&text, target)
                .map(String::into_bytes)
                .map_err(|e| Error::transform(source, destination, e.to_string())),
            Err(e) => {
                trace!("Copying non UTF-8 file {}", source.display());
                Ok(e.into_bytes())
            }
        }
    }
}

#[async_trait]
impl Transform for BuildTagTransformer {
    async fn transform(
        &self,
        source: &Path,
        destination: &Path,
        target: &BuildTarget,
    ) -> Result<()> {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::transform(
                    source,
                    destination,
                    format!("Failed to create directory {}: {}", parent.display(), e),
                )
            })?;
        }

        let bytes = fs::read(source).await.map_err(|e| {
            Error::transform(source, destination, format!("Failed to read source: {}", e))
        })?;

        let output = self.render_bytes(source, destination, bytes, target)?;

        clear_stale_destination(source, destination).await?;
        fs::write(destination, &output).await.map_err(|e| {
            Error::transform(
                source,
                destination,
                format!("Failed to write destination: {}", e),
            )
        })?;

        preserve_permissions(source, destination).await?;

        debug!(
            "Built {} -> {} ({} bytes)",
            source.display(),
            destination.display(),
            output.len()
        );
        Ok(())
    }
}

fn is_binary(bytes: &[u8]) -> bool {
    bytes.iter().take(BINARY_SNIFF_LEN).any(|byte| *byte == 0)
}

/// Remove a link or read-only file left at `destination` by an earlier build
///
/// Writing through a link would land outside the destination tree, and a
/// read-only file copied from a read-only source cannot be rewritten.
async fn clear_stale_destination(source: &Path, destination: &Path) -> Result<()> {
    let metadata = match fs::symlink_metadata(destination).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(Error::transform(
                source,
                destination,
                format!("Failed to inspect destination: {}", e),
            ))
        }
    };

    let file_type = metadata.file_type();
    if !file_type.is_symlink() && !(file_type.is_file() && metadata.permissions().readonly()) {
        return Ok(());
    }

    trace!("Replacing stale {}", destination.display());
    match fs::remove_file(destination).await {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(Error::transform(
            source,
            destination,
            format!("Failed to replace stale destination: {}", e),
        )),
        _ => Ok(()),
    }
}

async fn preserve_permissions(source: &Path, destination: &Path) -> Result<()> {
    let metadata = fs::metadata(source).await.map_err(|e| {
        Error::transform(
            source,
            destination,
            format!("Failed to read source metadata: {}", e),
        )
    })?;

    fs::set_permissions(destination, metadata.permissions())
        .await
        .map_err(|e| {
            Error::transform(
                source,
                destination,
                format!("Failed to set permissions: {}", e),
            )
        })
}
