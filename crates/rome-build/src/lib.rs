//! Build collaborators for rome
//!
//! The mirror engine hands every regular file to a [`rome_types::Transform`]
//! and, when asked to, wipes the destination through a [`rome_types::Clean`].
//! This crate provides the default implementations:
//!
//! - **`BuildTagTransformer`**: keeps or drops flavor blocks, stamps the
//!   version and flavor tokens, copies binary files untouched
//! - **`DirectoryCleaner`**: removes an old build and recreates an empty root
//!
//! # Examples
//!
//! ```rust
//! use rome_build::{BuildTagTransformer, DirectoryCleaner};
//! use rome_types::{BuildTarget, Clean, Transform};
//! use std::path::Path;
//!
//! # async fn example() -> rome_types::Result<()> {
//! DirectoryCleaner::new().clean(Path::new("build")).await?;
//!
//! let transformer = BuildTagTransformer::default();
//! let target = BuildTarget::new("ent", "7.9.0.0");
//! transformer
//!     .transform(Path::new("src/version.php"), Path::new("build/version.php"), &target)
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod clean;
pub mod tags;
pub mod transform;

pub use clean::DirectoryCleaner;
pub use tags::{FlavorOrder, TagError, TagRenderer};
pub use transform::{BuildTagConfig, BuildTagTransformer};
