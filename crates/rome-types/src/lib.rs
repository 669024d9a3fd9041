//! Core type system and error handling for rome
//!
//! This crate provides the foundational types shared by the rome crates:
//!
//! - **Error handling**: one error enum with kinds and severity levels, split
//!   between fatal startup errors and per-entry failures
//! - **Core types**: the build target, job kinds and run statistics
//! - **Traits**: the `Transform` and `Clean` collaborators the engine drives
//! - **Configuration**: validated worker counts and queue capacities
//!
//! # Features
//!
//! - `std` (default): Enable standard library features
//! - `serde`: Enable serialization support
//!
//! # Examples
//!
//! ```rust
//! use rome_types::{BuildTarget, MirrorStats, QueueCapacity, WorkerCount};
//!
//! let target = BuildTarget::new("ent", "7.9.0.0");
//! let workers = WorkerCount::new(8).unwrap();
//! let capacity = QueueCapacity::new(256).unwrap();
//! assert_eq!(workers.get() * capacity.get(), 2048);
//! assert_eq!(MirrorStats::new().completed(), 0);
//! assert_eq!(target.to_string(), "ent 7.9.0.0");
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{QueueCapacity, WorkerCount};
pub use error::{Error, ErrorKind, ErrorSeverity};
pub use result::Result;
pub use traits::*;
pub use types::*;
