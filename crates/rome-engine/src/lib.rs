//! Concurrent directory mirror engine for rome
//!
//! This crate mirrors a source tree into a destination tree. Every regular
//! file goes through a [`rome_types::Transform`], every symbolic link is
//! recreated with the same target string, and configured directories are
//! left out.
//!
//! # Features
//!
//! - **Bounded queues**: one for files, one for links, with backpressure on
//!   the walker when a pool falls behind
//! - **Two worker pools**: independently sized, draining their queue until it
//!   closes or the run is cancelled
//! - **Failure reporting**: per-entry failures never stop a run; they are
//!   collected into the [`MirrorReport`]
//! - **Skip rules**: root anchored directory paths or globs
//!
//! # Examples
//!
//! ```rust,no_run
//! use rome_engine::{Mirror, MirrorConfig, SkipRules};
//! use rome_types::{BuildTarget, Transform};
//! use std::sync::Arc;
//!
//! # async fn example(transform: Arc<dyn Transform>) -> rome_types::Result<()> {
//! let config = MirrorConfig::new("src", "build", BuildTarget::new("ent", "7.9.0.0"))
//!     .with_skip_rules(SkipRules::new(&["node_modules"])?);
//!
//! let mirror = Mirror::new(config, transform);
//! let report = mirror.run().await?;
//! println!("Built {} files", report.stats.entries);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod counter;
pub mod job;
pub mod mapping;
pub mod mirror;
pub mod pool;
pub mod queue;
pub mod report;
pub mod skip;
pub mod walker;

pub use counter::ProgressCounter;
pub use job::{FileJob, LinkJob};
pub use mapping::PathMapper;
pub use mirror::{CancelHandle, Mirror, MirrorConfig};
pub use queue::{bounded, JobReceiver, JobSender, QueueSnapshot, QueueStats};
pub use report::{JobFailure, MirrorReport, RunId};
pub use skip::SkipRules;
pub use walker::{WalkSummary, Walker};
