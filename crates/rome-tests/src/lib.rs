//! Integration test support for rome
//!
//! The end to end scenarios live in `tests/`; this crate holds the fixtures
//! they share.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Unified test utilities
///
/// Fixture trees, tree snapshots and test transforms used across the
/// integration tests.
pub mod test_utils;
