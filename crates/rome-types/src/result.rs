//! Result type alias for rome operations

use crate::Error;

/// Result type alias for rome operations
pub type Result<T> = std::result::Result<T, Error>;
