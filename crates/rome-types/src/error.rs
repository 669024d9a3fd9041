//! Error types and handling for rome
//!
//! Errors are split into two broad groups: fatal errors that stop a build
//! before (or while) the worker pools run, and per-entry errors that are
//! reported and counted but never abort a mirror run.

use std::path::PathBuf;

/// Error severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Low severity - operation can continue
    Low,
    /// Medium severity - a single entry failed, the run continues
    Medium,
    /// High severity - the run cannot start or must stop
    High,
    /// Critical severity - entire process should be terminated
    Critical,
}

/// Main error type for rome operations
#[derive(thiserror::Error, Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        /// Error message from the I/O operation
        message: String,
    },

    /// Source root does not exist or is not a directory
    #[error("Source path does not exist: {path}")]
    SourceNotFound {
        /// Configured source root
        path: PathBuf,
    },

    /// Source root exists but its listing cannot be read
    #[error("Source path '{path}' cannot be read: {message}")]
    SourceUnreadable {
        /// Configured source root
        path: PathBuf,
        /// Underlying reason
        message: String,
    },

    /// Destination root cannot be created or written
    #[error("Destination '{path}' is unavailable: {message}")]
    DestinationUnavailable {
        /// Configured destination root
        path: PathBuf,
        /// Underlying reason
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message describing the configuration issue
        message: String,
    },

    /// A skip rule could not be compiled
    #[error("Invalid skip rule '{pattern}': {message}")]
    InvalidSkipRule {
        /// The offending rule
        pattern: String,
        /// Compiler message
        message: String,
    },

    /// Content transform of a single file failed
    #[error("Failed to build '{source_path}' -> '{destination}': {message}")]
    Transform {
        /// File under the source root
        source_path: PathBuf,
        /// Mapped destination path
        destination: PathBuf,
        /// Underlying reason
        message: String,
    },

    /// Recreating a symbolic link failed
    #[error("Failed to link '{destination}' -> '{target}' (from '{link}'): {message}")]
    Link {
        /// Symlink under the source root
        link: PathBuf,
        /// Target string of the link
        target: PathBuf,
        /// Mapped destination path
        destination: PathBuf,
        /// Underlying reason
        message: String,
    },

    /// A directory could not be read during the walk
    #[error("Failed to walk '{path}': {message}")]
    Walk {
        /// Directory (or entry) that failed
        path: PathBuf,
        /// Underlying reason
        message: String,
    },

    /// Path does not live under the source root
    #[error("Path '{path}' is not under source root '{root}'")]
    PathMapping {
        /// Offending path
        path: PathBuf,
        /// Source root
        root: PathBuf,
    },

    /// Operation cancelled
    #[error("Operation cancelled")]
    Cancelled,

    /// Generic error with custom message
    #[error("{message}")]
    Other {
        /// Custom error message
        message: String,
    },
}

/// Error kind for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// I/O related errors
    Io,
    /// Startup errors about the source or destination roots
    Startup,
    /// Configuration and skip rule errors
    Config,
    /// File transform errors
    Transform,
    /// Symlink errors
    Link,
    /// Directory walk errors
    Walk,
    /// Path mapping errors
    PathMapping,
    /// Cancellation
    Cancelled,
    /// Other errors
    Other,
}

impl Error {
    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } => ErrorKind::Io,
            Self::SourceNotFound { .. }
            | Self::SourceUnreadable { .. }
            | Self::DestinationUnavailable { .. } => ErrorKind::Startup,
            Self::Config { .. } | Self::InvalidSkipRule { .. } => ErrorKind::Config,
            Self::Transform { .. } => ErrorKind::Transform,
            Self::Link { .. } => ErrorKind::Link,
            Self::Walk { .. } => ErrorKind::Walk,
            Self::PathMapping { .. } => ErrorKind::PathMapping,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Other { .. } => ErrorKind::Other,
        }
    }

    /// Get the error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Io { .. } => ErrorSeverity::Medium,
            Self::SourceNotFound { .. }
            | Self::SourceUnreadable { .. }
            | Self::DestinationUnavailable { .. } => ErrorSeverity::Critical,
            Self::Config { .. } | Self::InvalidSkipRule { .. } => ErrorSeverity::High,
            Self::Transform { .. } | Self::Link { .. } | Self::Walk { .. } => {
                ErrorSeverity::Medium
            }
            Self::PathMapping { .. } => ErrorSeverity::Medium,
            Self::Cancelled => ErrorSeverity::Low,
            Self::Other { .. } => ErrorSeverity::Medium,
        }
    }

    /// Whether the error must stop the whole run
    ///
    /// Per-entry failures (transform, link, walk, mapping) never are.
    pub fn is_fatal(&self) -> bool {
        self.severity() >= ErrorSeverity::High
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new transform error for one file
    pub fn transform<P1, P2, S>(source: P1, destination: P2, message: S) -> Self
    where
        P1: Into<PathBuf>,
        P2: Into<PathBuf>,
        S: Into<String>,
    {
        Self::Transform {
            source_path: source.into(),
            destination: destination.into(),
            message: message.into(),
        }
    }

    /// Create a new walk error
    pub fn walk<P: Into<PathBuf>, S: Into<String>>(path: P, message: S) -> Self {
        Self::Walk {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: error.to_string(),
        }
    }
}
