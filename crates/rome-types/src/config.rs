//! Configuration types for rome
//!
//! Validated newtypes for the pool sizes and queue capacities of a mirror run.

/// Worker pool size with validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "usize", into = "usize"))]
pub struct WorkerCount(usize);

impl WorkerCount {
    /// Minimum worker count
    pub const MIN: usize = 1;
    /// Maximum worker count
    pub const MAX: usize = 1024;
    /// Default number of file workers
    pub const DEFAULT_FILE: usize = 40;
    /// Default number of link workers
    pub const DEFAULT_LINK: usize = 5;

    /// Create a new worker count with validation
    pub fn new(count: usize) -> Result<Self, String> {
        if count < Self::MIN {
            Err(format!("Worker count {} is below minimum {}", count, Self::MIN))
        } else if count > Self::MAX {
            Err(format!("Worker count {} exceeds maximum {}", count, Self::MAX))
        } else {
            Ok(Self(count))
        }
    }

    /// Get the worker count value
    pub fn get(self) -> usize {
        self.0
    }

    /// Default size of the file worker pool
    pub fn default_file() -> Self {
        Self(Self::DEFAULT_FILE)
    }

    /// Default size of the link worker pool
    pub fn default_link() -> Self {
        Self(Self::DEFAULT_LINK)
    }
}

impl TryFrom<usize> for WorkerCount {
    type Error = String;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<WorkerCount> for usize {
    fn from(value: WorkerCount) -> Self {
        value.0
    }
}

/// Bounded queue capacity with validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "usize", into = "usize"))]
pub struct QueueCapacity(usize);

impl QueueCapacity {
    /// Minimum capacity
    pub const MIN: usize = 1;
    /// Maximum capacity
    pub const MAX: usize = 1_048_576;
    /// Default capacity of the file queue
    pub const DEFAULT_FILE: usize = 4096;
    /// Default capacity of the link queue
    pub const DEFAULT_LINK: usize = 2048;

    /// Create a new queue capacity with validation
    pub fn new(capacity: usize) -> Result<Self, String> {
        if capacity < Self::MIN {
            Err(format!(
                "Queue capacity {} is below minimum {}",
                capacity,
                Self::MIN
            ))
        } else if capacity > Self::MAX {
            Err(format!(
                "Queue capacity {} exceeds maximum {}",
                capacity,
                Self::MAX
            ))
        } else {
            Ok(Self(capacity))
        }
    }

    /// Get the capacity value
    pub fn get(self) -> usize {
        self.0
    }

    /// Default capacity of the file queue
    pub fn default_file() -> Self {
        Self(Self::DEFAULT_FILE)
    }

    /// Default capacity of the link queue
    pub fn default_link() -> Self {
        Self(Self::DEFAULT_LINK)
    }
}

impl TryFrom<usize> for QueueCapacity {
    type Error = String;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<QueueCapacity> for usize {
    fn from(value: QueueCapacity) -> Self {
        value.0
    }
}
