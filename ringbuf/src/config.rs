//! Construction-time configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Behaviour of `put` when the buffer is at capacity.
///
/// The policy also decides what `get` does on an empty buffer: only
/// [`FullPolicy::Block`] waits, the others report `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FullPolicy {
    /// Fail with [`Error::BufferFull`] and leave the buffer untouched.
    #[default]
    Reject,
    /// Drop the oldest element to make room.
    Overwrite,
    /// Wait for space; `get` waits for data.
    Block,
}

impl FullPolicy {
    /// Returns the lowercase policy name.
    pub fn as_str(&self) -> &'static str {
        match self {
            FullPolicy::Reject => "reject",
            FullPolicy::Overwrite => "overwrite",
            FullPolicy::Block => "block",
        }
    }

    /// Returns true if full and empty conditions suspend the caller.
    pub fn is_blocking(&self) -> bool {
        matches!(self, FullPolicy::Block)
    }
}

impl fmt::Display for FullPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FullPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(FullPolicy::Reject),
            "overwrite" => Ok(FullPolicy::Overwrite),
            "block" => Ok(FullPolicy::Block),
            _ => Err(Error::InvalidArgument(
                "full policy must be one of reject, overwrite, block",
            )),
        }
    }
}

/// Ring buffer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Number of slots. Must be greater than zero.
    pub capacity: usize,
    /// Full-buffer policy.
    #[serde(default)]
    pub full_policy: FullPolicy,
}

impl Config {
    /// Creates a config with the given capacity and the reject policy.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            full_policy: FullPolicy::default(),
        }
    }

    /// Sets the full-buffer policy.
    pub fn full_policy(mut self, policy: FullPolicy) -> Self {
        self.full_policy = policy;
        self
    }

    /// Checks the config without building a buffer.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::InvalidArgument("capacity must be greater than 0"));
        }
        Ok(())
    }
}
