use crate::error::{FieldworkError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Store-imposed ceiling on operations per atomic transaction.
pub const MAX_BATCH_SIZE: usize = 500;

/// Not-home attempts after which a unit counts as completed.
pub const DEFAULT_MAX_TRIES: i64 = 2;

/// Lifetime of a newly created link session, in hours.
pub const DEFAULT_EXPIRY_HOURS: u32 = 24;

/// Configuration for the progress engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Maximum operations per committed batch (default: 500)
    ///
    /// One slot is kept as headroom, so each partition carries at most
    /// `max_batch_size - 1` operations.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Congregation max-tries setting (default: 2)
    #[serde(default = "default_max_tries")]
    pub max_tries: i64,

    /// Default link expiry in hours (default: 24)
    #[serde(default = "default_expiry_hours")]
    pub expiry_hours: u32,

    /// Origin label stamped on policies (usually the app's public URL)
    #[serde(default)]
    pub origin: String,
}

fn default_max_batch_size() -> usize {
    MAX_BATCH_SIZE
}

fn default_max_tries() -> i64 {
    DEFAULT_MAX_TRIES
}

fn default_expiry_hours() -> u32 {
    DEFAULT_EXPIRY_HOURS
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_batch_size: default_max_batch_size(),
            max_tries: default_max_tries(),
            expiry_hours: default_expiry_hours(),
            origin: String::new(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_max_batch_size(mut self, max: usize) -> Self {
        self.max_batch_size = max;
        self
    }

    pub fn with_max_tries(mut self, tries: i64) -> Self {
        self.max_tries = tries;
        self
    }

    pub fn with_expiry_hours(mut self, hours: u32) -> Self {
        self.expiry_hours = hours;
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Operations allowed in a single partition.
    pub fn partition_capacity(&self) -> usize {
        self.max_batch_size.saturating_sub(1)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_batch_size < 2 {
            return Err(FieldworkError::Config(format!(
                "max_batch_size must be at least 2, got {}",
                self.max_batch_size
            )));
        }
        if self.max_tries < 1 {
            return Err(FieldworkError::Config(format!(
                "max_tries must be at least 1, got {}",
                self.max_tries
            )));
        }
        Ok(())
    }
}
