use std::path::PathBuf;
use std::time::Duration;

use crate::bucket::validate_prefix;
use crate::{Error, Result};

const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Directory bucket files are created in. Created on open if missing.
    pub base_dir: PathBuf,
    /// Prepended to every bucket file name.
    pub prefix: String,
    /// Time between background flushes.
    pub flush_interval: Duration,
}

impl WriterConfig {
    pub fn new(base_dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            prefix: prefix.into(),
            flush_interval: DEFAULT_FLUSH_INTERVAL,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.flush_interval.is_zero() {
            return Err(Error::InvalidConfig(
                "flush_interval must be greater than zero".to_string(),
            ));
        }
        validate_prefix(&self.prefix)
    }
}
