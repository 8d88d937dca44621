//! Runtime configuration for a project's unload engine.
//!
//! ```toml
//! mailbox_capacity = 64
//! coalesce_delay_ms = 25
//! state_dir = ".idea/unloaded"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UnloaderConfig {
    /// Capacity of the project actor's request channel.
    #[serde(default = "UnloaderConfig::default_mailbox_capacity")]
    pub mailbox_capacity: usize,

    /// How long a scheduled recomputation waits for more changes before it runs.
    #[serde(default)]
    pub coalesce_delay_ms: u64,

    /// Buffer of the change-report broadcast channel.
    #[serde(default = "UnloaderConfig::default_change_feed_capacity")]
    pub change_feed_capacity: usize,

    /// Where the two snapshot documents live. Persistence is off when unset.
    #[serde(default)]
    pub state_dir: Option<PathBuf>,
}

impl UnloaderConfig {
    fn default_mailbox_capacity() -> usize {
        32
    }

    fn default_change_feed_capacity() -> usize {
        64
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn with_state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.state_dir = Some(dir.into());
        self
    }

    pub fn coalesce_delay(&self) -> Duration {
        Duration::from_millis(self.coalesce_delay_ms)
    }
}

impl Default for UnloaderConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: Self::default_mailbox_capacity(),
            coalesce_delay_ms: 0,
            change_feed_capacity: Self::default_change_feed_capacity(),
            state_dir: None,
        }
    }
}
