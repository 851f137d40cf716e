/// Session configuration.
///
/// Every field has a default, so a config file only needs to name the
/// settings it changes. Hosts typically load a file and then apply their
/// own overrides (command-line flags) on top.
use crate::transfer::DEFAULT_ARCHIVE_NAME;

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Maximum number of events that may queue up in the session channel.
///
/// A host that stops draining stalls the worker at this depth rather than
/// letting progress messages grow without bound.
pub const EVENT_CHANNEL_CAPACITY: usize = 4_096;

/// Where the `folder_XXXXX` destination is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationPlacement {
    /// Next to the source directory, in its parent.
    #[default]
    Sibling,
    /// Directly inside the source directory.
    Inside,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub placement: DestinationPlacement,
    /// File name of the archive written when compressing.
    pub archive_name: String,
    /// Open the destination in the platform file browser on success.
    pub reveal_on_complete: bool,
    pub event_channel_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            placement: DestinationPlacement::default(),
            archive_name: DEFAULT_ARCHIVE_NAME.to_string(),
            reveal_on_complete: true,
            event_channel_capacity: EVENT_CHANNEL_CAPACITY,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl SessionConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the session cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let name = Path::new(&self.archive_name);
        if self.archive_name.is_empty()
            || name.file_name().map(|n| n != name.as_os_str()).unwrap_or(true)
        {
            return Err(ConfigError::Invalid(format!(
                "archive_name `{}` must be a plain file name",
                self.archive_name
            )));
        }
        if self.event_channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "event_channel_capacity must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
