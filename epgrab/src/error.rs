//! Error taxonomy for the configuration subsystem.
//!
//! Fatal variants abort `ConfigManager::load()`; everything else is logged
//! and the load pipeline continues with a usable settings map.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file is not well-formed XML or has the wrong root element. Fatal.
    #[error("Cannot parse configuration file {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    /// zipcode and lineupid resolve to different locations. Fatal: the user's
    /// intent is ambiguous and must not be guessed.
    #[error(
        "Configuration mismatch: zipcode \"{zipcode}\" conflicts with lineupid \"{lineupid}\" \
         (contains {extracted}). Either use auto-detection with zipcode or ensure consistency."
    )]
    Consistency {
        zipcode: String,
        lineupid: String,
        extracted: String,
    },

    /// A required setting is missing or unusable. Fatal.
    #[error("{0}")]
    RequiredSetting(String),

    /// Backup or rewrite failed during migration. Recoverable: the load
    /// continues with the in-memory settings.
    #[error("Configuration migration failed: {0}")]
    Migration(String),

    /// Filesystem error while reading or materializing the config file.
    #[error("Configuration file I/O error: {0}")]
    Io(#[from] std::io::Error),
}
