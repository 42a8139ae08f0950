//! epgrab - TV guide grabber configuration and lineup management
//!
//! This library provides the configuration lifecycle for a Gracenote-backed
//! TV guide grabber: a versioned XML settings file with validation, type
//! coercion, deprecated-setting migration (backup then rewrite, with
//! rollback), lineup id normalization and auto-detection from ZIP/postal
//! codes, and unified cache/retention policy computation.
//!
//! # High-Level API
//!
//! Most callers go through [`config::ConfigManager`]:
//!
//! ```ignore
//! use epgrab::config::{ConfigManager, Overrides};
//!
//! let mut manager = ConfigManager::new(epgrab::config::config_file_path());
//! let settings = manager.load(&Overrides::default())?;
//!
//! let lineup = manager.lineup_config();
//! let retention = manager.retention_config();
//! ```

pub mod config;
pub mod error;
pub mod geocode;
pub mod lineup;
pub mod logging;
pub mod retention;

/// Version of the epgrab library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
