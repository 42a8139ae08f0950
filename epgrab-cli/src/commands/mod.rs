//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (get, list, path, upgrade)
//! - [`lineup`] - Lineup detection test for a postal/ZIP code
//! - [`load`] - Load and validate the configuration, printing a summary

pub mod config;
pub mod lineup;
pub mod load;
