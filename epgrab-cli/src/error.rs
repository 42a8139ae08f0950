//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use epgrab::error::ConfigError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(ConfigError),
    /// Postal/ZIP code in no recognized format
    InvalidPostal(String),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Config(ConfigError::Consistency { .. }) => {
                eprintln!();
                eprintln!("To fix, either:");
                eprintln!("  1. Set lineupid to 'auto' and keep your zipcode, or");
                eprintln!("  2. Make the zipcode match the location in the lineupid");
            }
            CliError::InvalidPostal(_) => {
                eprintln!();
                eprintln!("Expected formats:");
                eprintln!("  - US ZIP code: 90210");
                eprintln!("  - Canadian postal: J3B1M4 or J3B 1M4");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::InvalidPostal(code) => {
                write!(f, "Invalid postal/ZIP code format: {}", code)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e)
    }
}
