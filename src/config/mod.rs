//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (timeouts, limits, defaults)
//! - The JSON configuration file layout and its validation
//! - CLI option types and parsing

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{
    Config, ConfigFile, DestinationFile, LogFormat, LogLevel, LoginDestination, Opt,
    TlsVerification,
};
