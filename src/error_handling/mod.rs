//! Error types.
//!
//! Errors are split by how far they are allowed to travel:
//! - **Configuration** errors stop the process at startup
//! - **Parse** errors disqualify a single URL
//! - **Connect** and **probe** errors are counted and logged per server
//! - **Cookie** parse errors are logged and the cookie is dropped

mod types;

// Re-export public API
pub use types::{
    ConfigError, ConnectError, CookieParseError, InitializationError, ParseError, ProbeError,
};
