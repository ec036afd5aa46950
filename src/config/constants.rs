//! Configuration constants.
//!
//! This module defines the defaults used when the configuration file leaves a
//! value out, plus the fixed limits of the hand-rolled HTTP client.

/// Seconds between two connection checks
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 30;

/// Socket timeout in milliseconds (7.5s)
/// Applied to connect, TLS handshake, every write and every read
pub const DEFAULT_SOCKET_TIMEOUT_MS: u64 = 7_500;

// Redirect handling
/// Maximum number of redirect hops to follow
/// Prevents infinite redirect loops between portal pages
pub const MAX_REDIRECT_HOPS: usize = 10;

/// Number of ticks to skip after a failed login attempt
pub const DEFAULT_GRACE_TICKS: u32 = 10;

/// Periodic report interval in seconds (one hour)
pub const DEFAULT_REPORT_INTERVAL_SECS: u64 = 60 * 60;

// Response head limits
/// Size of a single socket read
pub const READ_CHUNK_SIZE: usize = 4096;
/// Maximum response head size in bytes (16KB)
/// Reading stops here even if the blank line ending the headers was not seen
pub const MAX_RESPONSE_HEAD_SIZE: usize = 16 * 1024;

/// Default port for plain HTTP
pub const HTTP_DEFAULT_PORT: u16 = 80;
/// Default port for HTTPS
pub const HTTPS_DEFAULT_PORT: u16 = 443;

/// Form content type used for POST logins
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
