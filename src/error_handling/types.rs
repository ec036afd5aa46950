//! Error type definitions.
//!
//! This module defines all error types used throughout the application.

use std::io;

use log::SetLoggerError;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error building the TLS client configuration.
    #[error("TLS configuration error: {0}")]
    TlsConfigError(#[from] rustls::Error),
}

/// Errors raised while loading the configuration file.
///
/// All of these are fatal at startup: the monitor refuses to run with an
/// incomplete configuration rather than probing with guessed values.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Unable to read configuration file {path}: {source}")]
    Read {
        /// Path that was attempted
        path: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The configuration file is not valid JSON for the expected layout.
    #[error("Invalid configuration syntax: {0}")]
    Parse(#[from] serde_json::Error),

    /// A required field is absent.
    #[error("Missing required configuration field '{0}'")]
    MissingField(&'static str),

    /// A field is present but its value cannot be used.
    #[error("Invalid value for configuration field '{field}': {reason}")]
    InvalidField {
        /// Field name as written in the configuration file
        field: &'static str,
        /// Human-readable cause
        reason: String,
    },

    /// Every entry of `urls_to_check` was malformed.
    #[error("None of the configured urls_to_check could be parsed")]
    NoUsableProbeUrls,
}

/// Errors raised by the URL descriptor parser.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The URL does not start with `http://` or `https://`.
    #[error("Unsupported or missing scheme in '{0}'")]
    UnsupportedScheme(String),

    /// Nothing between the scheme and the port/path.
    #[error("Missing host in '{0}'")]
    MissingHost(String),

    /// The host is an IPv6 literal or contains brackets.
    #[error("Unsupported host in '{0}'")]
    InvalidHost(String),

    /// The `:port` part is not a number in `1..=65535`.
    #[error("Invalid port '{port}' in '{line}'")]
    InvalidPort {
        /// Offending URL
        line: String,
        /// Port text as found in the URL
        port: String,
    },
}

/// Connection-level failures (DNS, TCP, TLS, I/O, timeout).
///
/// These are recoverable: the monitor counts them and moves on to the next
/// probe server.
#[derive(Error, Debug)]
pub enum ConnectError {
    /// Host name resolution failed or returned no address.
    #[error("Unable to resolve {host}: {source}")]
    Resolve {
        /// Host that was looked up
        host: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// TCP connection refused or unreachable.
    #[error("Unable to connect to {host}:{port}: {source}")]
    Connect {
        /// Target host
        host: String,
        /// Target port
        port: u16,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// TLS handshake failed or the host is not a valid TLS server name.
    #[error("TLS handshake with {host} failed: {reason}")]
    Tls {
        /// Target host
        host: String,
        /// Handshake failure description
        reason: String,
    },

    /// Reading or writing the established connection failed.
    #[error("I/O error talking to {host}: {source}")]
    Io {
        /// Target host
        host: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// A socket operation did not finish within the I/O timeout.
    #[error("Timed out during {stage} with {host} after {timeout_ms}ms")]
    Timeout {
        /// Target host
        host: String,
        /// Which step timed out (resolve, connect, handshake, write, read, close)
        stage: &'static str,
        /// Timeout that elapsed, in milliseconds
        timeout_ms: u128,
    },
}

/// A `Set-Cookie` value that does not start with a `name=value` pair.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CookieParseError {
    /// No `=` before the first `;`.
    #[error("no '=' separator")]
    MissingSeparator,

    /// The cookie name is empty.
    #[error("empty cookie name")]
    EmptyName,

    /// The cookie value is empty.
    #[error("empty cookie value")]
    EmptyValue,
}

/// Failure of a single probe, redirect hop, or login request.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The connection could not be established or broke mid-exchange.
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// A `Location` header held a URL that cannot be followed.
    #[error("Unable to follow redirect: {0}")]
    Redirect(#[from] ParseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_messages_name_the_field() {
        let err = ConfigError::MissingField("detect_redirect_to");
        assert_eq!(
            err.to_string(),
            "Missing required configuration field 'detect_redirect_to'"
        );

        let err = ConfigError::InvalidField {
            field: "destination.method",
            reason: "expected POST or GET".to_string(),
        };
        assert!(err.to_string().contains("destination.method"));
        assert!(err.to_string().contains("expected POST or GET"));
    }

    #[test]
    fn test_connect_error_messages_include_host() {
        let err = ConnectError::Timeout {
            host: "example.com".to_string(),
            stage: "connect",
            timeout_ms: 7500,
        };
        assert_eq!(
            err.to_string(),
            "Timed out during connect with example.com after 7500ms"
        );

        let err = ConnectError::Connect {
            host: "10.0.0.1".to_string(),
            port: 8080,
            source: io::Error::from(io::ErrorKind::ConnectionRefused),
        };
        assert!(err.to_string().starts_with("Unable to connect to 10.0.0.1:8080"));
    }

    #[test]
    fn test_probe_error_is_transparent_for_connect_errors() {
        let inner = ConnectError::Tls {
            host: "portal.example".to_string(),
            reason: "bad record".to_string(),
        };
        let expected = inner.to_string();
        let err = ProbeError::from(inner);
        assert_eq!(err.to_string(), expected);
    }

    #[test]
    fn test_probe_error_wraps_parse_errors() {
        let err = ProbeError::from(ParseError::MissingHost("http://".to_string()));
        assert_eq!(
            err.to_string(),
            "Unable to follow redirect: Missing host in 'http://'"
        );
    }
}
