//! URL descriptor parsing.
//!
//! Probe URLs, the login destination and every absolute `Location` header are
//! turned into a [`ServerTarget`] before a socket is opened. Only the subset of
//! URL syntax captive portals actually use is accepted:
//! `http(s)://host[:port][/path...]`.

use std::fmt;

use crate::config::{HTTPS_DEFAULT_PORT, HTTP_DEFAULT_PORT};
use crate::error_handling::ParseError;


/// Where a request goes: scheme, host, port and path of one URL.
///
/// Immutable once parsed. Relative redirects produce a derived copy through
/// [`ServerTarget::with_path`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerTarget {
    /// The URL as it was configured or received
    pub line: String,
    /// Wrap the connection in TLS
    pub use_tls: bool,
    /// Host name or IP literal, as written
    pub host: String,
    /// TCP port (scheme default when not given)
    pub port: u16,
    /// Request target, always starting with `/`
    pub path: String,
}

impl ServerTarget {
    /// Parses `http(s)://host[:port][/path...]`.
    ///
    /// The scheme is case-insensitive. A missing port falls back to 443 for
    /// `https` and 80 for `http`; a missing path becomes `/`. Anything after the
    /// first whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] when the scheme is not `http`/`https`, the host
    /// is empty or an IPv6 literal, or the port is not a valid TCP port.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let trimmed = line.trim();

        let (use_tls, rest) = if let Some(rest) = strip_prefix_ignore_case(trimmed, "https://") {
            (true, rest)
        } else if let Some(rest) = strip_prefix_ignore_case(trimmed, "http://") {
            (false, rest)
        } else {
            return Err(ParseError::UnsupportedScheme(trimmed.to_string()));
        };

        let rest = rest.split_whitespace().next().unwrap_or("");

        let host_end = rest
            .find(|c: char| matches!(c, ':' | '/' | '|' | '?'))
            .unwrap_or(rest.len());
        let host = &rest[..host_end];
        if host.is_empty() {
            return Err(ParseError::MissingHost(trimmed.to_string()));
        }
        // IPv6 literals are not supported
        if host.contains(['[', ']']) {
            return Err(ParseError::InvalidHost(trimmed.to_string()));
        }

        let mut remainder = &rest[host_end..];
        let default_port = if use_tls {
            HTTPS_DEFAULT_PORT
        } else {
            HTTP_DEFAULT_PORT
        };

        let port = match remainder.strip_prefix(':') {
            Some(after_colon) => {
                let digits_end = after_colon
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(after_colon.len());
                let digits = &after_colon[..digits_end];
                remainder = &after_colon[digits_end..];

                if !remainder.is_empty() && !remainder.starts_with(['/', '?', '|']) {
                    let port_end = after_colon
                        .find(['/', '?', '|'])
                        .unwrap_or(after_colon.len());
                    return Err(ParseError::InvalidPort {
                        line: trimmed.to_string(),
                        port: after_colon[..port_end].to_string(),
                    });
                }

                if digits.is_empty() {
                    default_port
                } else {
                    match digits.parse::<u16>() {
                        Ok(port) if port != 0 => port,
                        _ => {
                            return Err(ParseError::InvalidPort {
                                line: trimmed.to_string(),
                                port: digits.to_string(),
                            })
                        }
                    }
                }
            }
            None => default_port,
        };

        let path = if remainder.is_empty() {
            "/".to_string()
        } else if remainder.starts_with('/') {
            remainder.to_string()
        } else {
            // "?query" or "|..." directly after the authority
            format!("/{remainder}")
        };

        Ok(ServerTarget {
            line: trimmed.to_string(),
            use_tls,
            host: host.to_string(),
            port,
            path,
        })
    }

    /// Same server, different path. Used for `/`-relative redirects.
    pub fn with_path(&self, path: &str) -> Self {
        let mut derived = ServerTarget {
            line: String::new(),
            use_tls: self.use_tls,
            host: self.host.clone(),
            port: self.port,
            path: path.to_string(),
        };
        derived.line = derived.to_string();
        derived
    }

    /// Whether the port is the scheme's default one.
    pub fn has_default_port(&self) -> bool {
        let default_port = if self.use_tls {
            HTTPS_DEFAULT_PORT
        } else {
            HTTP_DEFAULT_PORT
        };
        self.port == default_port
    }

    /// Value for the `Host` request header.
    pub fn host_header(&self) -> String {
        if self.has_default_port() {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Display for ServerTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = if self.use_tls { "https" } else { "http" };
        if self.has_default_port() {
            write!(f, "{}://{}{}", scheme, self.host, self.path)
        } else {
            write!(f, "{}://{}:{}{}", scheme, self.host, self.port, self.path)
        }
    }
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if s.len() >= prefix.len()
        && s.is_char_boundary(prefix.len())
        && s[..prefix.len()].eq_ignore_ascii_case(prefix)
    {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}
