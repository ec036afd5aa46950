//! Configuration types and CLI options.
//!
//! The monitor is configured from a JSON file (`urls_to_check`,
//! `detect_redirect_to`, `destination`, ...). The file is deserialized into [`ConfigFile`] and then
//! validated into a [`Config`]; nothing downstream sees unvalidated values.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use strum_macros::{Display, EnumString};
use structopt::StructOpt;

use crate::config::constants::{
    DEFAULT_CHECK_INTERVAL_SECS, DEFAULT_GRACE_TICKS, DEFAULT_REPORT_INTERVAL_SECS,
    DEFAULT_SOCKET_TIMEOUT_MS, MAX_REDIRECT_HOPS,
};
use crate::error_handling::{ConfigError, ParseError};
use crate::http::Method;
use crate::target::ServerTarget;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// Controls how log messages are formatted:
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Whether TLS peer certificates are validated.
///
/// Portals commonly present self-signed or mismatched certificates before
/// authentication, which is why validation is off unless requested.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// Accept any certificate and host name
    #[default]
    Disabled,
    /// Validate against the webpki root store
    Enabled,
}

/// Command-line options.
///
/// # Examples
///
/// ```bash
/// # Run continuously with the default interval from the config file
/// portal_login --config getonline.json
///
/// # Single check with verbose output
/// portal_login --config getonline.json --once --log-level debug
/// ```
#[derive(Debug, StructOpt)]
#[structopt(
    name = "portal_login",
    about = "Detects captive portal redirects and logs in automatically."
)]
pub struct Opt {
    /// Configuration file (JSON)
    #[structopt(short, long, parse(from_os_str), default_value = "getonline.json")]
    pub config: PathBuf,

    /// Log level: error|warn|info|debug|trace
    #[structopt(long, default_value = "info")]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[structopt(long, default_value = "plain")]
    pub log_format: LogFormat,

    /// Run a single check and exit
    #[structopt(long)]
    pub once: bool,
}

/// Configuration file layout, before validation.
///
/// Required fields are `Option`s here so that their absence is reported as
/// [`ConfigError::MissingField`] rather than a generic deserialization error.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    /// Verbose per-request logging
    #[serde(rename = "DEBUG", default)]
    pub debug: bool,
    /// Probe URLs, tried in order
    pub urls_to_check: Option<Vec<String>>,
    /// Substring of the `Location` header that identifies the portal
    pub detect_redirect_to: Option<String>,
    /// URL fetched before logging in, only to collect session cookies
    pub get_cookies_from: Option<String>,
    /// Redirect hop limit
    pub max_redirects: Option<usize>,
    /// Where and how to send the login
    pub destination: Option<DestinationFile>,
    /// Seconds between checks
    pub check_interval_secs: Option<u64>,
    /// Ticks to skip after a failed login
    pub grace_ticks: Option<u32>,
    /// Seconds between summary reports
    pub report_interval_secs: Option<u64>,
    /// Socket timeout in milliseconds
    pub socket_timeout_ms: Option<u64>,
    /// Validate TLS certificates
    #[serde(default)]
    pub verify_tls_certificates: bool,
}

/// `destination` block of the configuration file.
#[derive(Debug, Default, Deserialize)]
pub struct DestinationFile {
    /// URL to POST or GET the login data to
    pub send_to: Option<String>,
    /// Form-encoded login payload
    #[serde(default)]
    pub data: String,
    /// `POST` or `GET`
    pub method: Option<String>,
}

/// Where and how the login is submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginDestination {
    /// Login endpoint
    pub target: ServerTarget,
    /// `POST` sends `data` as body, `GET` appends it as query string
    pub method: Method,
    /// Form-encoded payload
    pub data: String,
}

/// Validated monitor configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Log raw requests (login data included) and response headers at debug
    /// level; the binary also raises its log level to debug
    pub debug: bool,
    /// Probe servers, in configuration order
    pub probe_targets: Vec<ServerTarget>,
    /// Lowercased portal marker searched for in `Location` headers
    pub detect_redirect_to: String,
    /// Optional cookie-priming URL
    pub cookie_source: Option<ServerTarget>,
    /// Redirect hop limit
    pub max_redirects: usize,
    /// Login endpoint, method and payload
    pub destination: LoginDestination,
    /// Time between checks
    pub check_interval: Duration,
    /// Ticks skipped after a failed login
    pub grace_ticks: u32,
    /// Time between summary reports
    pub report_interval: Duration,
    /// Bound for every socket operation
    pub socket_timeout: Duration,
    /// TLS certificate policy
    pub tls_verification: TlsVerification,
    /// Configured URLs that were dropped during validation, with the reason
    pub skipped_urls: Vec<(String, ParseError)>,
}

impl Config {
    /// Reads and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, is not valid
    /// JSON, or fails validation.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        ConfigFile::from_file(path)?.validate()
    }

    /// Parses and validates configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the text is not valid JSON or fails validation.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        ConfigFile::from_json_str(text)?.validate()
    }
}

impl ConfigFile {
    /// Reads a JSON configuration file without validating it.
    ///
    /// Lets the caller look at `DEBUG` and set up logging before
    /// [`ConfigFile::validate`] reports skipped entries.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or is not valid JSON.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Parses JSON configuration text without validating it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the text is not valid JSON for this layout.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Checks required fields and turns URLs into targets.
    ///
    /// Malformed entries of `urls_to_check` and a malformed `get_cookies_from`
    /// are logged, skipped and listed in [`Config::skipped_urls`]; a malformed
    /// `destination.send_to` is fatal.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first missing or invalid field.
    pub fn validate(self) -> Result<Config, ConfigError> {
        let detect_redirect_to = self
            .detect_redirect_to
            .ok_or(ConfigError::MissingField("detect_redirect_to"))?;
        if detect_redirect_to.trim().is_empty() {
            return Err(ConfigError::InvalidField {
                field: "detect_redirect_to",
                reason: "must not be empty".to_string(),
            });
        }

        let urls = self
            .urls_to_check
            .ok_or(ConfigError::MissingField("urls_to_check"))?;

        let destination = self
            .destination
            .ok_or(ConfigError::MissingField("destination.send_to"))?;
        let send_to = destination
            .send_to
            .ok_or(ConfigError::MissingField("destination.send_to"))?;
        let login_target =
            ServerTarget::parse(&send_to).map_err(|e| invalid("destination.send_to", e))?;

        let method = match destination.method {
            Some(method) => method.parse::<Method>().map_err(|_| ConfigError::InvalidField {
                field: "destination.method",
                reason: format!("expected POST or GET, got '{method}'"),
            })?,
            None => Method::Post,
        };

        let mut skipped_urls = Vec::new();
        let mut probe_targets = Vec::with_capacity(urls.len());
        for line in urls {
            match ServerTarget::parse(&line) {
                Ok(target) => {
                    log::debug!("Parsed URL: {target:?}");
                    probe_targets.push(target);
                }
                Err(e) => {
                    log::error!("Skipping probe URL '{line}': {e}");
                    skipped_urls.push((line, e));
                }
            }
        }
        if probe_targets.is_empty() {
            return Err(ConfigError::NoUsableProbeUrls);
        }

        let cookie_source = match self.get_cookies_from {
            Some(line) => match ServerTarget::parse(&line) {
                Ok(target) => Some(target),
                Err(e) => {
                    log::error!("Ignoring get_cookies_from '{line}': {e}");
                    skipped_urls.push((line, e));
                    None
                }
            },
            None => None,
        };

        let check_interval_secs = self
            .check_interval_secs
            .unwrap_or(DEFAULT_CHECK_INTERVAL_SECS);
        if check_interval_secs == 0 {
            return Err(ConfigError::InvalidField {
                field: "check_interval_secs",
                reason: "must be at least 1".to_string(),
            });
        }

        let socket_timeout_ms = self.socket_timeout_ms.unwrap_or(DEFAULT_SOCKET_TIMEOUT_MS);
        if socket_timeout_ms == 0 {
            return Err(ConfigError::InvalidField {
                field: "socket_timeout_ms",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Config {
            debug: self.debug,
            probe_targets,
            detect_redirect_to: detect_redirect_to.to_lowercase(),
            cookie_source,
            max_redirects: self.max_redirects.unwrap_or(MAX_REDIRECT_HOPS),
            destination: LoginDestination {
                target: login_target,
                method,
                data: destination.data,
            },
            check_interval: Duration::from_secs(check_interval_secs),
            grace_ticks: self.grace_ticks.unwrap_or(DEFAULT_GRACE_TICKS),
            report_interval: Duration::from_secs(
                self.report_interval_secs
                    .unwrap_or(DEFAULT_REPORT_INTERVAL_SECS),
            ),
            socket_timeout: Duration::from_millis(socket_timeout_ms),
            tls_verification: if self.verify_tls_certificates {
                TlsVerification::Enabled
            } else {
                TlsVerification::Disabled
            },
            skipped_urls,
        })
    }
}

fn invalid(field: &'static str, e: ParseError) -> ConfigError {
    ConfigError::InvalidField {
        field,
        reason: e.to_string(),
    }
}
