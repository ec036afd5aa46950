//! Application initialization and resource setup.
//!
//! This module provides functions to initialize the shared resources:
//! - the logger
//! - the socket transport (timeouts and TLS configuration)

mod logger;

use crate::config::Config;
use crate::error_handling::InitializationError;
use crate::http::{ConnectOptions, SocketTransport};
use crate::tls::build_client_config;

// Re-export public API
pub use logger::init_logger_with;

/// Initializes the socket transport used by the monitor.
///
/// Builds the TLS client configuration once; every connection afterwards
/// shares it.
///
/// # Errors
///
/// Returns `InitializationError::TlsConfigError` if the TLS configuration
/// cannot be built.
pub fn init_transport(config: &Config) -> Result<SocketTransport, InitializationError> {
    let tls_config = build_client_config(config.tls_verification)?;
    Ok(SocketTransport::new(ConnectOptions {
        timeout: config.socket_timeout,
        tls_config,
    }))
}
