//! portal_login library: captive portal detection and automatic login
//!
//! This library keeps a network connection usable behind a captive portal. On
//! a fixed schedule it probes a list of well-known URLs over a minimal
//! hand-written HTTP/1.1 client; when a probe is redirected to the configured
//! portal it walks the redirect chain, collects session cookies, submits the
//! configured login form and re-checks the connection.
//!
//! # Example
//!
//! ```no_run
//! use portal_login::{run_once, Config};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_file(std::path::Path::new("getonline.json"))?;
//! let outcome = run_once(config).await?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

#![warn(missing_docs)]

pub mod config;
pub mod cookies;
pub mod error_handling;
pub mod http;
pub mod initialization;
pub mod portal;
pub mod report;
mod run;
pub mod target;
mod tls;

// Re-export public API
pub use config::{Config, LogFormat, LogLevel, Opt};
pub use portal::{MonitorState, PortalMonitor, TickOutcome};
pub use report::{ReportAccumulator, ReportSnapshot};
pub use run::{run_loop, run_monitor, run_once};
pub use target::ServerTarget;
pub use tls::build_client_config;
