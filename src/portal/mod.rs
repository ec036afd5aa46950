//! Captive portal detection and login state machine.
//!
//! Each scheduler tick either sits out a grace period or walks the probe
//! servers in configuration order:
//! - a connection failure is counted and the next server is tried
//! - a redirect to the portal triggers the login sub-flow
//! - any other response means the connection is fine and ends the tick
//!
//! A login that does not clear the portal starts a grace period during which
//! whole ticks are skipped, so a broken portal is not hammered every interval.

mod login;
mod redirects;


use chrono::{DateTime, Utc};
use log::{debug, error, info};
use strum_macros::Display;

use crate::config::Config;
use crate::error_handling::{ConnectError, ProbeError};
use crate::http::{HttpClient, ResponseHeaders, Transport};
use crate::report::ReportAccumulator;
use crate::target::ServerTarget;

// Re-export public API
pub use login::{prime_cookies, send_login, LoginOutcome};
pub use redirects::{follow_redirects, resolve_location, RedirectChain};

/// Where the monitor currently is in its check cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum MonitorState {
    /// Ready to probe on the next tick
    Probing,
    /// Skipping ticks after a failed login
    GraceSuppressed,
    /// Running the login sub-flow
    LoggingIn,
    /// Re-probing after a login
    Revalidating,
}

/// What a single tick concluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Grace period active; no probing. `remaining` ticks left after this one.
    Suppressed {
        /// Ticks still to skip
        remaining: u32,
    },
    /// A probe server answered without a portal redirect
    Connected {
        /// Host that answered
        host: String,
    },
    /// Every probe server failed or was logged in through
    Exhausted,
    /// A login did not clear the portal; grace period started
    LoginFailed {
        /// Probe host that kept redirecting
        host: String,
    },
}

/// How a probe response was classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// No redirect, or a redirect that does not lead to the portal
    Clear,
    /// Redirected to the portal; holds the `Location` value
    Portal(String),
}

/// Classifies a probe response against the lowercased portal marker.
pub fn classify(headers: &ResponseHeaders, marker: &str) -> ProbeOutcome {
    match headers.location() {
        Some(location) if location.to_lowercase().contains(marker) => {
            ProbeOutcome::Portal(location.to_string())
        }
        _ => ProbeOutcome::Clear,
    }
}

/// Owns all mutable monitor state: cookies (inside the client), grace
/// counter and report counters.
pub struct PortalMonitor<T> {
    config: Config,
    client: HttpClient<T>,
    grace: u32,
    report: ReportAccumulator,
    state: MonitorState,
}

impl<T: Transport> PortalMonitor<T> {
    /// Creates a monitor whose first reporting window starts now.
    pub fn new(config: Config, transport: T) -> Self {
        Self::starting_at(config, transport, Utc::now())
    }

    /// Creates a monitor whose first reporting window starts at `now`.
    pub fn starting_at(config: Config, transport: T, now: DateTime<Utc>) -> Self {
        let report = ReportAccumulator::new(config.report_interval, now);
        info!(
            "Loaded URLs: {}",
            config
                .probe_targets
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );

        let client = HttpClient::new(transport).with_wire_trace(config.debug);

        PortalMonitor {
            config,
            client,
            grace: 0,
            report,
            state: MonitorState::Probing,
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// HTTP client, including the cookie store.
    pub fn client(&self) -> &HttpClient<T> {
        &self.client
    }

    /// Report counters of the current window.
    pub fn report(&self) -> &ReportAccumulator {
        &self.report
    }

    /// Ticks still to skip.
    pub fn grace_remaining(&self) -> u32 {
        self.grace
    }

    /// Current state.
    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Scheduler entry point: one check, effects observable through logs.
    pub async fn tick(&mut self) {
        let outcome = self.tick_at(Utc::now()).await;
        debug!("Tick finished: {outcome:?}");
    }

    /// One check at wall-clock time `now`.
    pub async fn tick_at(&mut self, now: DateTime<Utc>) -> TickOutcome {
        let report_due = self.report.is_due(now);

        if self.grace > 0 {
            self.grace -= 1;
            self.state = if self.grace > 0 {
                MonitorState::GraceSuppressed
            } else {
                MonitorState::Probing
            };
            info!("Skipping check... ({})", self.grace);
            return TickOutcome::Suppressed {
                remaining: self.grace,
            };
        }

        self.state = MonitorState::Probing;
        debug!("Checking connection....");
        self.report.record_check();

        let outcome = self.check_servers().await;

        if report_due {
            self.report.emit(now);
        }
        outcome
    }

    async fn check_servers(&mut self) -> TickOutcome {
        let servers = self.config.probe_targets.clone();

        for server in &servers {
            self.report.record_server_checked();
            debug!("Checking server {}", server.host);

            match self.probe(server).await {
                Err(e) => {
                    self.report.record_failed_connection();
                    error!("Unable to communicate with {} ({})", server.host, e);
                }
                Ok(ProbeOutcome::Clear) => {
                    debug!("Got normal reply from {}, connection good...", server.host);
                    self.grace = 0;
                    return TickOutcome::Connected {
                        host: server.host.clone(),
                    };
                }
                Ok(ProbeOutcome::Portal(location)) => {
                    info!("Redirect detected '{location}'");

                    match self.login(server, &location).await {
                        LoginOutcome::Succeeded => {
                            info!("Login through {} succeeded", server.host);
                            self.state = MonitorState::Probing;
                        }
                        LoginOutcome::Failed => {
                            self.grace = self.config.grace_ticks;
                            self.state = if self.grace > 0 {
                                MonitorState::GraceSuppressed
                            } else {
                                MonitorState::Probing
                            };
                            error!(
                                "Login through {} failed, skipping the next {} checks",
                                server.host, self.grace
                            );
                            return TickOutcome::LoginFailed {
                                host: server.host.clone(),
                            };
                        }
                    }
                }
            }
        }

        TickOutcome::Exhausted
    }

    async fn probe(&mut self, server: &ServerTarget) -> Result<ProbeOutcome, ConnectError> {
        let headers = self.client.get(server).await?;
        if let Some(status) = headers.status_code() {
            debug!("{} answered {}", server.host, status);
        }
        Ok(classify(&headers, &self.config.detect_redirect_to))
    }

    async fn login(&mut self, server: &ServerTarget, location: &str) -> LoginOutcome {
        self.state = MonitorState::LoggingIn;
        self.report.record_login_attempt();

        match self.try_login(server, location).await {
            Ok(LoginOutcome::Succeeded) => {
                self.report.record_successful_login();
                LoginOutcome::Succeeded
            }
            Ok(LoginOutcome::Failed) => {
                self.report.record_failed_login();
                error!("{} still redirects to the portal after login", server.host);
                LoginOutcome::Failed
            }
            Err(e) => {
                self.report.record_failed_connection();
                self.report.record_failed_login();
                error!("Unable to complete login via {} ({})", server.host, e);
                LoginOutcome::Failed
            }
        }
    }

    async fn try_login(
        &mut self,
        server: &ServerTarget,
        location: &str,
    ) -> Result<LoginOutcome, ProbeError> {
        follow_redirects(&mut self.client, location, server, self.config.max_redirects).await?;

        if let Some(source) = &self.config.cookie_source {
            prime_cookies(&mut self.client, source).await?;
        }

        if let Err(e) = send_login(
            &mut self.client,
            &self.config.destination,
            self.config.max_redirects,
        )
        .await
        {
            // The re-probe below decides whether the login took effect
            self.report.record_failed_connection();
            error!(
                "Exception when trying to login to {} ({})",
                self.config.destination.target.host, e
            );
        }

        self.state = MonitorState::Revalidating;
        match self.probe(server).await? {
            ProbeOutcome::Clear => Ok(LoginOutcome::Succeeded),
            ProbeOutcome::Portal(_) => Ok(LoginOutcome::Failed),
        }
    }
}
