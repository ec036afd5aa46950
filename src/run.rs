//! Scheduling: runs monitor ticks on a fixed period until shutdown.

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use log::info;
use tokio::time::{interval, MissedTickBehavior};

use crate::config::Config;
use crate::http::Transport;
use crate::initialization::init_transport;
use crate::portal::{PortalMonitor, TickOutcome};

/// Ticks `monitor` every `period` until `shutdown` resolves.
///
/// The first tick runs immediately. Ticks never overlap: the next one is only
/// scheduled after the previous one has returned, and a tick that overruns
/// the period delays the schedule instead of queueing catch-up ticks.
/// Shutdown is observed between ticks.
pub async fn run_loop<T, F>(monitor: &mut PortalMonitor<T>, period: Duration, shutdown: F)
where
    T: Transport,
    F: Future<Output = ()>,
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                monitor.tick().await;
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping checks");
                break;
            }
        }
    }
}

/// Runs the monitor until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the transport cannot be initialized.
pub async fn run_monitor(config: Config) -> Result<()> {
    let transport = init_transport(&config).context("Failed to initialize transport")?;
    let period = config.check_interval;
    let mut monitor = PortalMonitor::new(config, transport);

    info!("Checking every {}s", period.as_secs());
    run_loop(&mut monitor, period, async {
        // If the signal handler cannot be installed, run until killed
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    })
    .await;

    let counts = monitor.report().counts();
    info!("Final counts: {counts}");
    Ok(())
}

/// Runs a single check and returns what it concluded.
///
/// # Errors
///
/// Returns an error if the transport cannot be initialized.
pub async fn run_once(config: Config) -> Result<TickOutcome> {
    let transport = init_transport(&config).context("Failed to initialize transport")?;
    let mut monitor = PortalMonitor::new(config, transport);
    Ok(monitor.tick_at(chrono::Utc::now()).await)
}
