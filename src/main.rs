//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `portal_login` library that handles:
//! - Command-line argument parsing
//! - Configuration loading
//! - Logger initialization
//!
//! All core functionality is implemented in the library crate.

use std::process;

use anyhow::{Context, Result};
use log::LevelFilter;
use structopt::StructOpt;

use portal_login::config::ConfigFile;
use portal_login::initialization::init_logger_with;
use portal_login::{run_monitor, run_once, Opt};

#[tokio::main]
async fn main() -> Result<()> {
    let opt = Opt::from_args();

    let file = match ConfigFile::from_file(&opt.config) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("portal_login error: {e}");
            process::exit(1);
        }
    };

    // DEBUG in the config file raises the level, it never lowers it
    let mut level: LevelFilter = opt.log_level.clone().into();
    if file.debug && level < LevelFilter::Debug {
        level = LevelFilter::Debug;
    }
    init_logger_with(level, opt.log_format.clone()).context("Failed to initialize logger")?;

    // Validated after logger setup so skipped URLs show up in the log
    let config = match file.validate() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("portal_login error: {e}");
            process::exit(1);
        }
    };

    if opt.once {
        let outcome = run_once(config).await?;
        println!("{outcome:?}");
        return Ok(());
    }

    if let Err(e) = run_monitor(config).await {
        eprintln!("portal_login error: {e:#}");
        process::exit(1);
    }
    Ok(())
}
