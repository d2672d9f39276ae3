//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `geostat` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Configuration file loading
//! - Logger initialization
//! - Signal handling
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;
use tokio_util::sync::CancellationToken;

use geostat::initialization::init_logger_with;
use geostat::{cancel_on_signal, run_pipeline, Config, Opt, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists)
    // Try loading from current directory first, then from the executable's directory
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let opt = Opt::parse();

    init_logger_with(opt.log_level.into(), opt.log_format)
        .context("Failed to initialize logger")?;

    let settings = match Settings::load(opt.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("geostat error: {:#}", e);
            process::exit(1);
        }
    };

    let config = Config {
        log_file: opt.log_file,
        geo_db: opt.geo_db,
        settings,
    };

    let cancel = CancellationToken::new();
    let signal_task = cancel_on_signal(cancel.clone());

    let result = run_pipeline(config, cancel.clone()).await;
    cancel.cancel();
    let _ = signal_task.await;

    match result {
        Ok(report) => {
            println!(
                "✅ Read {} line{}, wrote {} point{} ({} dropped) in {:.1}s",
                report.lines_read,
                if report.lines_read == 1 { "" } else { "s" },
                report.points_written,
                if report.points_written == 1 { "" } else { "s" },
                report.total_dropped(),
                report.elapsed_seconds
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("geostat error: {:#}", e);
            process::exit(1);
        }
    }
}
