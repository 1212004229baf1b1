//! `nidaqmx` command-line utility.
//!
//! ```text
//! nidaqmx [-v...] installdriver [--metadata-url URL]
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use nidaqmx_backend::installer::{self, InstallOutcome, DEFAULT_METADATA_URL};
use nidaqmx_backend::system::System;

#[derive(Parser)]
#[command(name = "nidaqmx")]
#[command(version, about = "NI-DAQmx driver utilities", long_about = None)]
struct Cli {
    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download and launch the NI-DAQmx driver installer
    #[command(name = "installdriver")]
    InstallDriver {
        /// URL of the release metadata document
        #[arg(long, default_value = DEFAULT_METADATA_URL)]
        metadata_url: String,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn install_driver(metadata_url: &str) -> Result<()> {
    let installed = match System::local().and_then(|system| system.driver_version()) {
        Ok(version) => Some(version),
        Err(err) => {
            debug!(%err, "no installed driver detected");
            None
        }
    };
    let outcome = installer::install(metadata_url, installed).context("driver installation failed")?;
    match outcome {
        InstallOutcome::UpToDate(version) => println!("NI-DAQmx {version} is already installed."),
        InstallOutcome::Installed(version) => println!("NI-DAQmx {version} installed."),
        InstallOutcome::Downloaded(path) => println!("NI-DAQmx driver archive saved to {}.", path.display()),
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::InstallDriver { metadata_url } => install_driver(&metadata_url),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
