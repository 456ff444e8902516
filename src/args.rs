//! Commandline argument parser using clap for metrogrid

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Top-level arguments for the installation driver.
#[derive(Debug, Parser, Clone)]
#[clap(version, about)]
pub struct GridArgs {
    #[command(subcommand, long_about)]
    /// Which mode to run, live tracking or simulation
    pub command: CommandTask,

    /// Path to the RON settings file
    #[arg(short = 'c', long = "config", default_value = "metrogrid.ron")]
    pub config: PathBuf,

    /// Override the configured pipeline ticks per second
    #[arg(short = 'u', long = "update")]
    pub update_rate: Option<f32>,
}

/// The two ways to run the wall.
#[derive(Debug, Subcommand, Clone)]
pub enum CommandTask {
    /// Drive the metronome wall from a live tracker feed on stdin
    #[command(about)]
    Live(LiveCommand),

    /// Exercise the pipeline with synthetic blobs, no camera required
    #[command(about)]
    Sim(SimCommand),
}

/// Options for live tracking mode.
#[derive(Debug, Args, Clone)]
#[command(version, about)]
pub struct LiveCommand {
    /// Override the serial device name filter from the settings file
    #[arg(short = 'f', long = "filter")]
    pub port_filter: Option<String>,

    /// Pick the serial device from a list when the filter matches nothing
    #[arg(long)]
    pub choose: bool,
}

/// Options for simulation mode.
#[derive(Debug, Args, Clone)]
#[command(version, about)]
pub struct SimCommand {
    /// Number of synthetic blobs to walk around
    #[arg(short = 'n', long = "blobs", default_value_t = 2)]
    pub blob_count: usize,

    /// Deliver commands to real hardware instead of the debug log
    #[arg(long)]
    pub hardware: bool,

    /// Run this many ticks and exit; 0 runs until a key is pressed
    #[arg(short = 't', long = "ticks", default_value_t = 0)]
    pub ticks: u64,
}
