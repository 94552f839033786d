//! # CLI Interface
//!
//! Defines the command-line argument structure for `landmark` using
//! `clap` derive. Supports four subcommands: `init`, `bootstrap`,
//! `status`, and `version`.

use crate::logging::LogFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Landmark operations console.
///
/// Bootstraps a governed deployment of the Landmark registry from a JSON
/// configuration, persists its state as snapshot files, and inspects
/// existing snapshots. Every privileged operation against a live
/// deployment goes through the quorum pipeline in `landmark-ledger`;
/// this binary is the thin shell around it.
#[derive(Parser, Debug)]
#[command(
    name = "landmark",
    about = "Landmark registry operations console",
    version,
    propagate_version = true
)]
pub struct LandmarkCli {
    /// Log output format.
    #[arg(
        long,
        value_enum,
        env = "LANDMARK_LOG_FORMAT",
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the Landmark console.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a documented sample bootstrap configuration.
    Init(InitArgs),
    /// Bootstrap a deployment from a configuration file and write its
    /// initial state snapshot.
    Bootstrap(BootstrapArgs),
    /// Print a summary of a state snapshot.
    Status(StatusArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `init` subcommand.
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Where to write the sample configuration.
    #[arg(long, short = 'o', env = "LANDMARK_CONFIG", default_value = "landmark.json")]
    pub output: PathBuf,

    /// Overwrite an existing file.
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `bootstrap` subcommand.
#[derive(Parser, Debug)]
pub struct BootstrapArgs {
    /// Path to the bootstrap configuration file (JSON).
    #[arg(long, short = 'c', env = "LANDMARK_CONFIG", default_value = "landmark.json")]
    pub config: PathBuf,

    /// Where to write the state snapshot.
    #[arg(long, short = 's', env = "LANDMARK_SNAPSHOT", default_value = "snapshot.json")]
    pub snapshot: PathBuf,
}

/// Arguments for the `status` subcommand.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Path to the state snapshot to inspect.
    #[arg(long, short = 's', env = "LANDMARK_SNAPSHOT", default_value = "snapshot.json")]
    pub snapshot: PathBuf,
}
