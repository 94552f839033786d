// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Landmark Operations Console
//!
//! Entry point for the `landmark` binary. Parses CLI arguments,
//! initializes logging, and runs one console operation against the
//! governance-and-ledger engine.
//!
//! The binary supports four subcommands:
//!
//! - `init`      — write a documented sample bootstrap configuration
//! - `bootstrap` — construct a deployment from a configuration and write
//!   its initial state snapshot
//! - `status`    — print a summary of a state snapshot
//! - `version`   — print build version information

mod cli;
mod config;
mod logging;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Parser;
use landmark_ledger::clock::SystemClock;
use landmark_ledger::registry::Registry;
use landmark_ledger::{AssetStatus, Role};
use std::sync::Arc;

use cli::{Commands, LandmarkCli};
use config::Snapshot;
use logging::LogFormat;

fn main() -> Result<()> {
    let cli = LandmarkCli::parse();
    let format = cli.log_format;

    match cli.command {
        Commands::Init(args) => init(args, format),
        Commands::Bootstrap(args) => bootstrap(args, format),
        Commands::Status(args) => status(args, format),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Writes a sample bootstrap configuration for operators to edit.
fn init(args: cli::InitArgs, format: LogFormat) -> Result<()> {
    logging::init_logging("landmark_node=info", format);

    if args.output.exists() && !args.force {
        bail!(
            "{} already exists; pass --force to overwrite",
            args.output.display()
        );
    }
    config::save_config(&args.output, &config::sample_config())?;
    tracing::info!(path = %args.output.display(), "sample configuration written");

    println!("Sample configuration written.");
    println!("  Config file : {}", args.output.display());
    println!();
    println!("Replace every placeholder address before bootstrapping; the");
    println!("signer sets, fee wallets, and countdown lengths are live");
    println!("governance parameters from the moment the deployment exists.");
    Ok(())
}

/// Bootstraps a deployment and persists its initial state.
fn bootstrap(args: cli::BootstrapArgs, format: LogFormat) -> Result<()> {
    logging::init_logging("landmark_node=info,landmark_ledger=info", format);

    let bootstrap_config = config::load_config(&args.config)?;
    let registry = Registry::new(bootstrap_config, Arc::new(SystemClock))
        .context("bootstrap rejected by the ledger")?;

    let snapshot = Snapshot {
        version: env!("CARGO_PKG_VERSION").to_string(),
        taken_at: Utc::now(),
        state: registry.state().clone(),
    };
    config::save_snapshot(&args.snapshot, &snapshot)?;
    tracing::info!(path = %args.snapshot.display(), "state snapshot written");

    println!("Deployment bootstrapped.");
    println!("  Config file : {}", args.config.display());
    println!("  Snapshot    : {}", args.snapshot.display());
    print_summary(&registry);
    Ok(())
}

/// Loads a snapshot and prints its summary.
fn status(args: cli::StatusArgs, format: LogFormat) -> Result<()> {
    logging::init_logging("landmark_node=warn", format);

    let snapshot = config::load_snapshot(&args.snapshot)?;
    println!("Snapshot {}", args.snapshot.display());
    println!("  Written by  : landmark {}", snapshot.version);
    println!("  Taken at    : {}", snapshot.taken_at.to_rfc3339());

    let registry = Registry::from_state(snapshot.state, Arc::new(SystemClock));
    print_summary(&registry);
    Ok(())
}

/// Prints the deployment summary table shared by `bootstrap` and `status`.
fn print_summary(registry: &Registry) {
    let token = registry.token();
    println!(
        "  Token       : {} ({}), {} decimals",
        token.name, token.symbol, token.decimals
    );
    println!("  Supply      : {}", registry.total_supply());
    println!(
        "  Backed      : {}",
        if registry.is_fully_collateralized() {
            "fully collateralized"
        } else {
            "UNDER-COLLATERALIZED"
        }
    );
    println!(
        "  Paused      : {}",
        if registry.is_paused() { "yes" } else { "no" }
    );
    println!("  Whitelist   : {} account(s)", registry.whitelist().len());

    println!("  Assets      :");
    for status in [
        AssetStatus::Pending,
        AssetStatus::Enlisted,
        AssetStatus::Locked,
        AssetStatus::Reserved,
        AssetStatus::Redeemed,
    ] {
        let count = registry.assets().count(status);
        if count > 0 {
            println!(
                "    {:<9} {} asset(s) backing {}",
                format!("{status:?}"),
                count,
                registry.total_tokens(status)
            );
        }
    }

    println!("  Roles       :");
    for role in Role::ALL {
        let authorizer = registry.authorizer(role);
        println!(
            "    {:<15} {} signer(s), {} required",
            role.to_string(),
            authorizer.signer_count(),
            authorizer.required()
        );
    }
}

/// Prints version information to stdout.
fn print_version() {
    println!("landmark {}", env!("CARGO_PKG_VERSION"));
    println!("rustc    {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}
