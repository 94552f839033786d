//! # Configuration and Snapshots
//!
//! The two JSON documents the console reads and writes:
//!
//! - a **bootstrap configuration** ([`BootstrapConfig`], defined by the
//!   ledger crate) describing the signer sets, token parameters, fee
//!   wallets, and countdown lengths of a new deployment;
//! - a **state snapshot** ([`Snapshot`]): the ledger's complete [`State`]
//!   wrapped with the version that wrote it and a capture timestamp.
//!
//! Both round-trip losslessly through `serde_json`, so a snapshot taken
//! by `bootstrap` can be reloaded by `status` (or by an operator's own
//! tooling) without loss.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use landmark_ledger::account::Address;
use landmark_ledger::registry::{
    AssetConfig, BootstrapConfig, CountdownConfig, RoleConfig, State, TokenConfig,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A persisted deployment state with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Version of the console that wrote the snapshot.
    pub version: String,
    /// When the snapshot was captured.
    pub taken_at: DateTime<Utc>,
    /// The complete deployment state.
    pub state: State,
}

/// A placeholder address with a recognizable low byte, for the sample
/// configuration only.
fn placeholder(last: u8) -> Address {
    let mut bytes = [0u8; 20];
    bytes[19] = last;
    Address(bytes)
}

/// A sample bootstrap configuration with placeholder addresses.
///
/// Three SuperOwners at a 60% threshold (effective requirement 2), two
/// BasicOwners at 2-of-2, one signer per admin role. Operators replace
/// every address before bootstrapping a real deployment.
pub fn sample_config() -> BootstrapConfig {
    BootstrapConfig {
        super_owners: vec![placeholder(0x01), placeholder(0x02), placeholder(0x03)],
        super_owner_threshold_percent: 60,
        basic_owners: RoleConfig {
            signers: vec![placeholder(0x11), placeholder(0x12)],
            required: 2,
        },
        operation_admins: RoleConfig {
            signers: vec![placeholder(0x21)],
            required: 1,
        },
        minting_admins: RoleConfig {
            signers: vec![placeholder(0x31)],
            required: 1,
        },
        redemption_admins: RoleConfig {
            signers: vec![placeholder(0x41)],
            required: 1,
        },
        token: TokenConfig::default(),
        assets: AssetConfig {
            redemption_fee: 0,
            fee_receiver: placeholder(0x51),
            minting_receiver: placeholder(0x52),
            escrow_account: placeholder(0x53),
        },
        countdowns: CountdownConfig::default(),
        initial_whitelist: vec![placeholder(0x52)],
    }
}

/// Reads a bootstrap configuration from `path`.
pub fn load_config(path: &Path) -> Result<BootstrapConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration from {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("invalid configuration in {}", path.display()))
}

/// Writes a bootstrap configuration to `path` as pretty-printed JSON.
pub fn save_config(path: &Path, config: &BootstrapConfig) -> Result<()> {
    let raw = serde_json::to_string_pretty(config).context("failed to encode configuration")?;
    fs::write(path, raw)
        .with_context(|| format!("failed to write configuration to {}", path.display()))
}

/// Reads a state snapshot from `path`.
pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot from {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid snapshot in {}", path.display()))
}

/// Writes a state snapshot to `path` as pretty-printed JSON.
pub fn save_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let raw = serde_json::to_string_pretty(snapshot).context("failed to encode snapshot")?;
    fs::write(path, raw)
        .with_context(|| format!("failed to write snapshot to {}", path.display()))
}
