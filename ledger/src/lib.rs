// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Landmark — Governance-and-Ledger Engine
//!
//! The core of the Landmark registry: a fungible balance ledger backed
//! 1:1 by individually identified real-world assets, administered by a
//! hierarchy of multi-party-approved roles instead of a single keyholder.
//!
//! Nobody here gets to act alone. Every privileged state change is gated
//! behind N-of-M signer approval, and the approval machinery itself is
//! governed the same way — changing who may approve takes an approval.
//!
//! ## Architecture
//!
//! The modules mirror the actual concerns of a supervised asset registry:
//!
//! - **account** — Fixed-width identifiers. Opaque on purpose.
//! - **clock** — Injected time. Countdowns are checked lazily at call
//!   time; there are no background timers to trust.
//! - **multisig** — The quorum authorizer. One instance per role.
//! - **actions** — The typed vocabulary of privileged changes, with a
//!   static action-to-role binding the dispatcher enforces.
//! - **whitelist** — Who may hold balance. Additions are instant,
//!   removals wait out a countdown.
//! - **assets** — The asset lifecycle state machine: minting rounds,
//!   redemption locks, the reserved side-state.
//! - **token** — The restricted balance ledger: whitelist gating, rolling
//!   daily limits, delayed large transfers, sweep-address routing.
//! - **registry** — The aggregate wiring it all together, with
//!   snapshot-rollback atomicity around every entry point.
//! - **config** — The defaults a fresh deployment starts from.
//!
//! ## Design Philosophy
//!
//! 1. The ledger is always fully collateralized: circulating supply
//!    equals the summed token value of live assets, at every boundary.
//! 2. Money math is `u128` with checked arithmetic. Wrapping arithmetic
//!    and other people's property do not mix.
//! 3. Failures are atomic and specific. An operation either completes or
//!    leaves no trace, and it never fails generically.
//! 4. Every public state type is serializable; a whole deployment
//!    round-trips through JSON.

pub mod account;
pub mod actions;
pub mod assets;
pub mod clock;
pub mod config;
pub mod multisig;
pub mod registry;
pub mod token;
pub mod whitelist;

pub use account::{Address, Fingerprint};
pub use actions::{Action, ActionArgs, ActionKind, AssetInput, CountdownKind, Role};
pub use assets::AssetStatus;
pub use clock::{Clock, ManualClock, SystemClock};
pub use registry::{
    AssetConfig, BootstrapConfig, CountdownConfig, Registry, RegistryError, RoleConfig, State,
    TokenConfig,
};
pub use token::{TransferMethod, TransferOutcome};
