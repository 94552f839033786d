//! # Ledger Constants
//!
//! Every default that governs timing and governance strength lives here.
//! Deployments override most of these at bootstrap; the constants are the
//! values a fresh deployment starts from, and the ones the test suites
//! assume unless they say otherwise.

/// Default length of the minting countdown, in seconds (48 hours).
///
/// The window between a quorum-confirmed minting round and the moment its
/// assets can actually be enlisted and their backing balance minted.
pub const DEFAULT_MINTING_COUNTDOWN_SECS: u64 = 60 * 60 * 48;

/// Default length of the redemption countdown, in seconds (48 hours).
pub const DEFAULT_REDEMPTION_COUNTDOWN_SECS: u64 = 60 * 60 * 48;

/// Default delay between a quorum-approved whitelist removal and the
/// moment it can be finalized, in seconds (48 hours).
pub const DEFAULT_WHITELIST_REMOVAL_COUNTDOWN_SECS: u64 = 60 * 60 * 48;

/// Default countdown a large transfer sits behind before it can be
/// executed, in seconds (48 hours).
pub const DEFAULT_DELAYED_TRANSFER_COUNTDOWN_SECS: u64 = 60 * 60 * 48;

/// Default countdown before an account's requested daily-limit change
/// takes effect, in seconds (48 hours).
pub const DEFAULT_DAILY_LIMIT_UPDATE_COUNTDOWN_SECS: u64 = 60 * 60 * 48;

/// Length of the rolling spending window used by daily limits, in seconds
/// (24 hours). Not configurable at runtime; the "daily" in "daily limit"
/// is load-bearing.
pub const TRANSFER_WINDOW_SECS: u64 = 60 * 60 * 24;

/// Default SuperOwner approval threshold, as a percentage of the signer
/// set. The effective requirement is `ceil(signers * percent / 100)`,
/// clamped to at least 1.
pub const DEFAULT_SUPER_OWNER_THRESHOLD_PERCENT: u32 = 50;

/// Default decimal precision for the token. Balances are fixed-point
/// integers scaled by `10^decimals`.
pub const DEFAULT_TOKEN_DECIMALS: u8 = 18;

/// One whole token at the given decimal precision.
pub fn base_unit(decimals: u8) -> u128 {
    10u128.pow(decimals as u32)
}
