//! # Roles and Privileged Actions
//!
//! The vocabulary of governance. Every privileged state change in the
//! ledger is described by an [`Action`] payload, submitted to the quorum
//! authorizer of the one [`Role`] allowed to initiate it, and applied by
//! the registry only after that authorizer reaches quorum.
//!
//! Two surfaces exist for the same vocabulary:
//!
//! - [`Action`] is the typed payload enum. The registry's dispatcher
//!   matches on it exhaustively, so adding a variant without wiring its
//!   application is a compile error.
//! - [`ActionKind`] plus [`ActionArgs`] is the untyped administrative
//!   surface used by bootstrap and CLI layers: a kind tag plus flat
//!   argument arrays, arity-checked against the kind's schema and decoded
//!   into an [`Action`].

use crate::account::{Address, Fingerprint};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from decoding the untyped action surface.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionError {
    /// The argument arrays do not match the action kind's schema.
    #[error("wrong arguments for {kind}: expected {expected}")]
    ArityMismatch {
        /// The kind being decoded.
        kind: ActionKind,
        /// Human-readable schema description.
        expected: &'static str,
    },

    /// A numeric argument does not fit the target field.
    #[error("argument out of range for {kind}: {detail}")]
    OutOfRange {
        /// The kind being decoded.
        kind: ActionKind,
        /// Which argument overflowed.
        detail: &'static str,
    },

    /// An integer discriminant does not name a role.
    #[error("unknown role discriminant: {0}")]
    UnknownRole(u128),

    /// An integer discriminant does not name a countdown kind.
    #[error("unknown countdown discriminant: {0}")]
    UnknownCountdown(u128),
}

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

/// The five privilege classes, each bound 1:1 to its own quorum authorizer
/// at bootstrap.
///
/// The supervisory hierarchy is fixed: SuperOwner governs its own signer
/// set and BasicOwner's; BasicOwner governs the three admin roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Top of the hierarchy. Pauses the system, sets countdown lengths
    /// and its own threshold percentage.
    SuperOwner,
    /// Day-to-day supervision: admin signer sets, fees, receiver wallets,
    /// sweep mappings, reserved/enlisted flips.
    BasicOwner,
    /// Whitelist administration.
    OperationAdmin,
    /// Proposes minting rounds.
    MintingAdmin,
    /// Confirms and executes redemptions.
    RedemptionAdmin,
}

impl Role {
    /// All roles, in discriminant order.
    pub const ALL: [Role; 5] = [
        Role::SuperOwner,
        Role::BasicOwner,
        Role::OperationAdmin,
        Role::MintingAdmin,
        Role::RedemptionAdmin,
    ];

    /// Decodes a wire discriminant (0-based, declaration order).
    pub fn from_index(index: u128) -> Option<Role> {
        match index {
            0 => Some(Role::SuperOwner),
            1 => Some(Role::BasicOwner),
            2 => Some(Role::OperationAdmin),
            3 => Some(Role::MintingAdmin),
            4 => Some(Role::RedemptionAdmin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::SuperOwner => "SuperOwner",
            Role::BasicOwner => "BasicOwner",
            Role::OperationAdmin => "OperationAdmin",
            Role::MintingAdmin => "MintingAdmin",
            Role::RedemptionAdmin => "RedemptionAdmin",
        };
        write!(f, "{name}")
    }
}

// ---------------------------------------------------------------------------
// Countdown kinds
// ---------------------------------------------------------------------------

/// The configurable countdowns that gate ledger behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CountdownKind {
    /// Minting round confirmation to enlistment.
    Minting,
    /// Redemption confirmation to burn eligibility.
    Redemption,
    /// Whitelist removal proposal to finalization.
    WhitelistRemoval,
    /// Large-transfer escrow to execution eligibility.
    DelayedTransfer,
    /// Daily-limit change request to activation.
    DailyLimitUpdate,
}

impl CountdownKind {
    /// Decodes a wire discriminant (0-based, declaration order).
    pub fn from_index(index: u128) -> Option<CountdownKind> {
        match index {
            0 => Some(CountdownKind::Minting),
            1 => Some(CountdownKind::Redemption),
            2 => Some(CountdownKind::WhitelistRemoval),
            3 => Some(CountdownKind::DelayedTransfer),
            4 => Some(CountdownKind::DailyLimitUpdate),
            _ => None,
        }
    }
}

impl fmt::Display for CountdownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CountdownKind::Minting => "Minting",
            CountdownKind::Redemption => "Redemption",
            CountdownKind::WhitelistRemoval => "WhitelistRemoval",
            CountdownKind::DelayedTransfer => "DelayedTransfer",
            CountdownKind::DailyLimitUpdate => "DailyLimitUpdate",
        };
        write!(f, "{name}")
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Submission form of an asset: everything but the lifecycle bookkeeping
/// the ledger assigns on acceptance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetInput {
    /// Unique asset identifier, assigned by the submitter. Never reused,
    /// including after redemption or round cancellation.
    pub id: u64,
    /// Notarization fingerprint of the off-ledger provenance record.
    pub fingerprint: Fingerprint,
    /// Quantity of balance units this asset backs, in base units.
    pub token_value: u128,
    /// The account that owns the physical asset.
    pub owner: Address,
}

/// A privileged action payload.
///
/// Each variant is statically bound to the single role allowed to initiate
/// it; see [`Action::initiating_role`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Add a signer to `role`'s authorizer.
    AddSigner { role: Role, account: Address },
    /// Remove a signer from `role`'s authorizer.
    RemoveSigner { role: Role, account: Address },
    /// Change the approval requirement of `role`'s authorizer. Not valid
    /// for SuperOwner, whose requirement is derived from the threshold
    /// percentage.
    ChangeRequirement { role: Role, required: u32 },
    /// Change the SuperOwner threshold percentage (1..=100).
    SetSuperOwnerThresholdPercent { percent: u32 },
    /// Change a countdown length.
    SetCountdown { kind: CountdownKind, length_secs: u64 },
    /// Change the redemption fee, in base units.
    SetRedemptionFee { fee: u128 },
    /// Change the account credited with redemption fees.
    SetRedemptionFeeReceiver { account: Address },
    /// Change the account newly minted balance is credited to.
    SetMintingReceiver { account: Address },
    /// Halt transfers, minting, burning, and the asset workflows.
    Pause,
    /// Resume from a pause.
    Unpause,
    /// Whitelist one account, effective immediately.
    AddWhitelisted { account: Address },
    /// Whitelist a batch of accounts, effective immediately.
    AddWhitelistedBatch { accounts: Vec<Address> },
    /// Start the countdown toward removing an account from the whitelist.
    RemoveWhitelisted { account: Address },
    /// Map a deposit-address family (keyed by `deposit.sweep_key()`) to a
    /// canonical exchange account.
    SetSweepAddress { deposit: Address, exchange: Address },
    /// Open a minting round over the given assets.
    AddPendingAssets { assets: Vec<AssetInput> },
    /// Drop one pending asset from the open minting round.
    RemovePendingAsset { id: u64 },
    /// Discard the open minting round and its pending assets.
    CancelMintingRound,
    /// Move an enlisted asset into the reserved side-state.
    SetAssetReserved { id: u64 },
    /// Return a reserved asset to enlisted.
    SetAssetEnlisted { id: u64 },
    /// Stamp the redemption countdown for a locked asset. Submitted
    /// automatically by `request_redemption`.
    StartRedemptionCountdown { asset_id: u64 },
}

impl Action {
    /// The one role allowed to initiate this action.
    pub fn initiating_role(&self) -> Role {
        match self {
            Action::AddSigner { role, .. }
            | Action::RemoveSigner { role, .. }
            | Action::ChangeRequirement { role, .. } => match role {
                Role::SuperOwner | Role::BasicOwner => Role::SuperOwner,
                Role::OperationAdmin | Role::MintingAdmin | Role::RedemptionAdmin => {
                    Role::BasicOwner
                }
            },
            Action::SetSuperOwnerThresholdPercent { .. }
            | Action::SetCountdown { .. }
            | Action::Pause
            | Action::Unpause => Role::SuperOwner,
            Action::SetRedemptionFee { .. }
            | Action::SetRedemptionFeeReceiver { .. }
            | Action::SetMintingReceiver { .. }
            | Action::SetSweepAddress { .. }
            | Action::CancelMintingRound
            | Action::SetAssetReserved { .. }
            | Action::SetAssetEnlisted { .. } => Role::BasicOwner,
            Action::AddWhitelisted { .. }
            | Action::AddWhitelistedBatch { .. }
            | Action::RemoveWhitelisted { .. } => Role::OperationAdmin,
            Action::AddPendingAssets { .. } | Action::RemovePendingAsset { .. } => {
                Role::MintingAdmin
            }
            Action::StartRedemptionCountdown { .. } => Role::RedemptionAdmin,
        }
    }

    /// The fieldless tag for this payload.
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::AddSigner { .. } => ActionKind::AddSigner,
            Action::RemoveSigner { .. } => ActionKind::RemoveSigner,
            Action::ChangeRequirement { .. } => ActionKind::ChangeRequirement,
            Action::SetSuperOwnerThresholdPercent { .. } => {
                ActionKind::SetSuperOwnerThresholdPercent
            }
            Action::SetCountdown { .. } => ActionKind::SetCountdown,
            Action::SetRedemptionFee { .. } => ActionKind::SetRedemptionFee,
            Action::SetRedemptionFeeReceiver { .. } => ActionKind::SetRedemptionFeeReceiver,
            Action::SetMintingReceiver { .. } => ActionKind::SetMintingReceiver,
            Action::Pause => ActionKind::Pause,
            Action::Unpause => ActionKind::Unpause,
            Action::AddWhitelisted { .. } => ActionKind::AddWhitelisted,
            Action::AddWhitelistedBatch { .. } => ActionKind::AddWhitelistedBatch,
            Action::RemoveWhitelisted { .. } => ActionKind::RemoveWhitelisted,
            Action::SetSweepAddress { .. } => ActionKind::SetSweepAddress,
            Action::AddPendingAssets { .. } => ActionKind::AddPendingAssets,
            Action::RemovePendingAsset { .. } => ActionKind::RemovePendingAsset,
            Action::CancelMintingRound => ActionKind::CancelMintingRound,
            Action::SetAssetReserved { .. } => ActionKind::SetAssetReserved,
            Action::SetAssetEnlisted { .. } => ActionKind::SetAssetEnlisted,
            Action::StartRedemptionCountdown { .. } => ActionKind::StartRedemptionCountdown,
        }
    }
}

// ---------------------------------------------------------------------------
// Untyped surface
// ---------------------------------------------------------------------------

/// Flat argument arrays for the untyped administrative surface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionArgs {
    /// Unsigned integer arguments, in schema order.
    pub uints: Vec<u128>,
    /// Address arguments, in schema order.
    pub addresses: Vec<Address>,
    /// 32-byte hash arguments, in schema order.
    pub hashes: Vec<Fingerprint>,
}

impl ActionArgs {
    /// Arguments for an action that takes none.
    pub fn none() -> Self {
        Self::default()
    }
}

/// Fieldless mirror of [`Action`], used as the kind tag on the untyped
/// surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    AddSigner,
    RemoveSigner,
    ChangeRequirement,
    SetSuperOwnerThresholdPercent,
    SetCountdown,
    SetRedemptionFee,
    SetRedemptionFeeReceiver,
    SetMintingReceiver,
    Pause,
    Unpause,
    AddWhitelisted,
    AddWhitelistedBatch,
    RemoveWhitelisted,
    SetSweepAddress,
    AddPendingAssets,
    RemovePendingAsset,
    CancelMintingRound,
    SetAssetReserved,
    SetAssetEnlisted,
    StartRedemptionCountdown,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl ActionKind {
    /// Decodes flat argument arrays into a typed payload, checking arity
    /// against this kind's schema.
    pub fn decode(self, args: &ActionArgs) -> Result<Action, ActionError> {
        match self {
            ActionKind::AddSigner => {
                let (role, account) = decode_role_account(self, args)?;
                Ok(Action::AddSigner { role, account })
            }
            ActionKind::RemoveSigner => {
                let (role, account) = decode_role_account(self, args)?;
                Ok(Action::RemoveSigner { role, account })
            }
            ActionKind::ChangeRequirement => {
                let [role_ix, required] = expect_uints::<2>(self, args, "2 uints (role, required)")?;
                expect_empty(self, args, false, true, true, "2 uints (role, required)")?;
                let role = Role::from_index(role_ix).ok_or(ActionError::UnknownRole(role_ix))?;
                let required = u32::try_from(required).map_err(|_| ActionError::OutOfRange {
                    kind: self,
                    detail: "required exceeds u32",
                })?;
                Ok(Action::ChangeRequirement { role, required })
            }
            ActionKind::SetSuperOwnerThresholdPercent => {
                let [percent] = expect_uints::<1>(self, args, "1 uint (percent)")?;
                expect_empty(self, args, false, true, true, "1 uint (percent)")?;
                let percent = u32::try_from(percent).map_err(|_| ActionError::OutOfRange {
                    kind: self,
                    detail: "percent exceeds u32",
                })?;
                Ok(Action::SetSuperOwnerThresholdPercent { percent })
            }
            ActionKind::SetCountdown => {
                let [kind_ix, length] =
                    expect_uints::<2>(self, args, "2 uints (countdown, seconds)")?;
                expect_empty(self, args, false, true, true, "2 uints (countdown, seconds)")?;
                let kind = CountdownKind::from_index(kind_ix)
                    .ok_or(ActionError::UnknownCountdown(kind_ix))?;
                let length_secs = u64::try_from(length).map_err(|_| ActionError::OutOfRange {
                    kind: self,
                    detail: "seconds exceeds u64",
                })?;
                Ok(Action::SetCountdown { kind, length_secs })
            }
            ActionKind::SetRedemptionFee => {
                let [fee] = expect_uints::<1>(self, args, "1 uint (fee)")?;
                expect_empty(self, args, false, true, true, "1 uint (fee)")?;
                Ok(Action::SetRedemptionFee { fee })
            }
            ActionKind::SetRedemptionFeeReceiver => {
                let account = decode_single_address(self, args)?;
                Ok(Action::SetRedemptionFeeReceiver { account })
            }
            ActionKind::SetMintingReceiver => {
                let account = decode_single_address(self, args)?;
                Ok(Action::SetMintingReceiver { account })
            }
            ActionKind::Pause => {
                expect_empty(self, args, true, true, true, "no arguments")?;
                Ok(Action::Pause)
            }
            ActionKind::Unpause => {
                expect_empty(self, args, true, true, true, "no arguments")?;
                Ok(Action::Unpause)
            }
            ActionKind::AddWhitelisted => {
                let account = decode_single_address(self, args)?;
                Ok(Action::AddWhitelisted { account })
            }
            ActionKind::AddWhitelistedBatch => {
                expect_empty(self, args, true, false, true, "1+ addresses")?;
                if args.addresses.is_empty() {
                    return Err(ActionError::ArityMismatch {
                        kind: self,
                        expected: "1+ addresses",
                    });
                }
                Ok(Action::AddWhitelistedBatch {
                    accounts: args.addresses.clone(),
                })
            }
            ActionKind::RemoveWhitelisted => {
                let account = decode_single_address(self, args)?;
                Ok(Action::RemoveWhitelisted { account })
            }
            ActionKind::SetSweepAddress => {
                expect_empty(self, args, true, false, true, "2 addresses (deposit, exchange)")?;
                let [deposit, exchange] = args.addresses.as_slice().try_into().map_err(|_| {
                    ActionError::ArityMismatch {
                        kind: self,
                        expected: "2 addresses (deposit, exchange)",
                    }
                })?;
                Ok(Action::SetSweepAddress { deposit, exchange })
            }
            ActionKind::AddPendingAssets => {
                const SCHEMA: &str =
                    "per asset: 2 uints (id, token_value), 1 address (owner), 1 hash (fingerprint)";
                let n = args.addresses.len();
                if n == 0 || args.uints.len() != 2 * n || args.hashes.len() != n {
                    return Err(ActionError::ArityMismatch {
                        kind: self,
                        expected: SCHEMA,
                    });
                }
                let mut assets = Vec::with_capacity(n);
                for i in 0..n {
                    let id = u64::try_from(args.uints[2 * i]).map_err(|_| {
                        ActionError::OutOfRange {
                            kind: self,
                            detail: "asset id exceeds u64",
                        }
                    })?;
                    assets.push(AssetInput {
                        id,
                        fingerprint: args.hashes[i],
                        token_value: args.uints[2 * i + 1],
                        owner: args.addresses[i],
                    });
                }
                Ok(Action::AddPendingAssets { assets })
            }
            ActionKind::RemovePendingAsset => {
                let id = decode_single_id(self, args, "1 uint (asset id)")?;
                Ok(Action::RemovePendingAsset { id })
            }
            ActionKind::CancelMintingRound => {
                expect_empty(self, args, true, true, true, "no arguments")?;
                Ok(Action::CancelMintingRound)
            }
            ActionKind::SetAssetReserved => {
                let id = decode_single_id(self, args, "1 uint (asset id)")?;
                Ok(Action::SetAssetReserved { id })
            }
            ActionKind::SetAssetEnlisted => {
                let id = decode_single_id(self, args, "1 uint (asset id)")?;
                Ok(Action::SetAssetEnlisted { id })
            }
            ActionKind::StartRedemptionCountdown => {
                let asset_id = decode_single_id(self, args, "1 uint (asset id)")?;
                Ok(Action::StartRedemptionCountdown { asset_id })
            }
        }
    }
}

fn expect_uints<const N: usize>(
    kind: ActionKind,
    args: &ActionArgs,
    expected: &'static str,
) -> Result<[u128; N], ActionError> {
    args.uints
        .as_slice()
        .try_into()
        .map_err(|_| ActionError::ArityMismatch { kind, expected })
}

/// Checks that the argument arrays flagged `true` are empty.
fn expect_empty(
    kind: ActionKind,
    args: &ActionArgs,
    uints: bool,
    addresses: bool,
    hashes: bool,
    expected: &'static str,
) -> Result<(), ActionError> {
    let stray = (uints && !args.uints.is_empty())
        || (addresses && !args.addresses.is_empty())
        || (hashes && !args.hashes.is_empty());
    if stray {
        return Err(ActionError::ArityMismatch { kind, expected });
    }
    Ok(())
}

fn decode_role_account(
    kind: ActionKind,
    args: &ActionArgs,
) -> Result<(Role, Address), ActionError> {
    const SCHEMA: &str = "1 uint (role), 1 address (account)";
    expect_empty(kind, args, false, false, true, SCHEMA)?;
    let [role_ix] = expect_uints::<1>(kind, args, SCHEMA)?;
    let [account] = args
        .addresses
        .as_slice()
        .try_into()
        .map_err(|_| ActionError::ArityMismatch {
            kind,
            expected: SCHEMA,
        })?;
    let role = Role::from_index(role_ix).ok_or(ActionError::UnknownRole(role_ix))?;
    Ok((role, account))
}

fn decode_single_address(kind: ActionKind, args: &ActionArgs) -> Result<Address, ActionError> {
    const SCHEMA: &str = "1 address";
    expect_empty(kind, args, true, false, true, SCHEMA)?;
    let [account] = args
        .addresses
        .as_slice()
        .try_into()
        .map_err(|_| ActionError::ArityMismatch {
            kind,
            expected: SCHEMA,
        })?;
    Ok(account)
}

fn decode_single_id(
    kind: ActionKind,
    args: &ActionArgs,
    expected: &'static str,
) -> Result<u64, ActionError> {
    expect_empty(kind, args, false, true, true, expected)?;
    let [id] = expect_uints::<1>(kind, args, expected)?;
    u64::try_from(id).map_err(|_| ActionError::OutOfRange {
        kind,
        detail: "id exceeds u64",
    })
}
