//! # Deployment Registry
//!
//! The aggregate that wires the five quorum authorizers, the whitelist,
//! the asset ledger, and the restricted token into one governed system.
//! Components never hold references to each other; they are owned
//! collections inside [`State`], and every cross-component workflow
//! (redemption escrow, minting-round payouts, whitelist-gated transfers)
//! is orchestrated here through each component's own API.
//!
//! ## Dispatch
//!
//! A privileged change enters as an [`Action`], routed to the authorizer
//! of its statically bound initiating role. When that authorizer reaches
//! quorum it releases the payload back, and [`Registry`] applies it with
//! an exhaustive match. The SuperOwner authorizer's approval requirement
//! is recomputed from its threshold percentage on every membership
//! change, so quorum strength scales with the owner set.
//!
//! ## Atomicity
//!
//! Every public mutating entry point runs against a snapshot: if any step
//! fails, the pre-call state is restored wholesale and the specific error
//! surfaces to the caller. No partial mutation ever survives a failure.

use crate::account::Address;
use crate::actions::{Action, ActionArgs, ActionError, ActionKind, CountdownKind, Role};
use crate::assets::{Asset, AssetError, AssetLedger, AssetStatus};
use crate::clock::Clock;
use crate::config::{
    DEFAULT_DAILY_LIMIT_UPDATE_COUNTDOWN_SECS, DEFAULT_DELAYED_TRANSFER_COUNTDOWN_SECS,
    DEFAULT_MINTING_COUNTDOWN_SECS, DEFAULT_REDEMPTION_COUNTDOWN_SECS, DEFAULT_TOKEN_DECIMALS,
    DEFAULT_WHITELIST_REMOVAL_COUNTDOWN_SECS,
};
use crate::multisig::{ActionId, MultiSigAuthorizer, MultisigError};
use crate::token::{
    RestrictedToken, TokenEnv, TokenError, TransferId, TransferOutcome, TransferRecord,
};
use crate::whitelist::{Whitelist, WhitelistError};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors surfaced by registry entry points. Component errors pass through
/// untouched so callers always see the specific failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Quorum-authorizer failure.
    #[error(transparent)]
    Multisig(#[from] MultisigError),

    /// Action decoding failure.
    #[error(transparent)]
    Action(#[from] ActionError),

    /// Whitelist failure.
    #[error(transparent)]
    Whitelist(#[from] WhitelistError),

    /// Asset-ledger failure.
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// Token failure.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// The system is paused.
    #[error("the system is paused")]
    Paused,

    /// The action was submitted under the wrong role.
    #[error("{kind} must be initiated by {expected}, not {given}")]
    WrongRole {
        /// The action kind.
        kind: ActionKind,
        /// Its statically bound initiating role.
        expected: Role,
        /// The role the caller named.
        given: Role,
    },

    /// The threshold percentage must sit in 1..=100.
    #[error("threshold percent {0} must be between 1 and 100")]
    InvalidThresholdPercent(u32),

    /// SuperOwner's requirement is derived, never set directly.
    #[error("the SuperOwner requirement is derived from its threshold percent")]
    DerivedRequirement,

    /// The caller's balance does not cover a redemption's cost.
    #[error("insufficient balance for {account}: has {balance}, needs {needed}")]
    InsufficientBalance {
        /// The requesting account.
        account: Address,
        /// Its balance.
        balance: u128,
        /// Token value plus redemption fee.
        needed: u128,
    },

    /// The caller may not cancel this redemption.
    #[error("{account} does not hold the redemption lock for asset {asset_id}")]
    NotLockHolder {
        /// The asset in question.
        asset_id: u64,
        /// The rejected caller.
        account: Address,
    },

    /// The bootstrap configuration named the zero address where a live
    /// account is required.
    #[error("bootstrap requires a non-zero {field} account")]
    ZeroBootstrapAccount {
        /// Which configured account was zero.
        field: &'static str,
    },
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Countdown lengths, one per [`CountdownKind`], in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountdownConfig {
    /// Minting round confirmation to enlistment.
    pub minting_secs: u64,
    /// Redemption confirmation to burn eligibility.
    pub redemption_secs: u64,
    /// Whitelist removal proposal to finalization.
    pub whitelist_removal_secs: u64,
    /// Large-transfer escrow to execution eligibility.
    pub delayed_transfer_secs: u64,
    /// Daily-limit change request to activation.
    pub daily_limit_update_secs: u64,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            minting_secs: DEFAULT_MINTING_COUNTDOWN_SECS,
            redemption_secs: DEFAULT_REDEMPTION_COUNTDOWN_SECS,
            whitelist_removal_secs: DEFAULT_WHITELIST_REMOVAL_COUNTDOWN_SECS,
            delayed_transfer_secs: DEFAULT_DELAYED_TRANSFER_COUNTDOWN_SECS,
            daily_limit_update_secs: DEFAULT_DAILY_LIMIT_UPDATE_COUNTDOWN_SECS,
        }
    }
}

impl CountdownConfig {
    /// The configured length for `kind`, in seconds.
    pub fn get(&self, kind: CountdownKind) -> u64 {
        match kind {
            CountdownKind::Minting => self.minting_secs,
            CountdownKind::Redemption => self.redemption_secs,
            CountdownKind::WhitelistRemoval => self.whitelist_removal_secs,
            CountdownKind::DelayedTransfer => self.delayed_transfer_secs,
            CountdownKind::DailyLimitUpdate => self.daily_limit_update_secs,
        }
    }

    /// Replaces the configured length for `kind`.
    pub fn set(&mut self, kind: CountdownKind, secs: u64) {
        match kind {
            CountdownKind::Minting => self.minting_secs = secs,
            CountdownKind::Redemption => self.redemption_secs = secs,
            CountdownKind::WhitelistRemoval => self.whitelist_removal_secs = secs,
            CountdownKind::DelayedTransfer => self.delayed_transfer_secs = secs,
            CountdownKind::DailyLimitUpdate => self.daily_limit_update_secs = secs,
        }
    }

    /// The configured length for `kind`, as a duration.
    pub fn duration(&self, kind: CountdownKind) -> Duration {
        Duration::seconds(self.get(kind) as i64)
    }
}

/// Initial signer set for one non-SuperOwner role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleConfig {
    /// Initial signers.
    pub signers: Vec<Address>,
    /// Initial approval requirement.
    pub required: u32,
}

/// Token parameters fixed at bootstrap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Display name.
    pub name: String,
    /// Ticker symbol.
    pub symbol: String,
    /// Fixed-point scale.
    pub decimals: u8,
    /// Daily limit applied to accounts that never set their own; zero
    /// disables the check.
    pub default_daily_limit: u128,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            name: "Landmark Property Token".into(),
            symbol: "LMK".into(),
            decimals: DEFAULT_TOKEN_DECIMALS,
            default_daily_limit: 0,
        }
    }
}

/// Asset-ledger parameters fixed at bootstrap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Fee charged on every redemption request, in base units.
    pub redemption_fee: u128,
    /// The account credited with redemption fees.
    pub fee_receiver: Address,
    /// The account minting-round payouts are credited to.
    pub minting_receiver: Address,
    /// The ledger's own escrow account, holding locked redemption balance.
    pub escrow_account: Address,
}

/// Everything a deployment needs at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// SuperOwner signer set; its requirement is derived from
    /// `super_owner_threshold_percent`.
    pub super_owners: Vec<Address>,
    /// Percentage used to derive the SuperOwner requirement (1..=100).
    pub super_owner_threshold_percent: u32,
    /// BasicOwner authorizer.
    pub basic_owners: RoleConfig,
    /// OperationAdmin authorizer.
    pub operation_admins: RoleConfig,
    /// MintingAdmin authorizer.
    pub minting_admins: RoleConfig,
    /// RedemptionAdmin authorizer.
    pub redemption_admins: RoleConfig,
    /// Token parameters.
    pub token: TokenConfig,
    /// Asset-ledger parameters.
    pub assets: AssetConfig,
    /// Countdown lengths.
    pub countdowns: CountdownConfig,
    /// Accounts whitelisted from the start.
    pub initial_whitelist: Vec<Address>,
}

// ---------------------------------------------------------------------------
// State and registry
// ---------------------------------------------------------------------------

/// The complete deployment state. Cloneable so entry points can snapshot
/// and roll back, serializable so deployments survive as JSON documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    authorizers: BTreeMap<Role, MultiSigAuthorizer>,
    whitelist: Whitelist,
    assets: AssetLedger,
    token: RestrictedToken,
    countdowns: CountdownConfig,
    threshold_percent: u32,
    escrow_account: Address,
    paused: bool,
}

impl State {
    /// Splits out the token alongside the ambient inputs its mutating
    /// operations need. Field-precise so the whitelist borrow and the
    /// token borrow coexist.
    fn token_parts(
        &mut self,
        now: chrono::DateTime<chrono::Utc>,
    ) -> (&mut RestrictedToken, TokenEnv<'_>) {
        let delayed_transfer_countdown = self.countdowns.duration(CountdownKind::DelayedTransfer);
        let daily_limit_update_countdown =
            self.countdowns.duration(CountdownKind::DailyLimitUpdate);
        let State {
            whitelist,
            token,
            paused,
            ..
        } = self;
        (
            token,
            TokenEnv {
                whitelist,
                paused: *paused,
                now,
                delayed_transfer_countdown,
                daily_limit_update_countdown,
            },
        )
    }
}

/// The governed deployment: owned [`State`] plus an injected clock.
pub struct Registry {
    state: State,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Registry {
    /// Bootstraps a deployment.
    ///
    /// The fee receiver, minting receiver, and escrow account are
    /// whitelisted here alongside `initial_whitelist`, so the money legs
    /// of the asset workflows cannot strand on a whitelist check.
    pub fn new(config: BootstrapConfig, clock: Arc<dyn Clock>) -> Result<Self, RegistryError> {
        if config.super_owner_threshold_percent == 0 || config.super_owner_threshold_percent > 100
        {
            return Err(RegistryError::InvalidThresholdPercent(
                config.super_owner_threshold_percent,
            ));
        }
        for (field, account) in [
            ("fee receiver", config.assets.fee_receiver),
            ("minting receiver", config.assets.minting_receiver),
            ("escrow", config.assets.escrow_account),
        ] {
            if account.is_zero() {
                return Err(RegistryError::ZeroBootstrapAccount { field });
            }
        }

        let super_required = derived_requirement(
            config.super_owners.len() as u32,
            config.super_owner_threshold_percent,
        );
        let mut authorizers = BTreeMap::new();
        authorizers.insert(
            Role::SuperOwner,
            MultiSigAuthorizer::new(Role::SuperOwner, config.super_owners, super_required)?,
        );
        for (role, rc) in [
            (Role::BasicOwner, &config.basic_owners),
            (Role::OperationAdmin, &config.operation_admins),
            (Role::MintingAdmin, &config.minting_admins),
            (Role::RedemptionAdmin, &config.redemption_admins),
        ] {
            authorizers.insert(
                role,
                MultiSigAuthorizer::new(role, rc.signers.iter().copied(), rc.required)?,
            );
        }

        let mut whitelist = Whitelist::new();
        for account in [
            config.assets.fee_receiver,
            config.assets.minting_receiver,
            config.assets.escrow_account,
        ]
        .into_iter()
        .chain(config.initial_whitelist.iter().copied())
        {
            if !whitelist.is_whitelisted(account) {
                whitelist.add(account)?;
            }
        }

        let state = State {
            authorizers,
            whitelist,
            assets: AssetLedger::new(
                config.assets.redemption_fee,
                config.assets.fee_receiver,
                config.assets.minting_receiver,
            ),
            token: RestrictedToken::new(
                config.token.name,
                config.token.symbol,
                config.token.decimals,
                config.token.default_daily_limit,
            ),
            countdowns: config.countdowns,
            threshold_percent: config.super_owner_threshold_percent,
            escrow_account: config.assets.escrow_account,
            paused: false,
        };
        info!(
            super_required,
            threshold = state.threshold_percent,
            "deployment bootstrapped"
        );
        Ok(Self { state, clock })
    }

    /// Rehydrates a registry from a serialized [`State`] snapshot.
    pub fn from_state(state: State, clock: Arc<dyn Clock>) -> Self {
        Self { state, clock }
    }

    /// The current state, for snapshots and read-side inspection.
    pub fn state(&self) -> &State {
        &self.state
    }

    // -- governance surface -------------------------------------------------

    /// Submits a typed action to its initiating role's authorizer.
    ///
    /// Returns the action id. With a 1-of-M authorizer the payload applies
    /// before this returns.
    pub fn submit_action(
        &mut self,
        action: Action,
        caller: Address,
    ) -> Result<ActionId, RegistryError> {
        self.transactional(|reg| {
            let role = action.initiating_role();
            let now = reg.clock.now();
            let (id, released) = reg.authorizer_mut(role).submit(action, caller, now)?;
            if let Some(payload) = released {
                reg.apply_action(payload)?;
            }
            Ok(id)
        })
    }

    /// The untyped administrative surface: decodes `kind` + `args`,
    /// type-checks arity, verifies the named role matches the action's
    /// static binding, and forwards to [`Registry::submit_action`].
    pub fn invoke(
        &mut self,
        role: Role,
        kind: ActionKind,
        args: &ActionArgs,
        caller: Address,
    ) -> Result<ActionId, RegistryError> {
        let action = kind.decode(args)?;
        let expected = action.initiating_role();
        if expected != role {
            return Err(RegistryError::WrongRole {
                kind,
                expected,
                given: role,
            });
        }
        self.submit_action(action, caller)
    }

    /// Approves a pending action; applies its payload when quorum lands.
    pub fn approve(
        &mut self,
        role: Role,
        id: ActionId,
        caller: Address,
    ) -> Result<(), RegistryError> {
        self.transactional(|reg| {
            if let Some(payload) = reg.authorizer_mut(role).approve(id, caller)? {
                reg.apply_action(payload)?;
            }
            Ok(())
        })
    }

    /// Withdraws the caller's approval from a pending action.
    pub fn revoke(
        &mut self,
        role: Role,
        id: ActionId,
        caller: Address,
    ) -> Result<(), RegistryError> {
        self.transactional(|reg| Ok(reg.authorizer_mut(role).revoke(id, caller)?))
    }

    /// Applies a quorum-released payload. Exhaustive by construction:
    /// adding an [`Action`] variant without handling it here does not
    /// compile.
    fn apply_action(&mut self, action: Action) -> Result<(), RegistryError> {
        info!(kind = %action.kind(), "applying quorum-approved action");
        match action {
            Action::AddSigner { role, account } => {
                self.authorizer_mut(role).add_signer(account)?;
                self.resync_super_owner_requirement(role);
            }
            Action::RemoveSigner { role, account } => {
                self.authorizer_mut(role).remove_signer(account)?;
                self.resync_super_owner_requirement(role);
            }
            Action::ChangeRequirement { role, required } => {
                if role == Role::SuperOwner {
                    return Err(RegistryError::DerivedRequirement);
                }
                self.authorizer_mut(role).change_requirement(required)?;
            }
            Action::SetSuperOwnerThresholdPercent { percent } => {
                if percent == 0 || percent > 100 {
                    return Err(RegistryError::InvalidThresholdPercent(percent));
                }
                self.state.threshold_percent = percent;
                self.resync_super_owner_requirement(Role::SuperOwner);
            }
            Action::SetCountdown { kind, length_secs } => {
                self.state.countdowns.set(kind, length_secs);
            }
            Action::SetRedemptionFee { fee } => {
                self.state.assets.set_redemption_fee(fee);
            }
            Action::SetRedemptionFeeReceiver { account } => {
                self.require_whitelisted(account)?;
                self.state.assets.set_fee_receiver(account);
            }
            Action::SetMintingReceiver { account } => {
                self.require_whitelisted(account)?;
                self.state.assets.set_minting_receiver(account);
            }
            Action::Pause => {
                self.state.paused = true;
                warn!("system paused");
            }
            Action::Unpause => {
                self.state.paused = false;
                warn!("system unpaused");
            }
            Action::AddWhitelisted { account } => {
                self.state.whitelist.add(account)?;
            }
            Action::AddWhitelistedBatch { accounts } => {
                self.state.whitelist.add_many(accounts)?;
            }
            Action::RemoveWhitelisted { account } => {
                let now = self.clock.now();
                self.state.whitelist.propose_removal(account, now)?;
            }
            Action::SetSweepAddress { deposit, exchange } => {
                self.state.token.set_sweep_address(deposit, exchange)?;
            }
            Action::AddPendingAssets { assets } => {
                let now = self.clock.now();
                self.state.assets.open_minting_round(&assets, now)?;
            }
            Action::RemovePendingAsset { id } => {
                self.state.assets.remove_pending_asset(id)?;
            }
            Action::CancelMintingRound => {
                self.state.assets.cancel_minting_round()?;
            }
            Action::SetAssetReserved { id } => {
                self.state.assets.set_reserved(id)?;
            }
            Action::SetAssetEnlisted { id } => {
                self.state.assets.set_enlisted(id)?;
            }
            Action::StartRedemptionCountdown { asset_id } => {
                let now = self.clock.now();
                self.state.assets.start_redemption_countdown(asset_id, now)?;
            }
        }
        Ok(())
    }

    // -- token surface ------------------------------------------------------

    /// Transfers from the caller's own balance.
    pub fn transfer(
        &mut self,
        caller: Address,
        to: Address,
        value: u128,
    ) -> Result<TransferOutcome, RegistryError> {
        self.transactional(|reg| {
            let now = reg.clock.now();
            let (token, env) = reg.state.token_parts(now);
            Ok(token.transfer(&env, caller, to, value)?)
        })
    }

    /// Transfers on behalf of `from`, consuming the caller's allowance.
    pub fn transfer_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        value: u128,
    ) -> Result<TransferOutcome, RegistryError> {
        self.transactional(|reg| {
            let now = reg.clock.now();
            let (token, env) = reg.state.token_parts(now);
            Ok(token.transfer_from(&env, caller, from, to, value)?)
        })
    }

    /// Sets the caller's allowance to `spender`.
    pub fn approve_allowance(&mut self, caller: Address, spender: Address, value: u128) {
        self.state.token.approve(caller, spender, value);
    }

    /// Executes a parked large transfer once its countdown has elapsed.
    pub fn execute_delayed_transfer(
        &mut self,
        id: TransferId,
        caller: Address,
    ) -> Result<(), RegistryError> {
        self.transactional(|reg| {
            let now = reg.clock.now();
            let (token, env) = reg.state.token_parts(now);
            Ok(token.execute_delayed_transfer(&env, id, caller)?)
        })
    }

    /// Cancels a parked large transfer.
    pub fn cancel_delayed_transfer(
        &mut self,
        id: TransferId,
        caller: Address,
    ) -> Result<(), RegistryError> {
        self.transactional(|reg| Ok(reg.state.token.cancel_delayed_transfer(id, caller)?))
    }

    /// Requests a new daily limit for the caller's own account; it
    /// activates once the daily-limit-update countdown elapses.
    pub fn update_daily_limit(&mut self, caller: Address, new_limit: u128) {
        let now = self.clock.now();
        self.state.token.update_daily_limit(caller, new_limit, now);
    }

    // -- asset surface ------------------------------------------------------

    /// Locks an enlisted asset for redemption.
    ///
    /// Charges `token_value + redemption_fee` from the caller: the fee
    /// goes to the fee receiver immediately, the token value into escrow.
    /// Submits the start-countdown action to the RedemptionAdmin
    /// authorizer and returns its id; the countdown begins when that
    /// action reaches quorum.
    pub fn request_redemption(
        &mut self,
        asset_id: u64,
        caller: Address,
    ) -> Result<ActionId, RegistryError> {
        self.transactional(|reg| {
            reg.require_not_paused()?;
            let now = reg.clock.now();

            let fee = reg.state.assets.redemption_fee();
            let fee_receiver = reg.state.assets.fee_receiver();
            let value = reg.state.assets.lock_for_redemption(asset_id, caller)?;

            let cost = value
                .checked_add(fee)
                .ok_or(TokenError::AmountOverflow)?;
            let balance = reg.state.token.balance_of(caller);
            if balance < cost {
                return Err(RegistryError::InsufficientBalance {
                    account: caller,
                    balance,
                    needed: cost,
                });
            }

            reg.state
                .token
                .move_unrestricted(caller, fee_receiver, fee, now)?;
            reg.state
                .token
                .move_unrestricted(caller, reg.state.escrow_account, value, now)?;

            let id = reg
                .authorizer_mut(Role::RedemptionAdmin)
                .submit_external(Action::StartRedemptionCountdown { asset_id }, now);
            Ok(id)
        })
    }

    /// Cancels an in-flight redemption. Only the lock holder may cancel;
    /// the escrowed amount is refunded and the asset returns to Enlisted.
    pub fn cancel_redemption(
        &mut self,
        asset_id: u64,
        caller: Address,
    ) -> Result<(), RegistryError> {
        self.transactional(|reg| {
            reg.require_not_paused()?;
            match reg.state.assets.redemption_lock(asset_id) {
                Some(lock) if lock.account == caller => {}
                Some(_) => {
                    return Err(RegistryError::NotLockHolder {
                        asset_id,
                        account: caller,
                    })
                }
                None => return Err(AssetError::NoActiveLock { id: asset_id }.into()),
            }
            reg.refund_lock(asset_id)
        })
    }

    /// Rejects an in-flight redemption. RedemptionAdmin signers only;
    /// same refund semantics as cancellation.
    pub fn reject_redemption(
        &mut self,
        asset_id: u64,
        caller: Address,
    ) -> Result<(), RegistryError> {
        self.transactional(|reg| {
            reg.require_not_paused()?;
            reg.require_signer(Role::RedemptionAdmin, caller)?;
            reg.refund_lock(asset_id)
        })
    }

    /// Completes a redemption: burns the escrowed amount and retires the
    /// asset. RedemptionAdmin signers only; the redemption countdown must
    /// have been started by quorum and elapsed.
    pub fn execute_redemption(
        &mut self,
        asset_id: u64,
        caller: Address,
    ) -> Result<(), RegistryError> {
        self.transactional(|reg| {
            reg.require_not_paused()?;
            reg.require_signer(Role::RedemptionAdmin, caller)?;
            let now = reg.clock.now();
            let countdown = reg.state.countdowns.duration(CountdownKind::Redemption);
            let lock = reg.state.assets.execute_redemption(asset_id, now, countdown)?;
            reg.state
                .token
                .burn(reg.state.escrow_account, lock.amount, now)?;
            Ok(())
        })
    }

    /// Enlists the open minting round once its countdown has elapsed,
    /// minting each asset's token value to the minting receiver.
    /// MintingAdmin signers only.
    pub fn refresh_minting_round(&mut self, caller: Address) -> Result<(), RegistryError> {
        self.transactional(|reg| {
            reg.require_not_paused()?;
            reg.require_signer(Role::MintingAdmin, caller)?;
            let now = reg.clock.now();
            let countdown = reg.state.countdowns.duration(CountdownKind::Minting);
            let minted = reg.state.assets.finalize_minting_round(now, countdown)?;
            let receiver = reg.state.assets.minting_receiver();
            for (id, value) in minted {
                reg.state
                    .token
                    .mint(&reg.state.whitelist, receiver, value, now)?;
                info!(asset = id, value, "asset enlisted and backing balance minted");
            }
            Ok(())
        })
    }

    /// Finalizes a quorum-proposed whitelist removal once its countdown
    /// has elapsed. OperationAdmin signers only.
    pub fn finalize_whitelist_removal(
        &mut self,
        account: Address,
        caller: Address,
    ) -> Result<(), RegistryError> {
        self.transactional(|reg| {
            reg.require_signer(Role::OperationAdmin, caller)?;
            let now = reg.clock.now();
            let countdown = reg
                .state
                .countdowns
                .duration(CountdownKind::WhitelistRemoval);
            Ok(reg
                .state
                .whitelist
                .finalize_removal(account, now, countdown)?)
        })
    }

    // -- queries ------------------------------------------------------------

    /// Balance of an account, in base units.
    pub fn balance_of(&self, account: Address) -> u128 {
        self.state.token.balance_of(account)
    }

    /// Total circulating supply.
    pub fn total_supply(&self) -> u128 {
        self.state.token.total_supply()
    }

    /// The asset registered under `id`, if any.
    pub fn asset(&self, id: u64) -> Option<&Asset> {
        self.state.assets.asset(id)
    }

    /// Number of assets currently Pending.
    pub fn pending_asset_count(&self) -> usize {
        self.state.assets.pending_count()
    }

    /// Sum of token values over assets in `status`.
    pub fn total_tokens(&self, status: AssetStatus) -> u128 {
        self.state.assets.total_tokens(status)
    }

    /// Whether circulating supply equals the summed token value of
    /// Enlisted, Locked, and Reserved assets.
    pub fn is_fully_collateralized(&self) -> bool {
        self.state.assets.collateralized_tokens() == self.state.token.total_supply()
    }

    /// Whether `account` may hold and receive balance.
    pub fn is_whitelisted(&self, account: Address) -> bool {
        self.state.whitelist.is_whitelisted(account)
    }

    /// The daily limit in force for `account` right now.
    pub fn daily_limit(&self, account: Address) -> u128 {
        self.state.token.daily_limit(
            account,
            self.clock.now(),
            self.state
                .countdowns
                .duration(CountdownKind::DailyLimitUpdate),
        )
    }

    /// The configured length of a countdown, in seconds.
    pub fn countdown_length(&self, kind: CountdownKind) -> u64 {
        self.state.countdowns.get(kind)
    }

    /// Distinct approvals recorded for an action.
    pub fn approval_count(&self, role: Role, id: ActionId) -> Option<u32> {
        self.authorizer(role).approval_count(id)
    }

    /// The authorizer bound to `role`, for read-side inspection.
    pub fn authorizer(&self, role: Role) -> &MultiSigAuthorizer {
        self.state
            .authorizers
            .get(&role)
            .expect("every role is bound at bootstrap")
    }

    /// Whether the system is paused.
    pub fn is_paused(&self) -> bool {
        self.state.paused
    }

    /// Read access to the token ledger.
    pub fn token(&self) -> &RestrictedToken {
        &self.state.token
    }

    /// Read access to the asset ledger.
    pub fn assets(&self) -> &AssetLedger {
        &self.state.assets
    }

    /// Read access to the whitelist.
    pub fn whitelist(&self) -> &Whitelist {
        &self.state.whitelist
    }

    /// The append-only transfer journal.
    pub fn journal(&self) -> &[TransferRecord] {
        self.state.token.journal()
    }

    /// Runs the transfer checks without mutating state. Codes match
    /// [`crate::token`]'s restriction constants.
    pub fn detect_transfer_restriction(&self, from: Address, to: Address, value: u128) -> u8 {
        let env = self.token_env();
        self.state
            .token
            .detect_transfer_restriction(&env, from, to, value)
    }

    // -- internals ----------------------------------------------------------

    /// Snapshot-rollback wrapper: any error restores the pre-call state.
    fn transactional<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, RegistryError>,
    ) -> Result<T, RegistryError> {
        let snapshot = self.state.clone();
        match f(self) {
            Ok(value) => Ok(value),
            Err(err) => {
                self.state = snapshot;
                Err(err)
            }
        }
    }

    fn token_env(&self) -> TokenEnv<'_> {
        TokenEnv {
            whitelist: &self.state.whitelist,
            paused: self.state.paused,
            now: self.clock.now(),
            delayed_transfer_countdown: self
                .state
                .countdowns
                .duration(CountdownKind::DelayedTransfer),
            daily_limit_update_countdown: self
                .state
                .countdowns
                .duration(CountdownKind::DailyLimitUpdate),
        }
    }

    fn authorizer_mut(&mut self, role: Role) -> &mut MultiSigAuthorizer {
        self.state
            .authorizers
            .get_mut(&role)
            .expect("every role is bound at bootstrap")
    }

    fn require_signer(&self, role: Role, account: Address) -> Result<(), RegistryError> {
        if !self.authorizer(role).is_signer(account) {
            return Err(MultisigError::NotSigner { role, account }.into());
        }
        Ok(())
    }

    fn require_not_paused(&self) -> Result<(), RegistryError> {
        if self.state.paused {
            return Err(RegistryError::Paused);
        }
        Ok(())
    }

    fn require_whitelisted(&self, account: Address) -> Result<(), RegistryError> {
        if !self.state.whitelist.is_whitelisted(account) {
            return Err(WhitelistError::NotWhitelisted { account }.into());
        }
        Ok(())
    }

    /// Refunds and releases the lock on `asset_id`.
    fn refund_lock(&mut self, asset_id: u64) -> Result<(), RegistryError> {
        let now = self.clock.now();
        let lock = self.state.assets.release_lock(asset_id)?;
        self.state
            .token
            .move_unrestricted(self.state.escrow_account, lock.account, lock.amount, now)?;
        Ok(())
    }

    fn resync_super_owner_requirement(&mut self, changed_role: Role) {
        if changed_role != Role::SuperOwner {
            return;
        }
        let percent = self.state.threshold_percent;
        let authorizer = self.authorizer_mut(Role::SuperOwner);
        let required = derived_requirement(authorizer.signer_count(), percent);
        // Always valid: 1 <= ceil(n * pct / 100) <= n for pct in 1..=100.
        if authorizer.change_requirement(required).is_ok() {
            info!(required, percent, "SuperOwner requirement resynced");
        }
    }
}

/// `ceil(signers * percent / 100)`, clamped to at least 1.
fn derived_requirement(signers: u32, percent: u32) -> u32 {
    let raw = (signers * percent).div_ceil(100);
    raw.max(1)
}
