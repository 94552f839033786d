//! # Restricted Token
//!
//! The fungible balance ledger, wrapped in a transfer-restriction engine.
//! Every outbound transfer runs the same pipeline, in order:
//!
//! 1. **Sweep resolution** — recipients whose sweep key is mapped to an
//!    exchange account are redirected there, and the nominal recipient is
//!    journaled as a secondary record so observers can reconstruct the
//!    true routing.
//! 2. **Pause** — a paused system moves nothing.
//! 3. **Whitelist** — the effective recipient must be allowed to hold
//!    balance.
//! 4. **Daily limit** — a transfer that would push the sender past its
//!    rolling 24-hour allowance does not fail; it parks in a delayed
//!    transfer that becomes executable once the large-transfer countdown
//!    elapses.
//!
//! Mint and burn are reached only through the asset workflows (a minting
//! round enlisting assets, a redemption burning escrow), which is what
//! keeps the ledger fully collateralized.

use crate::account::Address;
use crate::config::TRANSFER_WINDOW_SECS;
use crate::whitelist::Whitelist;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info};

/// Identifier of a delayed transfer, monotonically increasing.
pub type TransferId = u64;

/// Restriction code: the transfer passes every check.
pub const RESTRICTION_NONE: u8 = 0;
/// Restriction code: the effective recipient is not whitelisted.
pub const RESTRICTION_NOT_WHITELISTED: u8 = 1;
/// Restriction code: the transfer exceeds the sender's daily limit.
pub const RESTRICTION_DAILY_LIMIT: u8 = 2;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from token operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// The system is paused.
    #[error("the system is paused")]
    Paused,

    /// The effective recipient may not hold balance.
    #[error("{account} is not whitelisted")]
    NotWhitelisted {
        /// The rejected recipient.
        account: Address,
    },

    /// The debited account holds less than the operation needs.
    #[error("insufficient balance for {account}: has {balance}, needs {needed}")]
    InsufficientBalance {
        /// The debited account.
        account: Address,
        /// Its current balance.
        balance: u128,
        /// The amount required.
        needed: u128,
    },

    /// The spender's allowance does not cover the transfer.
    #[error("insufficient allowance from {owner} to {spender}: has {allowance}, needs {needed}")]
    InsufficientAllowance {
        /// The account whose balance would move.
        owner: Address,
        /// The account spending on its behalf.
        spender: Address,
        /// The current allowance.
        allowance: u128,
        /// The amount required.
        needed: u128,
    },

    /// A balance or supply update would overflow.
    #[error("amount overflow")]
    AmountOverflow,

    /// No delayed transfer exists under this identifier.
    #[error("no delayed transfer {id}")]
    NoSuchTransfer {
        /// The missing identifier.
        id: TransferId,
    },

    /// The delayed transfer's countdown has not elapsed.
    #[error("delayed transfer {id} is still in countdown")]
    CountdownNotElapsed {
        /// The transfer in question.
        id: TransferId,
    },

    /// The caller may not perform this operation on the delayed transfer.
    #[error("{account} may not act on delayed transfer {id}")]
    Unauthorized {
        /// The transfer in question.
        id: TransferId,
        /// The rejected caller.
        account: Address,
    },

    /// The restriction code is not one this engine produces.
    #[error("unknown restriction code {code}")]
    UnknownRestrictionCode {
        /// The unrecognized code.
        code: u8,
    },

    /// The deposit address collapses to the zero sweep key.
    #[error("{deposit} derives the zero sweep key")]
    ZeroSweepKey {
        /// The rejected deposit address.
        deposit: Address,
    },

    /// Balance cannot move to the zero address outside of a burn.
    #[error("the zero address cannot receive balance")]
    ZeroAddressRecipient,
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Ambient inputs a transfer needs from the surrounding registry.
#[derive(Clone, Copy)]
pub struct TokenEnv<'a> {
    /// The current whitelist.
    pub whitelist: &'a Whitelist,
    /// Whether the system is paused.
    pub paused: bool,
    /// The authoritative time for this call.
    pub now: DateTime<Utc>,
    /// Countdown a delayed transfer waits behind.
    pub delayed_transfer_countdown: Duration,
    /// Countdown a daily-limit change waits behind.
    pub daily_limit_update_countdown: Duration,
}

/// Which entry point originated a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferMethod {
    /// A direct `transfer` from the sender's own balance.
    Transfer,
    /// A `transfer_from` by an approved spender.
    TransferFrom,
}

/// Result of a transfer attempt that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Balance moved immediately.
    Completed,
    /// The transfer exceeded the sender's remaining daily allowance and
    /// was parked behind the large-transfer countdown.
    Delayed(TransferId),
}

/// A transfer parked behind the large-transfer countdown. No balance has
/// moved yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayedTransfer {
    /// The account to debit.
    pub from: Address,
    /// The nominal recipient. Sweep resolution happens again at execution.
    pub to: Address,
    /// The amount, in base units.
    pub value: u128,
    /// Which entry point created this record.
    pub method: TransferMethod,
    /// The account that initiated the request (`from` itself for
    /// [`TransferMethod::Transfer`], the spender for
    /// [`TransferMethod::TransferFrom`]).
    pub initiated_by: Address,
    /// When the countdown started.
    pub countdown_start: DateTime<Utc>,
}

/// Whether a journal entry is the effective movement or the nominal,
/// pre-sweep routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferRecordKind {
    /// Balance actually moved along this edge.
    Primary,
    /// The nominal recipient of a swept transfer. No balance moved here.
    Original,
}

/// One entry in the append-only transfer journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    /// Primary movement or original (pre-sweep) routing.
    pub kind: TransferRecordKind,
    /// Debited account (the zero address for mints).
    pub from: Address,
    /// Credited account (the zero address for burns).
    pub to: Address,
    /// The amount, in base units.
    pub value: u128,
    /// When the entry was journaled.
    pub at: DateTime<Utc>,
}

/// An account's daily-limit configuration. A limit of zero disables the
/// check. Changes wait behind a countdown and activate lazily.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct DailyLimitSetting {
    limit: u128,
    pending: Option<PendingLimit>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct PendingLimit {
    value: u128,
    requested_at: DateTime<Utc>,
}

/// An account's rolling spending window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SpendingWindow {
    window_start: DateTime<Utc>,
    spent: u128,
}

// ---------------------------------------------------------------------------
// RestrictedToken
// ---------------------------------------------------------------------------

/// The balance ledger and its restriction state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictedToken {
    /// Display name.
    pub name: String,
    /// Ticker symbol.
    pub symbol: String,
    /// Fixed-point scale: balances are integers scaled by `10^decimals`.
    pub decimals: u8,
    balances: BTreeMap<Address, u128>,
    allowances: BTreeMap<Address, BTreeMap<Address, u128>>,
    total_supply: u128,
    default_daily_limit: u128,
    limits: BTreeMap<Address, DailyLimitSetting>,
    windows: BTreeMap<Address, SpendingWindow>,
    delayed: BTreeMap<TransferId, DelayedTransfer>,
    next_transfer_id: TransferId,
    sweep: BTreeMap<Address, Address>,
    journal: Vec<TransferRecord>,
}

impl RestrictedToken {
    /// Creates an empty ledger.
    ///
    /// `default_daily_limit` applies to every account that has not set its
    /// own limit; zero disables the check.
    pub fn new(name: String, symbol: String, decimals: u8, default_daily_limit: u128) -> Self {
        Self {
            name,
            symbol,
            decimals,
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
            total_supply: 0,
            default_daily_limit,
            limits: BTreeMap::new(),
            windows: BTreeMap::new(),
            delayed: BTreeMap::new(),
            next_transfer_id: 0,
            sweep: BTreeMap::new(),
            journal: Vec::new(),
        }
    }

    // -- queries ------------------------------------------------------------

    /// Balance of an account, in base units.
    pub fn balance_of(&self, account: Address) -> u128 {
        self.balances.get(&account).copied().unwrap_or(0)
    }

    /// Total circulating supply, in base units.
    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    /// Remaining allowance from `owner` to `spender`.
    pub fn allowance(&self, owner: Address, spender: Address) -> u128 {
        self.allowances
            .get(&owner)
            .and_then(|per_spender| per_spender.get(&spender))
            .copied()
            .unwrap_or(0)
    }

    /// The daily limit in force for `account` at `now`, after lazily
    /// honoring any pending change whose countdown has elapsed.
    pub fn daily_limit(&self, account: Address, now: DateTime<Utc>, update_countdown: Duration) -> u128 {
        match self.limits.get(&account) {
            None => self.default_daily_limit,
            Some(setting) => match &setting.pending {
                Some(pending) if now >= pending.requested_at + update_countdown => pending.value,
                _ => setting.limit,
            },
        }
    }

    /// Amount spent by `account` in its current window, zero once the
    /// window has rolled over.
    pub fn spent_in_window(&self, account: Address, now: DateTime<Utc>) -> u128 {
        match self.windows.get(&account) {
            Some(window)
                if now < window.window_start + Duration::seconds(TRANSFER_WINDOW_SECS as i64) =>
            {
                window.spent
            }
            _ => 0,
        }
    }

    /// A delayed transfer record, if it exists.
    pub fn delayed_transfer(&self, id: TransferId) -> Option<&DelayedTransfer> {
        self.delayed.get(&id)
    }

    /// The exchange account a sweep key maps to, if any.
    pub fn sweep_mapping(&self, key: Address) -> Option<Address> {
        self.sweep.get(&key).copied()
    }

    /// The append-only transfer journal.
    pub fn journal(&self) -> &[TransferRecord] {
        &self.journal
    }

    // -- transfers ----------------------------------------------------------

    /// Transfers from the sender's own balance.
    pub fn transfer(
        &mut self,
        env: &TokenEnv<'_>,
        from: Address,
        to: Address,
        value: u128,
    ) -> Result<TransferOutcome, TokenError> {
        self.transfer_pipeline(env, from, from, to, value, TransferMethod::Transfer)
    }

    /// Transfers on behalf of `from`, consuming `spender`'s allowance.
    ///
    /// A transfer that parks behind the daily limit does not consume
    /// allowance at initiation; the allowance check happens when the
    /// delayed transfer executes.
    pub fn transfer_from(
        &mut self,
        env: &TokenEnv<'_>,
        spender: Address,
        from: Address,
        to: Address,
        value: u128,
    ) -> Result<TransferOutcome, TokenError> {
        self.transfer_pipeline(env, spender, from, to, value, TransferMethod::TransferFrom)
    }

    fn transfer_pipeline(
        &mut self,
        env: &TokenEnv<'_>,
        spender: Address,
        from: Address,
        to: Address,
        value: u128,
        method: TransferMethod,
    ) -> Result<TransferOutcome, TokenError> {
        let (effective_to, original_to) = self.resolve_recipient(to);
        if effective_to.is_zero() {
            return Err(TokenError::ZeroAddressRecipient);
        }
        if env.paused {
            return Err(TokenError::Paused);
        }
        if !env.whitelist.is_whitelisted(effective_to) {
            return Err(TokenError::NotWhitelisted {
                account: effective_to,
            });
        }

        self.settle_pending_limit(from, env.now, env.daily_limit_update_countdown);
        let limit = self.daily_limit(from, env.now, env.daily_limit_update_countdown);
        if limit > 0 {
            let spent = self.spent_in_window(from, env.now);
            if spent.saturating_add(value) > limit {
                let id = self.park_delayed(from, to, value, method, spender, env.now);
                return Ok(TransferOutcome::Delayed(id));
            }
        }

        if method == TransferMethod::TransferFrom {
            self.consume_allowance(from, spender, value)?;
        }
        self.checked_move(from, effective_to, value)?;
        self.record_spend(from, value, env.now);
        self.journal_transfer(from, effective_to, original_to, value, env.now);
        Ok(TransferOutcome::Completed)
    }

    fn park_delayed(
        &mut self,
        from: Address,
        to: Address,
        value: u128,
        method: TransferMethod,
        initiated_by: Address,
        now: DateTime<Utc>,
    ) -> TransferId {
        let id = self.next_transfer_id;
        self.next_transfer_id += 1;
        self.delayed.insert(
            id,
            DelayedTransfer {
                from,
                to,
                value,
                method,
                initiated_by,
                countdown_start: now,
            },
        );
        info!(transfer = id, %from, %to, value, ?method, "large transfer parked behind countdown");
        id
    }

    /// Executes a delayed transfer once its countdown has elapsed.
    ///
    /// For [`TransferMethod::TransferFrom`] records, the executing caller
    /// must hold (and consumes) allowance from the debited account. Pause
    /// and recipient whitelist are re-checked at execution time; the daily
    /// limit is not, the countdown having already served that purpose.
    pub fn execute_delayed_transfer(
        &mut self,
        env: &TokenEnv<'_>,
        id: TransferId,
        caller: Address,
    ) -> Result<(), TokenError> {
        let record = self
            .delayed
            .get(&id)
            .cloned()
            .ok_or(TokenError::NoSuchTransfer { id })?;

        if env.paused {
            return Err(TokenError::Paused);
        }
        if env.now < record.countdown_start + env.delayed_transfer_countdown {
            return Err(TokenError::CountdownNotElapsed { id });
        }

        let (effective_to, original_to) = self.resolve_recipient(record.to);
        if !env.whitelist.is_whitelisted(effective_to) {
            return Err(TokenError::NotWhitelisted {
                account: effective_to,
            });
        }

        if record.method == TransferMethod::TransferFrom {
            self.consume_allowance(record.from, caller, record.value)?;
        }
        self.checked_move(record.from, effective_to, record.value)?;
        self.journal_transfer(record.from, effective_to, original_to, record.value, env.now);
        self.delayed.remove(&id);
        info!(transfer = id, "delayed transfer executed");
        Ok(())
    }

    /// Cancels a delayed transfer.
    ///
    /// `Transfer` records can be cancelled only by the debited account;
    /// `TransferFrom` records by the debited account or the spender that
    /// initiated them.
    pub fn cancel_delayed_transfer(
        &mut self,
        id: TransferId,
        caller: Address,
    ) -> Result<(), TokenError> {
        let record = self
            .delayed
            .get(&id)
            .ok_or(TokenError::NoSuchTransfer { id })?;

        let allowed = match record.method {
            TransferMethod::Transfer => caller == record.from,
            TransferMethod::TransferFrom => {
                caller == record.from || caller == record.initiated_by
            }
        };
        if !allowed {
            return Err(TokenError::Unauthorized { id, account: caller });
        }
        self.delayed.remove(&id);
        info!(transfer = id, %caller, "delayed transfer cancelled");
        Ok(())
    }

    // -- restriction pre-flight --------------------------------------------

    /// Runs the transfer checks without mutating state.
    ///
    /// Returns [`RESTRICTION_NONE`], [`RESTRICTION_NOT_WHITELISTED`], or
    /// [`RESTRICTION_DAILY_LIMIT`].
    pub fn detect_transfer_restriction(
        &self,
        env: &TokenEnv<'_>,
        from: Address,
        to: Address,
        value: u128,
    ) -> u8 {
        let (effective_to, _) = self.resolve_recipient(to);
        if !env.whitelist.is_whitelisted(effective_to) {
            return RESTRICTION_NOT_WHITELISTED;
        }
        let limit = self.daily_limit(from, env.now, env.daily_limit_update_countdown);
        if limit > 0 && self.spent_in_window(from, env.now).saturating_add(value) > limit {
            return RESTRICTION_DAILY_LIMIT;
        }
        RESTRICTION_NONE
    }

    /// Maps a restriction code to its display string.
    pub fn message_for_transfer_restriction(code: u8) -> Result<&'static str, TokenError> {
        match code {
            RESTRICTION_NONE => Ok("Valid transfer"),
            RESTRICTION_NOT_WHITELISTED => Ok("Invalid transfer: nonwhitelisted recipient"),
            RESTRICTION_DAILY_LIMIT => Ok("Invalid transfer: exceeds daily limit"),
            _ => Err(TokenError::UnknownRestrictionCode { code }),
        }
    }

    // -- allowances and limits ---------------------------------------------

    /// Sets the allowance from the caller to `spender`, replacing any
    /// previous value.
    pub fn approve(&mut self, owner: Address, spender: Address, value: u128) {
        self.allowances.entry(owner).or_default().insert(spender, value);
    }

    /// Requests a new daily limit for the caller's own account. The change
    /// activates lazily once the daily-limit-update countdown elapses.
    pub fn update_daily_limit(&mut self, caller: Address, new_limit: u128, now: DateTime<Utc>) {
        let current = self
            .limits
            .entry(caller)
            .or_insert_with(|| DailyLimitSetting {
                limit: self.default_daily_limit,
                pending: None,
            });
        current.pending = Some(PendingLimit {
            value: new_limit,
            requested_at: now,
        });
        debug!(%caller, new_limit, "daily limit change requested");
    }

    /// Promotes any elapsed pending limit so later reads are O(1). Called
    /// opportunistically; correctness never depends on it because reads
    /// honor elapsed pendings themselves.
    fn settle_pending_limit(&mut self, account: Address, now: DateTime<Utc>, countdown: Duration) {
        if let Some(setting) = self.limits.get_mut(&account) {
            if let Some(pending) = &setting.pending {
                if now >= pending.requested_at + countdown {
                    setting.limit = pending.value;
                    setting.pending = None;
                }
            }
        }
    }

    // -- supply -------------------------------------------------------------

    /// Mints balance to a whitelisted account. Reached through the minting
    /// round in the full system.
    pub fn mint(
        &mut self,
        whitelist: &Whitelist,
        account: Address,
        amount: u128,
        now: DateTime<Utc>,
    ) -> Result<(), TokenError> {
        if !whitelist.is_whitelisted(account) {
            return Err(TokenError::NotWhitelisted { account });
        }
        self.total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(TokenError::AmountOverflow)?;
        let balance = self.balances.entry(account).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(TokenError::AmountOverflow)?;
        self.journal.push(TransferRecord {
            kind: TransferRecordKind::Primary,
            from: Address::ZERO,
            to: account,
            value: amount,
            at: now,
        });
        info!(%account, amount, supply = self.total_supply, "minted");
        Ok(())
    }

    /// Burns balance from an account. Reached through redemption execution
    /// in the full system.
    pub fn burn(
        &mut self,
        account: Address,
        amount: u128,
        now: DateTime<Utc>,
    ) -> Result<(), TokenError> {
        let balance = self.balances.get_mut(&account).ok_or(
            TokenError::InsufficientBalance {
                account,
                balance: 0,
                needed: amount,
            },
        )?;
        if *balance < amount {
            return Err(TokenError::InsufficientBalance {
                account,
                balance: *balance,
                needed: amount,
            });
        }
        *balance -= amount;
        self.total_supply = self
            .total_supply
            .checked_sub(amount)
            .ok_or(TokenError::AmountOverflow)?;
        self.journal.push(TransferRecord {
            kind: TransferRecordKind::Primary,
            from: account,
            to: Address::ZERO,
            value: amount,
            at: now,
        });
        info!(%account, amount, supply = self.total_supply, "burned");
        Ok(())
    }

    /// Moves balance outside the user-transfer pipeline: redemption fees,
    /// escrow captures, and refunds. Balance-checked only; the involved
    /// accounts are whitelisted at bootstrap and governance movements must
    /// not deadlock behind a user's daily limit.
    pub fn move_unrestricted(
        &mut self,
        from: Address,
        to: Address,
        amount: u128,
        now: DateTime<Utc>,
    ) -> Result<(), TokenError> {
        self.checked_move(from, to, amount)?;
        self.journal.push(TransferRecord {
            kind: TransferRecordKind::Primary,
            from,
            to,
            value: amount,
            at: now,
        });
        Ok(())
    }

    // -- sweep addresses ----------------------------------------------------

    /// Maps the sweep key derived from `deposit` to a canonical exchange
    /// account. Transfers to any address in the deposit family are
    /// redirected there.
    pub fn set_sweep_address(
        &mut self,
        deposit: Address,
        exchange: Address,
    ) -> Result<(), TokenError> {
        let key = deposit.sweep_key();
        if key.is_zero() {
            return Err(TokenError::ZeroSweepKey { deposit });
        }
        if exchange.is_zero() {
            return Err(TokenError::ZeroAddressRecipient);
        }
        self.sweep.insert(key, exchange);
        info!(%key, %exchange, "sweep mapping updated");
        Ok(())
    }

    fn resolve_recipient(&self, to: Address) -> (Address, Option<Address>) {
        match self.sweep.get(&to.sweep_key()) {
            Some(&exchange) => (exchange, Some(to)),
            None => (to, None),
        }
    }

    // -- internals ----------------------------------------------------------

    fn checked_move(
        &mut self,
        from: Address,
        to: Address,
        amount: u128,
    ) -> Result<(), TokenError> {
        let balance = self.balance_of(from);
        if balance < amount {
            return Err(TokenError::InsufficientBalance {
                account: from,
                balance,
                needed: amount,
            });
        }
        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(TokenError::AmountOverflow)?;
        self.balances.insert(from, balance - amount);
        self.balances.insert(to, credited);
        Ok(())
    }

    fn consume_allowance(
        &mut self,
        owner: Address,
        spender: Address,
        amount: u128,
    ) -> Result<(), TokenError> {
        let allowance = self.allowance(owner, spender);
        if allowance < amount {
            return Err(TokenError::InsufficientAllowance {
                owner,
                spender,
                allowance,
                needed: amount,
            });
        }
        self.allowances
            .entry(owner)
            .or_default()
            .insert(spender, allowance - amount);
        Ok(())
    }

    fn record_spend(&mut self, account: Address, value: u128, now: DateTime<Utc>) {
        let window_len = Duration::seconds(TRANSFER_WINDOW_SECS as i64);
        match self.windows.get_mut(&account) {
            Some(window) if now < window.window_start + window_len => {
                window.spent = window.spent.saturating_add(value);
            }
            _ => {
                self.windows.insert(
                    account,
                    SpendingWindow {
                        window_start: now,
                        spent: value,
                    },
                );
            }
        }
    }

    fn journal_transfer(
        &mut self,
        from: Address,
        effective_to: Address,
        original_to: Option<Address>,
        value: u128,
        now: DateTime<Utc>,
    ) {
        self.journal.push(TransferRecord {
            kind: TransferRecordKind::Primary,
            from,
            to: effective_to,
            value,
            at: now,
        });
        if let Some(nominal) = original_to {
            self.journal.push(TransferRecord {
                kind: TransferRecordKind::Original,
                from,
                to: nominal,
                value,
                at: now,
            });
        }
    }
}
