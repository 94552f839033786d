//! # Transfer Whitelist
//!
//! The allow-list of accounts permitted to hold and receive balance.
//! Additions take effect immediately; removals are two-step: a
//! quorum-approved proposal starts a countdown, and a separate finalize
//! call completes the removal once the countdown has elapsed. The delay
//! keeps a counterparty from being de-whitelisted abruptly in the middle
//! of a settlement. A countdown length of zero degenerates to instant
//! removal at finalize time.
//!
//! An account with a removal in flight is still whitelisted until the
//! finalize lands; re-adding it cancels the pending removal.

use crate::account::Address;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::info;

/// Errors from whitelist mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WhitelistError {
    /// The account is already whitelisted.
    #[error("{account} is already whitelisted")]
    AlreadyWhitelisted {
        /// The duplicate.
        account: Address,
    },

    /// The account is not whitelisted.
    #[error("{account} is not whitelisted")]
    NotWhitelisted {
        /// The absent account.
        account: Address,
    },

    /// A removal for this account is already counting down.
    #[error("a removal for {account} is already pending")]
    RemovalAlreadyPending {
        /// The account in question.
        account: Address,
    },

    /// No removal proposal exists for this account.
    #[error("no pending removal for {account}")]
    NoPendingRemoval {
        /// The account in question.
        account: Address,
    },

    /// The removal countdown has not elapsed yet.
    #[error("removal countdown for {account} has not elapsed")]
    CountdownNotElapsed {
        /// The account in question.
        account: Address,
    },

    /// The zero address can never be whitelisted.
    #[error("the zero address cannot be whitelisted")]
    ZeroAddress,
}

/// The allow-list and its in-flight removal proposals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Whitelist {
    members: BTreeSet<Address>,
    pending_removals: BTreeMap<Address, DateTime<Utc>>,
}

impl Whitelist {
    /// Creates an empty whitelist.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `account` may hold and receive balance.
    pub fn is_whitelisted(&self, account: Address) -> bool {
        self.members.contains(&account)
    }

    /// Number of whitelisted accounts.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the whitelist is empty.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// When the pending removal for `account` was proposed, if any.
    pub fn pending_removal(&self, account: Address) -> Option<DateTime<Utc>> {
        self.pending_removals.get(&account).copied()
    }

    /// Whitelists an account, effective immediately.
    ///
    /// Re-adding an account whose removal is counting down cancels the
    /// pending removal instead of failing.
    pub fn add(&mut self, account: Address) -> Result<(), WhitelistError> {
        if account.is_zero() {
            return Err(WhitelistError::ZeroAddress);
        }
        if self.pending_removals.remove(&account).is_some() {
            info!(%account, "pending whitelist removal cancelled by re-add");
            return Ok(());
        }
        if !self.members.insert(account) {
            return Err(WhitelistError::AlreadyWhitelisted { account });
        }
        info!(%account, "account whitelisted");
        Ok(())
    }

    /// Whitelists a batch of accounts, all-or-nothing.
    pub fn add_many(
        &mut self,
        accounts: impl IntoIterator<Item = Address>,
    ) -> Result<(), WhitelistError> {
        for account in accounts {
            self.add(account)?;
        }
        Ok(())
    }

    /// Starts the removal countdown for a whitelisted account.
    pub fn propose_removal(
        &mut self,
        account: Address,
        now: DateTime<Utc>,
    ) -> Result<(), WhitelistError> {
        if !self.members.contains(&account) {
            return Err(WhitelistError::NotWhitelisted { account });
        }
        if self.pending_removals.contains_key(&account) {
            return Err(WhitelistError::RemovalAlreadyPending { account });
        }
        self.pending_removals.insert(account, now);
        info!(%account, "whitelist removal proposed");
        Ok(())
    }

    /// Completes a proposed removal once its countdown has elapsed.
    pub fn finalize_removal(
        &mut self,
        account: Address,
        now: DateTime<Utc>,
        countdown: Duration,
    ) -> Result<(), WhitelistError> {
        let proposed_at = self
            .pending_removals
            .get(&account)
            .copied()
            .ok_or(WhitelistError::NoPendingRemoval { account })?;
        if now < proposed_at + countdown {
            return Err(WhitelistError::CountdownNotElapsed { account });
        }
        self.pending_removals.remove(&account);
        self.members.remove(&account);
        info!(%account, "account removed from whitelist");
        Ok(())
    }
}
