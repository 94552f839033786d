//! # Asset Ledger
//!
//! The registry of individual real-world assets and their lifecycle:
//!
//! ```text
//! Pending --[minting countdown elapses, round refreshed]--> Enlisted
//! Enlisted --[redemption requested]--> Locked
//! Enlisted --[set reserved]--> Reserved --[set enlisted]--> Enlisted
//! Locked --[cancel | reject]--> Enlisted
//! Locked --[redemption countdown elapses, executed]--> Redeemed
//! ```
//!
//! `Redeemed` is terminal; the record is kept as history and its
//! identifier is never reused. Identifiers of pending assets dropped from
//! a cancelled or trimmed minting round are retired the same way.
//!
//! This module is a pure state machine. Balance movements that accompany
//! transitions (minting to the receiver wallet, escrow capture, refunds,
//! burns) are orchestrated by the registry, which calls in here for the
//! lifecycle bookkeeping and into the token for the money.

use crate::account::{Address, Fingerprint};
use crate::actions::AssetInput;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::info;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from asset-ledger operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssetError {
    /// No asset is registered under this identifier.
    #[error("no asset {id}")]
    UnknownAsset {
        /// The missing identifier.
        id: u64,
    },

    /// The identifier was already used, now or historically.
    #[error("asset id {id} is already taken")]
    DuplicateAssetId {
        /// The conflicting identifier.
        id: u64,
    },

    /// The asset is not in the status this operation needs.
    #[error("asset {id} is {status:?}, expected {expected}")]
    InvalidStatus {
        /// The asset in question.
        id: u64,
        /// Its current status.
        status: AssetStatus,
        /// The status the operation needs.
        expected: &'static str,
    },

    /// The caller does not own the asset.
    #[error("{account} does not own asset {id}")]
    NotOwner {
        /// The asset in question.
        id: u64,
        /// The rejected caller.
        account: Address,
    },

    /// A minting round is already counting down.
    #[error("a minting round is already active")]
    MintingRoundActive,

    /// No minting round is open.
    #[error("no active minting round")]
    NoMintingRound,

    /// The minting countdown has not elapsed.
    #[error("the minting countdown has not elapsed")]
    MintingCountdownNotElapsed,

    /// The asset's redemption countdown is missing or still running.
    #[error("redemption countdown for asset {id} has not elapsed")]
    CountdownNotElapsed {
        /// The asset in question.
        id: u64,
    },

    /// No redemption lock exists for the asset.
    #[error("no active redemption lock for asset {id}")]
    NoActiveLock {
        /// The asset in question.
        id: u64,
    },

    /// An asset cannot back zero balance units.
    #[error("asset {id} has a zero token value")]
    ZeroTokenValue {
        /// The rejected identifier.
        id: u64,
    },

    /// The zero address cannot own an asset.
    #[error("asset {id} names the zero address as owner")]
    ZeroAddressOwner {
        /// The rejected identifier.
        id: u64,
    },
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Lifecycle status of a registered asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AssetStatus {
    /// Proposed in a minting round; backs no balance yet.
    Pending,
    /// Live collateral. Its token value is part of circulating supply.
    Enlisted,
    /// A redemption is in flight. Still collateralized.
    Locked,
    /// Operational side-state, out of transfer eligibility but still
    /// collateralized.
    Reserved,
    /// Redeemed and burned. Terminal; kept as history.
    Redeemed,
}

/// One registered asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Submitter-assigned identifier, never reused.
    pub id: u64,
    /// Notarization fingerprint of the provenance record.
    pub fingerprint: Fingerprint,
    /// Balance units this asset backs, in base units.
    pub token_value: u128,
    /// The owning account.
    pub owner: Address,
    /// Current lifecycle status.
    pub status: AssetStatus,
    /// When the ledger accepted the asset.
    pub created_at: DateTime<Utc>,
}

/// Escrow bookkeeping for one in-flight redemption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionLock {
    /// The account that requested redemption and receives any refund.
    pub account: Address,
    /// The escrowed amount, equal to the asset's token value.
    pub amount: u128,
}

/// The one outstanding minting round, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintingRound {
    /// Assets proposed in this round, all Pending.
    pub asset_ids: Vec<u64>,
    /// When the round's countdown started.
    pub countdown_start: DateTime<Utc>,
}

/// The asset registry and its redemption/minting bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetLedger {
    assets: BTreeMap<u64, Asset>,
    retired_ids: BTreeSet<u64>,
    minting_round: Option<MintingRound>,
    locks: BTreeMap<u64, RedemptionLock>,
    redemption_countdowns: BTreeMap<u64, DateTime<Utc>>,
    redemption_fee: u128,
    fee_receiver: Address,
    minting_receiver: Address,
}

impl AssetLedger {
    /// Creates an empty ledger with the given fee configuration.
    pub fn new(redemption_fee: u128, fee_receiver: Address, minting_receiver: Address) -> Self {
        Self {
            assets: BTreeMap::new(),
            retired_ids: BTreeSet::new(),
            minting_round: None,
            locks: BTreeMap::new(),
            redemption_countdowns: BTreeMap::new(),
            redemption_fee,
            fee_receiver,
            minting_receiver,
        }
    }

    // -- queries ------------------------------------------------------------

    /// The asset registered under `id`, if any.
    pub fn asset(&self, id: u64) -> Option<&Asset> {
        self.assets.get(&id)
    }

    /// Number of assets currently Pending.
    pub fn pending_count(&self) -> usize {
        self.assets
            .values()
            .filter(|a| a.status == AssetStatus::Pending)
            .count()
    }

    /// Number of assets in `status`.
    pub fn count(&self, status: AssetStatus) -> usize {
        self.assets
            .values()
            .filter(|a| a.status == status)
            .count()
    }

    /// Sum of token values over assets in `status`.
    pub fn total_tokens(&self, status: AssetStatus) -> u128 {
        self.assets
            .values()
            .filter(|a| a.status == status)
            .map(|a| a.token_value)
            .sum()
    }

    /// Sum of token values over collateralizing assets (Enlisted, Locked,
    /// Reserved). Equals circulating supply at every operation boundary.
    pub fn collateralized_tokens(&self) -> u128 {
        self.total_tokens(AssetStatus::Enlisted)
            + self.total_tokens(AssetStatus::Locked)
            + self.total_tokens(AssetStatus::Reserved)
    }

    /// The redemption lock for `asset_id`, if one is active.
    pub fn redemption_lock(&self, asset_id: u64) -> Option<&RedemptionLock> {
        self.locks.get(&asset_id)
    }

    /// When the redemption countdown for `asset_id` started, if stamped.
    pub fn redemption_countdown(&self, asset_id: u64) -> Option<DateTime<Utc>> {
        self.redemption_countdowns.get(&asset_id).copied()
    }

    /// The outstanding minting round, if any.
    pub fn minting_round(&self) -> Option<&MintingRound> {
        self.minting_round.as_ref()
    }

    /// The current redemption fee, in base units.
    pub fn redemption_fee(&self) -> u128 {
        self.redemption_fee
    }

    /// The account credited with redemption fees.
    pub fn fee_receiver(&self) -> Address {
        self.fee_receiver
    }

    /// The account newly minted balance is credited to.
    pub fn minting_receiver(&self) -> Address {
        self.minting_receiver
    }

    // -- fee configuration (quorum-applied) ---------------------------------

    /// Replaces the redemption fee.
    pub fn set_redemption_fee(&mut self, fee: u128) {
        self.redemption_fee = fee;
    }

    /// Replaces the fee receiver wallet.
    pub fn set_fee_receiver(&mut self, account: Address) {
        self.fee_receiver = account;
    }

    /// Replaces the minting receiver wallet.
    pub fn set_minting_receiver(&mut self, account: Address) {
        self.minting_receiver = account;
    }

    // -- minting round ------------------------------------------------------

    /// Opens a minting round over `inputs` and starts its countdown.
    ///
    /// Fails while another round is outstanding; concurrent proposals are
    /// rejected, not queued. Every id must be fresh, including ids retired
    /// by earlier rounds.
    pub fn open_minting_round(
        &mut self,
        inputs: &[AssetInput],
        now: DateTime<Utc>,
    ) -> Result<(), AssetError> {
        if self.minting_round.is_some() {
            return Err(AssetError::MintingRoundActive);
        }
        let mut seen = BTreeSet::new();
        for input in inputs {
            if self.assets.contains_key(&input.id)
                || self.retired_ids.contains(&input.id)
                || !seen.insert(input.id)
            {
                return Err(AssetError::DuplicateAssetId { id: input.id });
            }
            if input.token_value == 0 {
                return Err(AssetError::ZeroTokenValue { id: input.id });
            }
            if input.owner.is_zero() {
                return Err(AssetError::ZeroAddressOwner { id: input.id });
            }
        }

        let mut asset_ids = Vec::with_capacity(inputs.len());
        for input in inputs {
            self.assets.insert(
                input.id,
                Asset {
                    id: input.id,
                    fingerprint: input.fingerprint,
                    token_value: input.token_value,
                    owner: input.owner,
                    status: AssetStatus::Pending,
                    created_at: now,
                },
            );
            asset_ids.push(input.id);
        }
        info!(assets = asset_ids.len(), "minting round opened");
        self.minting_round = Some(MintingRound {
            asset_ids,
            countdown_start: now,
        });
        Ok(())
    }

    /// Drops one pending asset from the open round. A round emptied this
    /// way is cleared.
    pub fn remove_pending_asset(&mut self, id: u64) -> Result<(), AssetError> {
        let round = self.minting_round.as_mut().ok_or(AssetError::NoMintingRound)?;
        let position = round
            .asset_ids
            .iter()
            .position(|&aid| aid == id)
            .ok_or(AssetError::UnknownAsset { id })?;

        round.asset_ids.remove(position);
        if round.asset_ids.is_empty() {
            self.minting_round = None;
        }
        self.assets.remove(&id);
        self.retired_ids.insert(id);
        info!(asset = id, "pending asset removed from round");
        Ok(())
    }

    /// Discards the open round and every asset it proposed.
    pub fn cancel_minting_round(&mut self) -> Result<(), AssetError> {
        let round = self.minting_round.take().ok_or(AssetError::NoMintingRound)?;
        for id in &round.asset_ids {
            self.assets.remove(id);
            self.retired_ids.insert(*id);
        }
        info!(assets = round.asset_ids.len(), "minting round cancelled");
        Ok(())
    }

    /// Enlists the round's assets once its countdown has elapsed.
    ///
    /// Returns the `(id, token_value)` pairs the registry must mint to the
    /// minting receiver; the round is cleared.
    pub fn finalize_minting_round(
        &mut self,
        now: DateTime<Utc>,
        countdown: Duration,
    ) -> Result<Vec<(u64, u128)>, AssetError> {
        let round = self.minting_round.as_ref().ok_or(AssetError::NoMintingRound)?;
        if now < round.countdown_start + countdown {
            return Err(AssetError::MintingCountdownNotElapsed);
        }
        let round = self.minting_round.take().expect("checked above");

        let mut minted = Vec::with_capacity(round.asset_ids.len());
        for id in round.asset_ids {
            let asset = self.assets.get_mut(&id).ok_or(AssetError::UnknownAsset { id })?;
            asset.status = AssetStatus::Enlisted;
            minted.push((id, asset.token_value));
        }
        info!(assets = minted.len(), "minting round finalized");
        Ok(minted)
    }

    // -- redemption ---------------------------------------------------------

    /// Locks an enlisted asset for redemption by its owner.
    ///
    /// Returns the asset's token value, which the registry escrows. The
    /// balance debits (cost check included) happen in the registry; this
    /// records the lifecycle side.
    pub fn lock_for_redemption(
        &mut self,
        asset_id: u64,
        caller: Address,
    ) -> Result<u128, AssetError> {
        let asset = self
            .assets
            .get_mut(&asset_id)
            .ok_or(AssetError::UnknownAsset { id: asset_id })?;
        if asset.status != AssetStatus::Enlisted {
            return Err(AssetError::InvalidStatus {
                id: asset_id,
                status: asset.status,
                expected: "Enlisted",
            });
        }
        if asset.owner != caller {
            return Err(AssetError::NotOwner {
                id: asset_id,
                account: caller,
            });
        }
        asset.status = AssetStatus::Locked;
        self.locks.insert(
            asset_id,
            RedemptionLock {
                account: caller,
                amount: asset.token_value,
            },
        );
        info!(asset = asset_id, %caller, "asset locked for redemption");
        Ok(asset.token_value)
    }

    /// Stamps the redemption countdown for a locked asset. Applied from
    /// the quorum-approved start-countdown action.
    pub fn start_redemption_countdown(
        &mut self,
        asset_id: u64,
        now: DateTime<Utc>,
    ) -> Result<(), AssetError> {
        let asset = self
            .assets
            .get(&asset_id)
            .ok_or(AssetError::UnknownAsset { id: asset_id })?;
        if asset.status != AssetStatus::Locked {
            return Err(AssetError::InvalidStatus {
                id: asset_id,
                status: asset.status,
                expected: "Locked",
            });
        }
        if !self.locks.contains_key(&asset_id) {
            return Err(AssetError::NoActiveLock { id: asset_id });
        }
        self.redemption_countdowns.insert(asset_id, now);
        info!(asset = asset_id, "redemption countdown started");
        Ok(())
    }

    /// Releases the lock on a locked asset and returns it to Enlisted.
    ///
    /// Shared by owner-initiated cancellation and admin-initiated
    /// rejection; the registry refunds the returned lock.
    pub fn release_lock(&mut self, asset_id: u64) -> Result<RedemptionLock, AssetError> {
        let asset = self
            .assets
            .get_mut(&asset_id)
            .ok_or(AssetError::UnknownAsset { id: asset_id })?;
        if asset.status != AssetStatus::Locked {
            return Err(AssetError::InvalidStatus {
                id: asset_id,
                status: asset.status,
                expected: "Locked",
            });
        }
        let lock = self
            .locks
            .remove(&asset_id)
            .ok_or(AssetError::NoActiveLock { id: asset_id })?;
        self.redemption_countdowns.remove(&asset_id);
        asset.status = AssetStatus::Enlisted;
        info!(asset = asset_id, "redemption lock released");
        Ok(lock)
    }

    /// Completes a redemption once its countdown has elapsed.
    ///
    /// Returns the lock whose escrowed amount the registry burns. The
    /// asset becomes Redeemed and stays in the registry as history.
    pub fn execute_redemption(
        &mut self,
        asset_id: u64,
        now: DateTime<Utc>,
        countdown: Duration,
    ) -> Result<RedemptionLock, AssetError> {
        let asset = self
            .assets
            .get_mut(&asset_id)
            .ok_or(AssetError::UnknownAsset { id: asset_id })?;
        if asset.status != AssetStatus::Locked {
            return Err(AssetError::InvalidStatus {
                id: asset_id,
                status: asset.status,
                expected: "Locked",
            });
        }
        match self.locks.get(&asset_id) {
            Some(lock) if lock.amount > 0 => {}
            _ => return Err(AssetError::NoActiveLock { id: asset_id }),
        }
        let started = self
            .redemption_countdowns
            .get(&asset_id)
            .copied()
            .ok_or(AssetError::CountdownNotElapsed { id: asset_id })?;
        if now < started + countdown {
            return Err(AssetError::CountdownNotElapsed { id: asset_id });
        }

        let lock = self.locks.remove(&asset_id).expect("checked above");
        self.redemption_countdowns.remove(&asset_id);
        asset.status = AssetStatus::Redeemed;
        info!(asset = asset_id, amount = lock.amount, "redemption executed");
        Ok(lock)
    }

    // -- reserved side-state ------------------------------------------------

    /// Moves an enlisted asset to Reserved.
    pub fn set_reserved(&mut self, id: u64) -> Result<(), AssetError> {
        self.flip_status(id, AssetStatus::Enlisted, AssetStatus::Reserved, "Enlisted")
    }

    /// Returns a reserved asset to Enlisted.
    pub fn set_enlisted(&mut self, id: u64) -> Result<(), AssetError> {
        self.flip_status(id, AssetStatus::Reserved, AssetStatus::Enlisted, "Reserved")
    }

    fn flip_status(
        &mut self,
        id: u64,
        from: AssetStatus,
        to: AssetStatus,
        expected: &'static str,
    ) -> Result<(), AssetError> {
        let asset = self.assets.get_mut(&id).ok_or(AssetError::UnknownAsset { id })?;
        if asset.status != from {
            return Err(AssetError::InvalidStatus {
                id,
                status: asset.status,
                expected,
            });
        }
        asset.status = to;
        info!(asset = id, ?to, "asset status changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address([n; 20])
    }

    fn input(id: u64, value: u128, owner: Address) -> AssetInput {
        AssetInput {
            id,
            fingerprint: Fingerprint([0xab; 32]),
            token_value: value,
            owner,
        }
    }

    fn ledger() -> AssetLedger {
        AssetLedger::new(10, addr(90), addr(91))
    }

    /// Opens and immediately finalizes a round, enlisting the assets.
    fn enlist(ledger: &mut AssetLedger, inputs: &[AssetInput], now: DateTime<Utc>) {
        ledger.open_minting_round(inputs, now).unwrap();
        ledger
            .finalize_minting_round(now + Duration::hours(49), Duration::hours(48))
            .unwrap();
    }

    #[test]
    fn open_round_records_pending_assets() {
        let mut l = ledger();
        let now = Utc::now();
        l.open_minting_round(&[input(1, 100, addr(1)), input(2, 50, addr(2))], now)
            .unwrap();
        assert_eq!(l.pending_count(), 2);
        assert_eq!(l.asset(1).unwrap().status, AssetStatus::Pending);
        assert_eq!(l.total_tokens(AssetStatus::Pending), 150);
    }

    #[test]
    fn second_round_rejected_while_active() {
        let mut l = ledger();
        let now = Utc::now();
        l.open_minting_round(&[input(1, 100, addr(1))], now).unwrap();
        let err = l
            .open_minting_round(&[input(2, 50, addr(2))], now)
            .unwrap_err();
        assert_eq!(err, AssetError::MintingRoundActive);
    }

    #[test]
    fn duplicate_ids_rejected_even_after_retirement() {
        let mut l = ledger();
        let now = Utc::now();
        l.open_minting_round(&[input(1, 100, addr(1))], now).unwrap();
        l.cancel_minting_round().unwrap();

        let err = l.open_minting_round(&[input(1, 100, addr(1))], now).unwrap_err();
        assert_eq!(err, AssetError::DuplicateAssetId { id: 1 });
    }

    #[test]
    fn finalize_waits_for_countdown() {
        let mut l = ledger();
        let now = Utc::now();
        l.open_minting_round(&[input(1, 100, addr(1))], now).unwrap();

        let err = l
            .finalize_minting_round(now + Duration::hours(47), Duration::hours(48))
            .unwrap_err();
        assert_eq!(err, AssetError::MintingCountdownNotElapsed);

        let minted = l
            .finalize_minting_round(now + Duration::hours(48), Duration::hours(48))
            .unwrap();
        assert_eq!(minted, vec![(1, 100)]);
        assert_eq!(l.asset(1).unwrap().status, AssetStatus::Enlisted);
        assert!(l.minting_round().is_none());
    }

    #[test]
    fn remove_pending_asset_trims_round() {
        let mut l = ledger();
        let now = Utc::now();
        l.open_minting_round(&[input(1, 100, addr(1)), input(2, 50, addr(2))], now)
            .unwrap();
        l.remove_pending_asset(1).unwrap();
        assert!(l.asset(1).is_none());
        assert_eq!(l.pending_count(), 1);

        // Removing the last one clears the round entirely.
        l.remove_pending_asset(2).unwrap();
        assert!(l.minting_round().is_none());
    }

    #[test]
    fn cancel_round_discards_assets() {
        let mut l = ledger();
        let now = Utc::now();
        l.open_minting_round(&[input(1, 100, addr(1))], now).unwrap();
        l.cancel_minting_round().unwrap();
        assert!(l.asset(1).is_none());
        assert_eq!(l.pending_count(), 0);
        assert_eq!(l.cancel_minting_round().unwrap_err(), AssetError::NoMintingRound);
    }

    #[test]
    fn lock_requires_owner_and_enlisted() {
        let mut l = ledger();
        let now = Utc::now();
        enlist(&mut l, &[input(1, 100, addr(1))], now);

        let err = l.lock_for_redemption(1, addr(2)).unwrap_err();
        assert_eq!(err, AssetError::NotOwner { id: 1, account: addr(2) });

        let value = l.lock_for_redemption(1, addr(1)).unwrap();
        assert_eq!(value, 100);
        assert_eq!(l.asset(1).unwrap().status, AssetStatus::Locked);
        assert_eq!(l.redemption_lock(1).unwrap().amount, 100);

        // A second request finds the asset Locked.
        let err = l.lock_for_redemption(1, addr(1)).unwrap_err();
        assert!(matches!(err, AssetError::InvalidStatus { .. }));
    }

    #[test]
    fn release_lock_restores_enlisted() {
        let mut l = ledger();
        let now = Utc::now();
        enlist(&mut l, &[input(1, 100, addr(1))], now);
        l.lock_for_redemption(1, addr(1)).unwrap();

        let lock = l.release_lock(1).unwrap();
        assert_eq!(lock.account, addr(1));
        assert_eq!(lock.amount, 100);
        assert_eq!(l.asset(1).unwrap().status, AssetStatus::Enlisted);
        assert!(l.redemption_lock(1).is_none());
    }

    #[test]
    fn execute_requires_started_and_elapsed_countdown() {
        let mut l = ledger();
        let now = Utc::now();
        enlist(&mut l, &[input(1, 100, addr(1))], now);
        l.lock_for_redemption(1, addr(1)).unwrap();

        // No countdown stamped yet.
        let err = l
            .execute_redemption(1, now + Duration::hours(100), Duration::hours(48))
            .unwrap_err();
        assert_eq!(err, AssetError::CountdownNotElapsed { id: 1 });

        l.start_redemption_countdown(1, now).unwrap();
        let err = l
            .execute_redemption(1, now + Duration::hours(47), Duration::hours(48))
            .unwrap_err();
        assert_eq!(err, AssetError::CountdownNotElapsed { id: 1 });

        let lock = l
            .execute_redemption(1, now + Duration::hours(48), Duration::hours(48))
            .unwrap();
        assert_eq!(lock.amount, 100);
        assert_eq!(l.asset(1).unwrap().status, AssetStatus::Redeemed);
        assert!(l.redemption_lock(1).is_none());
    }

    #[test]
    fn redeemed_asset_stays_as_history() {
        let mut l = ledger();
        let now = Utc::now();
        enlist(&mut l, &[input(1, 100, addr(1))], now);
        l.lock_for_redemption(1, addr(1)).unwrap();
        l.start_redemption_countdown(1, now).unwrap();
        l.execute_redemption(1, now + Duration::hours(48), Duration::hours(48))
            .unwrap();

        assert_eq!(l.asset(1).unwrap().status, AssetStatus::Redeemed);
        assert_eq!(l.total_tokens(AssetStatus::Redeemed), 100);
        assert_eq!(l.collateralized_tokens(), 0);

        // Its id can never come back.
        let err = l
            .open_minting_round(&[input(1, 100, addr(1))], now)
            .unwrap_err();
        assert_eq!(err, AssetError::DuplicateAssetId { id: 1 });
    }

    #[test]
    fn reserved_roundtrip() {
        let mut l = ledger();
        let now = Utc::now();
        enlist(&mut l, &[input(1, 100, addr(1))], now);

        l.set_reserved(1).unwrap();
        assert_eq!(l.asset(1).unwrap().status, AssetStatus::Reserved);
        // Reserved assets stay collateralized.
        assert_eq!(l.collateralized_tokens(), 100);

        // A reserved asset cannot be locked for redemption.
        assert!(matches!(
            l.lock_for_redemption(1, addr(1)).unwrap_err(),
            AssetError::InvalidStatus { .. }
        ));

        l.set_enlisted(1).unwrap();
        assert_eq!(l.asset(1).unwrap().status, AssetStatus::Enlisted);

        // And the flips only work from their respective states.
        assert!(matches!(
            l.set_enlisted(1).unwrap_err(),
            AssetError::InvalidStatus { .. }
        ));
    }

    #[test]
    fn zero_value_and_zero_owner_rejected() {
        let mut l = ledger();
        let now = Utc::now();
        assert_eq!(
            l.open_minting_round(&[input(1, 0, addr(1))], now).unwrap_err(),
            AssetError::ZeroTokenValue { id: 1 }
        );
        assert_eq!(
            l.open_minting_round(&[input(1, 5, Address::ZERO)], now)
                .unwrap_err(),
            AssetError::ZeroAddressOwner { id: 1 }
        );
    }
}
