//! Integration tests for the asset lifecycle: minting rounds, the
//! redemption workflow end to end, the reserved side-state, and the
//! collateralization invariant at every operation boundary.

use chrono::Duration;
use landmark_ledger::account::{Address, Fingerprint};
use landmark_ledger::actions::{Action, AssetInput, Role};
use landmark_ledger::assets::{AssetError, AssetStatus};
use landmark_ledger::clock::ManualClock;
use landmark_ledger::multisig::MultisigError;
use landmark_ledger::registry::{
    AssetConfig, BootstrapConfig, CountdownConfig, Registry, RegistryError, RoleConfig,
    TokenConfig,
};
use std::sync::Arc;

fn addr(n: u8) -> Address {
    Address([n; 20])
}

fn asset(id: u64, token_value: u128, owner: Address) -> AssetInput {
    AssetInput {
        id,
        fingerprint: Fingerprint([id as u8; 32]),
        token_value,
        owner,
    }
}

/// Standard deployment: one signer per role, redemption fee 10, end users
/// {10, 11} whitelisted, no daily limit.
fn bootstrap() -> BootstrapConfig {
    BootstrapConfig {
        super_owners: vec![addr(1), addr(2)],
        super_owner_threshold_percent: 50,
        basic_owners: RoleConfig {
            signers: vec![addr(3)],
            required: 1,
        },
        operation_admins: RoleConfig {
            signers: vec![addr(4)],
            required: 1,
        },
        minting_admins: RoleConfig {
            signers: vec![addr(5)],
            required: 1,
        },
        redemption_admins: RoleConfig {
            signers: vec![addr(6)],
            required: 1,
        },
        token: TokenConfig {
            decimals: 2,
            ..TokenConfig::default()
        },
        assets: AssetConfig {
            redemption_fee: 10,
            fee_receiver: addr(90),
            minting_receiver: addr(91),
            escrow_account: addr(92),
        },
        countdowns: CountdownConfig::default(),
        initial_whitelist: vec![addr(10), addr(11)],
    }
}

fn registry() -> (Registry, ManualClock) {
    let clock = ManualClock::starting_now();
    let registry = Registry::new(bootstrap(), Arc::new(clock.clone())).unwrap();
    (registry, clock)
}

/// Runs a full minting round over `inputs`: proposal, countdown, refresh.
/// Backing balance lands on the minting receiver, addr(91).
fn enlist(reg: &mut Registry, clock: &ManualClock, inputs: Vec<AssetInput>) {
    reg.submit_action(Action::AddPendingAssets { assets: inputs }, addr(5))
        .unwrap();
    clock.advance(Duration::hours(48) + Duration::seconds(1));
    reg.refresh_minting_round(addr(5)).unwrap();
}

/// Enlists the asset under test plus a 900-unit treasury asset, so the
/// minting receiver holds enough balance to fund redemption fees.
fn enlist_with_treasury(reg: &mut Registry, clock: &ManualClock, input: AssetInput) {
    enlist(reg, clock, vec![input, asset(999, 900, addr(11))]);
}

// ---------------------------------------------------------------------------
// Minting Rounds
// ---------------------------------------------------------------------------

#[test]
fn minting_round_mints_only_after_countdown() {
    let (mut reg, clock) = registry();

    reg.submit_action(
        Action::AddPendingAssets {
            assets: vec![asset(1, 100, addr(10)), asset(2, 250, addr(11))],
        },
        addr(5),
    )
    .unwrap();

    // Proposed assets back nothing yet.
    assert_eq!(reg.pending_asset_count(), 2);
    assert_eq!(reg.total_supply(), 0);
    assert_eq!(reg.asset(1).unwrap().status, AssetStatus::Pending);
    assert!(reg.is_fully_collateralized());

    let err = reg.refresh_minting_round(addr(5)).unwrap_err();
    assert_eq!(
        err,
        RegistryError::Asset(AssetError::MintingCountdownNotElapsed)
    );

    clock.advance(Duration::hours(48) + Duration::seconds(1));
    reg.refresh_minting_round(addr(5)).unwrap();

    assert_eq!(reg.total_supply(), 350);
    assert_eq!(reg.balance_of(addr(91)), 350);
    assert_eq!(reg.asset(1).unwrap().status, AssetStatus::Enlisted);
    assert_eq!(reg.asset(2).unwrap().status, AssetStatus::Enlisted);
    assert_eq!(reg.pending_asset_count(), 0);
    assert!(reg.is_fully_collateralized());
}

#[test]
fn refresh_requires_minting_admin_signer() {
    let (mut reg, clock) = registry();
    reg.submit_action(
        Action::AddPendingAssets {
            assets: vec![asset(1, 100, addr(10))],
        },
        addr(5),
    )
    .unwrap();
    clock.advance(Duration::hours(49));

    let err = reg.refresh_minting_round(addr(3)).unwrap_err();
    assert!(matches!(
        err,
        RegistryError::Multisig(MultisigError::NotSigner { .. })
    ));
}

#[test]
fn second_round_during_countdown_is_rejected_without_trace() {
    let (mut reg, _) = registry();
    reg.submit_action(
        Action::AddPendingAssets {
            assets: vec![asset(1, 100, addr(10))],
        },
        addr(5),
    )
    .unwrap();

    let err = reg
        .submit_action(
            Action::AddPendingAssets {
                assets: vec![asset(2, 50, addr(11))],
            },
            addr(5),
        )
        .unwrap_err();
    assert_eq!(err, RegistryError::Asset(AssetError::MintingRoundActive));

    // The rejected proposal left nothing behind: no asset record, no
    // half-submitted action.
    assert!(reg.asset(2).is_none());
    assert_eq!(reg.pending_asset_count(), 1);
    assert_eq!(reg.authorizer(Role::MintingAdmin).pending_count(), 0);
}

#[test]
fn basic_owner_cancels_a_round_and_ids_stay_retired() {
    let (mut reg, clock) = registry();
    reg.submit_action(
        Action::AddPendingAssets {
            assets: vec![asset(1, 100, addr(10))],
        },
        addr(5),
    )
    .unwrap();

    // Cancellation is a BasicOwner action; MintingAdmin cannot initiate it.
    let err = reg
        .submit_action(Action::CancelMintingRound, addr(5))
        .unwrap_err();
    assert!(matches!(
        err,
        RegistryError::Multisig(MultisigError::NotSigner { .. })
    ));

    reg.submit_action(Action::CancelMintingRound, addr(3)).unwrap();
    assert!(reg.asset(1).is_none());
    assert_eq!(reg.pending_asset_count(), 0);

    // The discarded id is burned for good.
    let err = reg
        .submit_action(
            Action::AddPendingAssets {
                assets: vec![asset(1, 100, addr(10))],
            },
            addr(5),
        )
        .unwrap_err();
    assert_eq!(
        err,
        RegistryError::Asset(AssetError::DuplicateAssetId { id: 1 })
    );

    // A cancelled round also unblocks the next proposal.
    reg.submit_action(
        Action::AddPendingAssets {
            assets: vec![asset(3, 75, addr(10))],
        },
        addr(5),
    )
    .unwrap();
    clock.advance(Duration::hours(49));
    reg.refresh_minting_round(addr(5)).unwrap();
    assert_eq!(reg.total_supply(), 75);
}

#[test]
fn trimming_a_round_drops_only_the_named_asset() {
    let (mut reg, clock) = registry();
    reg.submit_action(
        Action::AddPendingAssets {
            assets: vec![asset(1, 100, addr(10)), asset(2, 250, addr(11))],
        },
        addr(5),
    )
    .unwrap();

    reg.submit_action(Action::RemovePendingAsset { id: 1 }, addr(5))
        .unwrap();
    assert!(reg.asset(1).is_none());
    assert_eq!(reg.pending_asset_count(), 1);

    clock.advance(Duration::hours(49));
    reg.refresh_minting_round(addr(5)).unwrap();
    assert_eq!(reg.total_supply(), 250);
    assert_eq!(reg.asset(2).unwrap().status, AssetStatus::Enlisted);
}

// ---------------------------------------------------------------------------
// Redemption Workflow
// ---------------------------------------------------------------------------

#[test]
fn redemption_lifecycle_burns_exactly_the_backing_balance() {
    let (mut reg, clock) = registry();
    enlist(
        &mut reg,
        &clock,
        vec![asset(1, 100, addr(10)), asset(2, 200, addr(11))],
    );

    // Fund the owner: 200 units against a 110-unit redemption cost.
    reg.transfer(addr(91), addr(10), 200).unwrap();
    assert_eq!(reg.balance_of(addr(10)), 200);
    assert_eq!(reg.total_supply(), 300);

    let action_id = reg.request_redemption(1, addr(10)).unwrap();

    // Fee to the fee receiver, token value into escrow, owner down to 90.
    assert_eq!(reg.balance_of(addr(10)), 90);
    assert_eq!(reg.balance_of(addr(90)), 10);
    assert_eq!(reg.balance_of(addr(92)), 100);
    assert_eq!(reg.asset(1).unwrap().status, AssetStatus::Locked);
    assert!(reg.is_fully_collateralized());

    // The countdown starts at quorum, not at request.
    reg.approve(Role::RedemptionAdmin, action_id, addr(6)).unwrap();

    let err = reg.execute_redemption(1, addr(6)).unwrap_err();
    assert_eq!(
        err,
        RegistryError::Asset(AssetError::CountdownNotElapsed { id: 1 })
    );

    clock.advance(Duration::hours(48) + Duration::seconds(1));
    reg.execute_redemption(1, addr(6)).unwrap();

    // Escrow burned, supply down by the asset's value, record retained.
    assert_eq!(reg.total_supply(), 200);
    assert_eq!(reg.balance_of(addr(92)), 0);
    assert_eq!(reg.asset(1).unwrap().status, AssetStatus::Redeemed);
    assert!(reg.is_fully_collateralized());
}

#[test]
fn redemption_without_quorum_never_becomes_executable() {
    let (mut reg, clock) = registry();
    enlist_with_treasury(&mut reg, &clock, asset(1, 100, addr(10)));
    reg.transfer(addr(91), addr(10), 150).unwrap();
    reg.request_redemption(1, addr(10)).unwrap();

    // Nobody approved the start-countdown action; time alone is not enough.
    clock.advance(Duration::days(30));
    let err = reg.execute_redemption(1, addr(6)).unwrap_err();
    assert_eq!(
        err,
        RegistryError::Asset(AssetError::CountdownNotElapsed { id: 1 })
    );
}

#[test]
fn cancel_roundtrip_refunds_exactly_the_locked_amount() {
    let (mut reg, clock) = registry();
    enlist_with_treasury(&mut reg, &clock, asset(1, 100, addr(10)));
    reg.transfer(addr(91), addr(10), 150).unwrap();

    let supply_before = reg.total_supply();
    reg.request_redemption(1, addr(10)).unwrap();
    assert_eq!(reg.balance_of(addr(10)), 40);

    reg.cancel_redemption(1, addr(10)).unwrap();

    // The escrowed 100 comes back; the 10-unit fee does not.
    assert_eq!(reg.balance_of(addr(10)), 140);
    assert_eq!(reg.balance_of(addr(92)), 0);
    assert_eq!(reg.asset(1).unwrap().status, AssetStatus::Enlisted);
    assert_eq!(reg.total_supply(), supply_before);
    assert!(reg.is_fully_collateralized());

    // The asset can go around again.
    reg.request_redemption(1, addr(10)).unwrap();
    assert_eq!(reg.asset(1).unwrap().status, AssetStatus::Locked);
}

#[test]
fn only_the_lock_holder_may_cancel() {
    let (mut reg, clock) = registry();
    enlist_with_treasury(&mut reg, &clock, asset(1, 100, addr(10)));
    reg.transfer(addr(91), addr(10), 150).unwrap();
    reg.request_redemption(1, addr(10)).unwrap();

    let err = reg.cancel_redemption(1, addr(11)).unwrap_err();
    assert_eq!(
        err,
        RegistryError::NotLockHolder {
            asset_id: 1,
            account: addr(11),
        }
    );
    assert_eq!(reg.asset(1).unwrap().status, AssetStatus::Locked);

    // Without a lock there is nothing to cancel.
    let err = reg.cancel_redemption(2, addr(10)).unwrap_err();
    assert_eq!(err, RegistryError::Asset(AssetError::NoActiveLock { id: 2 }));
}

#[test]
fn reject_is_admin_only_with_cancel_semantics() {
    let (mut reg, clock) = registry();
    enlist_with_treasury(&mut reg, &clock, asset(1, 100, addr(10)));
    reg.transfer(addr(91), addr(10), 150).unwrap();
    reg.request_redemption(1, addr(10)).unwrap();

    let err = reg.reject_redemption(1, addr(10)).unwrap_err();
    assert!(matches!(
        err,
        RegistryError::Multisig(MultisigError::NotSigner { .. })
    ));

    reg.reject_redemption(1, addr(6)).unwrap();
    assert_eq!(reg.balance_of(addr(10)), 140);
    assert_eq!(reg.asset(1).unwrap().status, AssetStatus::Enlisted);
    assert!(reg.is_fully_collateralized());
}

#[test]
fn request_validates_owner_status_and_balance_atomically() {
    let (mut reg, clock) = registry();
    enlist_with_treasury(&mut reg, &clock, asset(1, 100, addr(10)));

    // Not the owner.
    let err = reg.request_redemption(1, addr(11)).unwrap_err();
    assert_eq!(
        err,
        RegistryError::Asset(AssetError::NotOwner {
            id: 1,
            account: addr(11),
        })
    );

    // Owner with too little balance: the whole request rolls back, lock
    // included.
    reg.transfer(addr(91), addr(10), 50).unwrap();
    let err = reg.request_redemption(1, addr(10)).unwrap_err();
    assert_eq!(
        err,
        RegistryError::InsufficientBalance {
            account: addr(10),
            balance: 50,
            needed: 110,
        }
    );
    assert_eq!(reg.asset(1).unwrap().status, AssetStatus::Enlisted);
    assert!(reg.assets().redemption_lock(1).is_none());
    assert_eq!(reg.balance_of(addr(10)), 50);
    assert_eq!(reg.balance_of(addr(90)), 0);
    assert_eq!(reg.authorizer(Role::RedemptionAdmin).pending_count(), 0);
}

// ---------------------------------------------------------------------------
// Reserved Side-State
// ---------------------------------------------------------------------------

#[test]
fn reserved_assets_stay_collateralized_but_cannot_redeem() {
    let (mut reg, clock) = registry();
    enlist_with_treasury(&mut reg, &clock, asset(1, 100, addr(10)));
    reg.transfer(addr(91), addr(10), 150).unwrap();

    reg.submit_action(Action::SetAssetReserved { id: 1 }, addr(3))
        .unwrap();
    assert_eq!(reg.asset(1).unwrap().status, AssetStatus::Reserved);
    assert_eq!(reg.total_tokens(AssetStatus::Reserved), 100);
    assert!(reg.is_fully_collateralized());

    let err = reg.request_redemption(1, addr(10)).unwrap_err();
    assert!(matches!(
        err,
        RegistryError::Asset(AssetError::InvalidStatus { .. })
    ));

    reg.submit_action(Action::SetAssetEnlisted { id: 1 }, addr(3))
        .unwrap();
    assert_eq!(reg.asset(1).unwrap().status, AssetStatus::Enlisted);
    reg.request_redemption(1, addr(10)).unwrap();
}

#[test]
fn reserved_flips_only_move_between_enlisted_and_reserved() {
    let (mut reg, clock) = registry();
    enlist_with_treasury(&mut reg, &clock, asset(1, 100, addr(10)));

    // Enlisted -> Enlisted is not a transition.
    let err = reg
        .submit_action(Action::SetAssetEnlisted { id: 1 }, addr(3))
        .unwrap_err();
    assert!(matches!(
        err,
        RegistryError::Asset(AssetError::InvalidStatus { .. })
    ));

    // A locked asset cannot be parked in Reserved.
    reg.transfer(addr(91), addr(10), 150).unwrap();
    reg.request_redemption(1, addr(10)).unwrap();
    let err = reg
        .submit_action(Action::SetAssetReserved { id: 1 }, addr(3))
        .unwrap_err();
    assert!(matches!(
        err,
        RegistryError::Asset(AssetError::InvalidStatus { .. })
    ));
}

// ---------------------------------------------------------------------------
// Collateralization
// ---------------------------------------------------------------------------

#[test]
fn supply_tracks_live_assets_through_the_whole_lifecycle() {
    let (mut reg, clock) = registry();

    assert!(reg.is_fully_collateralized()); // empty deployment

    enlist(
        &mut reg,
        &clock,
        vec![asset(1, 100, addr(10)), asset(2, 200, addr(11))],
    );
    assert!(reg.is_fully_collateralized());

    reg.transfer(addr(91), addr(10), 150).unwrap();
    assert!(reg.is_fully_collateralized()); // transfers never change supply

    reg.request_redemption(1, addr(10)).unwrap();
    assert!(reg.is_fully_collateralized()); // Locked still collateralizes

    reg.reject_redemption(1, addr(6)).unwrap();
    assert!(reg.is_fully_collateralized());

    let action_id = reg.request_redemption(1, addr(10)).unwrap();
    reg.approve(Role::RedemptionAdmin, action_id, addr(6)).unwrap();
    clock.advance(Duration::hours(49));
    reg.execute_redemption(1, addr(6)).unwrap();

    // 100 burned with its asset; the other asset still backs the rest.
    assert_eq!(reg.total_supply(), 200);
    assert_eq!(reg.total_tokens(AssetStatus::Enlisted), 200);
    assert!(reg.is_fully_collateralized());
}
