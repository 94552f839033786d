//! Integration tests for the transfer-restriction engine at the registry
//! level: whitelist gating, rolling daily limits, delayed large transfers,
//! and sweep-address routing.

use chrono::Duration;
use landmark_ledger::account::{Address, Fingerprint};
use landmark_ledger::actions::{Action, AssetInput};
use landmark_ledger::clock::ManualClock;
use landmark_ledger::registry::{
    AssetConfig, BootstrapConfig, CountdownConfig, Registry, RegistryError, RoleConfig,
    TokenConfig,
};
use landmark_ledger::token::{
    RestrictedToken, TokenError, TransferOutcome, TransferRecordKind, RESTRICTION_DAILY_LIMIT,
    RESTRICTION_NONE, RESTRICTION_NOT_WHITELISTED,
};
use std::sync::Arc;

fn addr(n: u8) -> Address {
    Address([n; 20])
}

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

/// Deployment with 10_000 units already minted and moved to addr(10).
///
/// Supply originates from a minting round (one 10_000-unit asset owned by
/// addr(11)), so the collateralization invariant holds throughout.
fn funded_registry() -> (Registry, ManualClock) {
    let clock = ManualClock::starting_now();
    let mut reg = Registry::new(bootstrap(), Arc::new(clock.clone())).unwrap();

    reg.submit_action(
        Action::AddPendingAssets {
            assets: vec![AssetInput {
                id: 1,
                fingerprint: Fingerprint([0x11; 32]),
                token_value: 10_000,
                owner: addr(11),
            }],
        },
        addr(5),
    )
    .unwrap();
    clock.advance(Duration::hours(48) + Duration::seconds(1));
    reg.refresh_minting_round(addr(5)).unwrap();
    reg.transfer(addr(91), addr(10), 10_000).unwrap();
    (reg, clock)
}

/// Activates a 500-unit daily limit on addr(10), waiting out the
/// daily-limit-update countdown.
fn activate_limit(reg: &mut Registry, clock: &ManualClock, account: Address, limit: u128) {
    reg.update_daily_limit(account, limit);
    clock.advance(Duration::hours(48) + Duration::seconds(1));
    assert_eq!(reg.daily_limit(account), limit);
}

// ---------------------------------------------------------------------------
// Whitelist Gating
// ---------------------------------------------------------------------------

#[test]
fn transfers_require_a_whitelisted_recipient() {
    let (mut reg, _) = funded_registry();

    let err = reg.transfer(addr(10), addr(50), 100).unwrap_err();
    assert_eq!(
        err,
        RegistryError::Token(TokenError::NotWhitelisted { account: addr(50) })
    );
    assert_eq!(reg.balance_of(addr(10)), 10_000);

    reg.submit_action(Action::AddWhitelisted { account: addr(50) }, addr(4))
        .unwrap();
    reg.transfer(addr(10), addr(50), 100).unwrap();
    assert_eq!(reg.balance_of(addr(50)), 100);
}

// ---------------------------------------------------------------------------
// Daily Limits
// ---------------------------------------------------------------------------

#[test]
fn window_spend_accumulates_and_resets() {
    let (mut reg, clock) = funded_registry();
    activate_limit(&mut reg, &clock, addr(10), 500);

    // limit - 1 passes...
    assert_eq!(
        reg.transfer(addr(10), addr(11), 499).unwrap(),
        TransferOutcome::Completed
    );

    // ...two more units in the same window park behind the countdown...
    match reg.transfer(addr(10), addr(11), 2).unwrap() {
        TransferOutcome::Delayed(_) => {}
        other => panic!("expected delayed outcome, got {other:?}"),
    }

    // ...and the same two units complete once the window rolls over.
    clock.advance(Duration::hours(25));
    assert_eq!(
        reg.transfer(addr(10), addr(11), 2).unwrap(),
        TransferOutcome::Completed
    );
}

#[test]
fn limit_updates_activate_lazily_after_their_countdown() {
    let (mut reg, clock) = funded_registry();
    assert_eq!(reg.daily_limit(addr(10)), 0); // disabled at bootstrap

    reg.update_daily_limit(addr(10), 500);
    assert_eq!(reg.daily_limit(addr(10)), 0);

    // Before activation, a 501-unit transfer moves immediately.
    assert_eq!(
        reg.transfer(addr(10), addr(11), 501).unwrap(),
        TransferOutcome::Completed
    );

    clock.advance(Duration::hours(48) + Duration::seconds(1));
    assert_eq!(reg.daily_limit(addr(10)), 500);

    // After activation, the same transfer parks.
    match reg.transfer(addr(10), addr(11), 501).unwrap() {
        TransferOutcome::Delayed(_) => {}
        other => panic!("expected delayed outcome, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Delayed Transfers
// ---------------------------------------------------------------------------

#[test]
fn large_transfer_parks_and_executes_only_after_countdown() {
    let (mut reg, clock) = funded_registry();
    activate_limit(&mut reg, &clock, addr(10), 500);

    let id = match reg.transfer(addr(10), addr(11), 501).unwrap() {
        TransferOutcome::Delayed(id) => id,
        other => panic!("expected delayed outcome, got {other:?}"),
    };

    // No balance moved at initiation.
    assert_eq!(reg.balance_of(addr(10)), 10_000);
    assert_eq!(reg.balance_of(addr(11)), 0);

    let err = reg.execute_delayed_transfer(id, addr(10)).unwrap_err();
    assert_eq!(
        err,
        RegistryError::Token(TokenError::CountdownNotElapsed { id })
    );

    clock.advance(Duration::hours(48) + Duration::seconds(1));
    reg.execute_delayed_transfer(id, addr(10)).unwrap();
    assert_eq!(reg.balance_of(addr(10)), 9_499);
    assert_eq!(reg.balance_of(addr(11)), 501);
}

#[test]
fn delayed_execution_rechecks_pause_and_whitelist() {
    let (mut reg, clock) = funded_registry();
    activate_limit(&mut reg, &clock, addr(10), 500);

    let id = match reg.transfer(addr(10), addr(11), 501).unwrap() {
        TransferOutcome::Delayed(id) => id,
        other => panic!("expected delayed outcome, got {other:?}"),
    };

    // De-whitelist the recipient while the transfer waits.
    reg.submit_action(Action::RemoveWhitelisted { account: addr(11) }, addr(4))
        .unwrap();
    clock.advance(Duration::hours(48) + Duration::seconds(1));
    reg.finalize_whitelist_removal(addr(11), addr(4)).unwrap();

    let err = reg.execute_delayed_transfer(id, addr(10)).unwrap_err();
    assert_eq!(
        err,
        RegistryError::Token(TokenError::NotWhitelisted { account: addr(11) })
    );

    // Re-whitelisted but paused: still no movement.
    reg.submit_action(Action::AddWhitelisted { account: addr(11) }, addr(4))
        .unwrap();
    reg.submit_action(Action::Pause, addr(1)).unwrap();
    let err = reg.execute_delayed_transfer(id, addr(10)).unwrap_err();
    assert_eq!(err, RegistryError::Token(TokenError::Paused));

    reg.submit_action(Action::Unpause, addr(1)).unwrap();
    reg.execute_delayed_transfer(id, addr(10)).unwrap();
    assert_eq!(reg.balance_of(addr(11)), 501);
}

#[test]
fn cancellation_rights_follow_the_initiating_method() {
    let (mut reg, clock) = funded_registry();
    activate_limit(&mut reg, &clock, addr(10), 500);

    // Direct transfer: only the sender may cancel.
    let id = match reg.transfer(addr(10), addr(11), 501).unwrap() {
        TransferOutcome::Delayed(id) => id,
        other => panic!("expected delayed outcome, got {other:?}"),
    };
    let err = reg.cancel_delayed_transfer(id, addr(11)).unwrap_err();
    assert!(matches!(
        err,
        RegistryError::Token(TokenError::Unauthorized { .. })
    ));
    reg.cancel_delayed_transfer(id, addr(10)).unwrap();

    // A cancelled transfer is gone; executing it reports NoSuchTransfer.
    clock.advance(Duration::hours(49));
    let err = reg.execute_delayed_transfer(id, addr(10)).unwrap_err();
    assert_eq!(err, RegistryError::Token(TokenError::NoSuchTransfer { id }));

    // Spender-initiated: the sender or the initiating spender may cancel.
    reg.approve_allowance(addr(10), addr(12), 501);
    let id = match reg.transfer_from(addr(12), addr(10), addr(11), 501).unwrap() {
        TransferOutcome::Delayed(id) => id,
        other => panic!("expected delayed outcome, got {other:?}"),
    };
    let err = reg.cancel_delayed_transfer(id, addr(11)).unwrap_err();
    assert!(matches!(
        err,
        RegistryError::Token(TokenError::Unauthorized { .. })
    ));
    reg.cancel_delayed_transfer(id, addr(12)).unwrap();
}

// ---------------------------------------------------------------------------
// Allowances
// ---------------------------------------------------------------------------

#[test]
fn transfer_from_consumes_allowance() {
    let (mut reg, _) = funded_registry();
    reg.approve_allowance(addr(10), addr(12), 300);

    reg.transfer_from(addr(12), addr(10), addr(11), 200).unwrap();
    assert_eq!(reg.balance_of(addr(11)), 200);
    assert_eq!(reg.token().allowance(addr(10), addr(12)), 100);

    let err = reg
        .transfer_from(addr(12), addr(10), addr(11), 200)
        .unwrap_err();
    assert!(matches!(
        err,
        RegistryError::Token(TokenError::InsufficientAllowance { .. })
    ));
}

// ---------------------------------------------------------------------------
// Sweep Routing
// ---------------------------------------------------------------------------

#[test]
fn sweep_transfers_credit_the_exchange_and_journal_the_nominal_recipient() {
    let (mut reg, _) = funded_registry();
    let deposit: Address = "0x7777777777777777777777777777777777700000".parse().unwrap();
    let nominal: Address = "0x7777777777777777777777777777777777712345".parse().unwrap();
    let exchange: Address = "0x9999999999999999999999999999999999999999".parse().unwrap();

    reg.submit_action(Action::AddWhitelisted { account: exchange }, addr(4))
        .unwrap();
    reg.submit_action(Action::SetSweepAddress { deposit, exchange }, addr(3))
        .unwrap();

    // The nominal deposit address is not whitelisted; the mapped exchange
    // account is what the whitelist check sees.
    reg.transfer(addr(10), nominal, 250).unwrap();
    assert_eq!(reg.balance_of(exchange), 250);
    assert_eq!(reg.balance_of(nominal), 0);

    let records = reg.journal();
    let tail = &records[records.len() - 2..];
    assert_eq!(tail[0].kind, TransferRecordKind::Primary);
    assert_eq!(tail[0].to, exchange);
    assert_eq!(tail[0].value, 250);
    assert_eq!(tail[1].kind, TransferRecordKind::Original);
    assert_eq!(tail[1].to, nominal);
    assert_eq!(tail[1].value, 250);
}

#[test]
fn sweep_mapping_is_a_basic_owner_action() {
    let (mut reg, _) = funded_registry();
    let deposit: Address = "0x7777777777777777777777777777777777700000".parse().unwrap();
    let exchange: Address = "0x9999999999999999999999999999999999999999".parse().unwrap();

    let err = reg
        .submit_action(Action::SetSweepAddress { deposit, exchange }, addr(4))
        .unwrap_err();
    assert!(matches!(err, RegistryError::Multisig(_)));
}

// ---------------------------------------------------------------------------
// Restriction Pre-Flight
// ---------------------------------------------------------------------------

#[test]
fn restriction_codes_mirror_the_transfer_pipeline() {
    let (mut reg, clock) = funded_registry();
    activate_limit(&mut reg, &clock, addr(10), 500);

    assert_eq!(
        reg.detect_transfer_restriction(addr(10), addr(11), 100),
        RESTRICTION_NONE
    );
    assert_eq!(
        reg.detect_transfer_restriction(addr(10), addr(50), 100),
        RESTRICTION_NOT_WHITELISTED
    );
    assert_eq!(
        reg.detect_transfer_restriction(addr(10), addr(11), 501),
        RESTRICTION_DAILY_LIMIT
    );

    // Pre-flight is read-only: the probed transfers never happened.
    assert_eq!(reg.balance_of(addr(10)), 10_000);

    assert_eq!(
        RestrictedToken::message_for_transfer_restriction(RESTRICTION_NONE).unwrap(),
        "Valid transfer"
    );
    assert_eq!(
        RestrictedToken::message_for_transfer_restriction(RESTRICTION_NOT_WHITELISTED).unwrap(),
        "Invalid transfer: nonwhitelisted recipient"
    );
    assert_eq!(
        RestrictedToken::message_for_transfer_restriction(RESTRICTION_DAILY_LIMIT).unwrap(),
        "Invalid transfer: exceeds daily limit"
    );
    assert_eq!(
        RestrictedToken::message_for_transfer_restriction(7).unwrap_err(),
        TokenError::UnknownRestrictionCode { code: 7 }
    );
}
