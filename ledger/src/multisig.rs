//! # Quorum Authorizer
//!
//! An N-of-M signer set gating execution of proposed actions. Every
//! privileged mutation in the system, including changes to an authorizer's
//! own membership, flows through the same submit/approve pipeline, so no
//! single party can unilaterally alter who authorizes future actions.
//!
//! The authorizer is a pure bookkeeping structure: it decides *when* an
//! action has quorum and releases the payload exactly once, but it never
//! applies payloads itself. The registry applies whatever the authorizer
//! releases, which keeps the authorizer free of references back into the
//! components it guards.
//!
//! Action records only ever move forward: `Pending` until quorum or
//! revocation, then terminally `Executed` or `Revoked`. A terminal record
//! is immutable and its identifier is never reused.

use crate::account::Address;
use crate::actions::{Action, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::debug;

/// Identifier of a submitted action, unique per authorizer and
/// monotonically increasing.
pub type ActionId = u64;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from authorizer operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MultisigError {
    /// The caller is not a member of this authorizer's signer set.
    #[error("{account} is not a signer of the {role} authorizer")]
    NotSigner {
        /// Role the authorizer is bound to.
        role: Role,
        /// The offending caller.
        account: Address,
    },

    /// The referenced action does not exist.
    #[error("no action {id} in the {role} authorizer")]
    UnknownAction {
        /// Role the authorizer is bound to.
        role: Role,
        /// The missing identifier.
        id: ActionId,
    },

    /// The action already reached a terminal status.
    #[error("action {id} is {status:?} and can no longer change")]
    AlreadyExecuted {
        /// The terminal action.
        id: ActionId,
        /// Which terminal status it holds.
        status: ActionStatus,
    },

    /// The caller already approved this action.
    #[error("{account} already approved action {id}")]
    DuplicateApproval {
        /// The action in question.
        id: ActionId,
        /// The repeat approver.
        account: Address,
    },

    /// The caller tried to revoke an approval it never gave.
    #[error("{account} has no approval to revoke on action {id}")]
    NotApproved {
        /// The action in question.
        id: ActionId,
        /// The caller.
        account: Address,
    },

    /// The account is already a signer.
    #[error("{account} is already a signer of the {role} authorizer")]
    DuplicateSigner {
        /// Role the authorizer is bound to.
        role: Role,
        /// The duplicate.
        account: Address,
    },

    /// The account is not a signer and cannot be removed.
    #[error("{account} is not a signer of the {role} authorizer and cannot be removed")]
    UnknownSigner {
        /// Role the authorizer is bound to.
        role: Role,
        /// The absent account.
        account: Address,
    },

    /// The operation would leave the signer set empty.
    #[error("removing {account} would empty the {role} signer set")]
    WouldEmptySignerSet {
        /// Role the authorizer is bound to.
        role: Role,
        /// The last signer.
        account: Address,
    },

    /// The requested approval requirement violates `1 <= n <= |signers|`.
    #[error("requirement {required} is invalid for {signers} signer(s)")]
    InvalidRequirement {
        /// The rejected requirement.
        required: u32,
        /// Current signer count.
        signers: u32,
    },

    /// The zero address can never be a signer.
    #[error("the zero address cannot be a signer")]
    ZeroAddressSigner,
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Lifecycle status of a submitted action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionStatus {
    /// Collecting approvals.
    Pending,
    /// Reached quorum; its payload was released exactly once.
    Executed,
    /// Every approval was withdrawn before quorum. Terminal.
    Revoked,
}

/// One submitted action and its approval state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAction {
    /// The payload released on quorum.
    pub payload: Action,
    /// The signer that submitted it.
    pub submitted_by: Address,
    /// Submission time, from the injected clock.
    pub submitted_at: DateTime<Utc>,
    /// Distinct signers that have approved.
    pub approvals: BTreeSet<Address>,
    /// Current lifecycle status.
    pub status: ActionStatus,
}

/// An N-of-M quorum authorizer bound to one role.
///
/// Invariants, maintained by every mutation:
/// - the signer set is never empty;
/// - `1 <= required <= |signers|`;
/// - no payload is released with fewer than `required` distinct approvals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiSigAuthorizer {
    role: Role,
    signers: BTreeSet<Address>,
    required: u32,
    next_action_id: ActionId,
    actions: BTreeMap<ActionId, PendingAction>,
}

impl MultiSigAuthorizer {
    /// Creates an authorizer with the given initial signer set.
    ///
    /// The bootstrapping problem (an authorizer cannot approve its own
    /// creation) is solved here: the initial membership is supplied at
    /// construction and every later membership change goes through the
    /// approval flow.
    pub fn new(
        role: Role,
        initial_signers: impl IntoIterator<Item = Address>,
        required: u32,
    ) -> Result<Self, MultisigError> {
        let signers: BTreeSet<Address> = initial_signers.into_iter().collect();
        if signers.contains(&Address::ZERO) {
            return Err(MultisigError::ZeroAddressSigner);
        }
        if signers.is_empty() || required == 0 || required as usize > signers.len() {
            return Err(MultisigError::InvalidRequirement {
                required,
                signers: signers.len() as u32,
            });
        }
        Ok(Self {
            role,
            signers,
            required,
            next_action_id: 0,
            actions: BTreeMap::new(),
        })
    }

    // -- proposal flow ------------------------------------------------------

    /// Submits a new action, auto-registering the caller's approval.
    ///
    /// Returns the new action id, plus the payload itself when the caller's
    /// own approval already satisfies the requirement (a 1-of-M authorizer
    /// executes at submission). The registry must apply a returned payload
    /// immediately; the record is already marked `Executed`.
    pub fn submit(
        &mut self,
        payload: Action,
        caller: Address,
        now: DateTime<Utc>,
    ) -> Result<(ActionId, Option<Action>), MultisigError> {
        self.require_signer(caller)?;

        let id = self.next_action_id;
        self.next_action_id += 1;

        let mut record = PendingAction {
            payload,
            submitted_by: caller,
            submitted_at: now,
            approvals: BTreeSet::from([caller]),
            status: ActionStatus::Pending,
        };

        let released = if record.approvals.len() >= self.required as usize {
            record.status = ActionStatus::Executed;
            Some(record.payload.clone())
        } else {
            None
        };

        debug!(
            role = %self.role,
            action = id,
            kind = %record.payload.kind(),
            immediate = released.is_some(),
            "action submitted"
        );
        self.actions.insert(id, record);
        Ok((id, released))
    }

    /// Submits an action on behalf of the system itself, with no approvals
    /// attached.
    ///
    /// Used for workflow-generated proposals (a redemption request
    /// enqueues its start-countdown action here); quorum must come
    /// entirely from this authorizer's signers.
    pub fn submit_external(&mut self, payload: Action, now: DateTime<Utc>) -> ActionId {
        let id = self.next_action_id;
        self.next_action_id += 1;
        debug!(role = %self.role, action = id, kind = %payload.kind(), "external action submitted");
        self.actions.insert(
            id,
            PendingAction {
                payload,
                submitted_by: Address::ZERO,
                submitted_at: now,
                approvals: BTreeSet::new(),
                status: ActionStatus::Pending,
            },
        );
        id
    }

    /// Adds the caller's approval to a pending action.
    ///
    /// Returns the payload when this approval reaches quorum; the record
    /// is marked `Executed` before the payload is handed back, so it can
    /// be released at most once.
    pub fn approve(
        &mut self,
        id: ActionId,
        caller: Address,
    ) -> Result<Option<Action>, MultisigError> {
        self.require_signer(caller)?;
        let role = self.role;
        let required = self.required as usize;

        let record = self
            .actions
            .get_mut(&id)
            .ok_or(MultisigError::UnknownAction { role, id })?;
        if record.status != ActionStatus::Pending {
            return Err(MultisigError::AlreadyExecuted {
                id,
                status: record.status,
            });
        }
        if !record.approvals.insert(caller) {
            return Err(MultisigError::DuplicateApproval {
                id,
                account: caller,
            });
        }

        if record.approvals.len() >= required {
            record.status = ActionStatus::Executed;
            debug!(role = %role, action = id, approvals = record.approvals.len(), "quorum reached");
            return Ok(Some(record.payload.clone()));
        }
        debug!(
            role = %role,
            action = id,
            approvals = record.approvals.len(),
            required,
            "approval recorded"
        );
        Ok(None)
    }

    /// Withdraws the caller's approval from a pending action.
    ///
    /// An action whose approval set empties becomes terminally `Revoked`.
    pub fn revoke(&mut self, id: ActionId, caller: Address) -> Result<(), MultisigError> {
        self.require_signer(caller)?;
        let role = self.role;

        let record = self
            .actions
            .get_mut(&id)
            .ok_or(MultisigError::UnknownAction { role, id })?;
        if record.status != ActionStatus::Pending {
            return Err(MultisigError::AlreadyExecuted {
                id,
                status: record.status,
            });
        }
        if !record.approvals.remove(&caller) {
            return Err(MultisigError::NotApproved {
                id,
                account: caller,
            });
        }
        if record.approvals.is_empty() {
            record.status = ActionStatus::Revoked;
            debug!(role = %role, action = id, "action revoked");
        }
        Ok(())
    }

    // -- membership, applied by the registry from approved payloads ---------

    /// Adds a signer. Reached only through an approved payload.
    pub fn add_signer(&mut self, account: Address) -> Result<(), MultisigError> {
        if account.is_zero() {
            return Err(MultisigError::ZeroAddressSigner);
        }
        if !self.signers.insert(account) {
            return Err(MultisigError::DuplicateSigner {
                role: self.role,
                account,
            });
        }
        Ok(())
    }

    /// Removes a signer. Reached only through an approved payload.
    ///
    /// Fails rather than empty the set. A requirement left above the new
    /// signer count is clamped down, keeping the quorum invariant intact.
    pub fn remove_signer(&mut self, account: Address) -> Result<(), MultisigError> {
        if !self.signers.contains(&account) {
            return Err(MultisigError::UnknownSigner {
                role: self.role,
                account,
            });
        }
        if self.signers.len() == 1 {
            return Err(MultisigError::WouldEmptySignerSet {
                role: self.role,
                account,
            });
        }
        self.signers.remove(&account);
        if self.required as usize > self.signers.len() {
            self.required = self.signers.len() as u32;
        }
        Ok(())
    }

    /// Changes the approval requirement. Reached only through an approved
    /// payload (or the registry's dynamic threshold rule).
    pub fn change_requirement(&mut self, required: u32) -> Result<(), MultisigError> {
        if required == 0 || required as usize > self.signers.len() {
            return Err(MultisigError::InvalidRequirement {
                required,
                signers: self.signers.len() as u32,
            });
        }
        self.required = required;
        Ok(())
    }

    // -- queries ------------------------------------------------------------

    /// Whether `account` may submit and approve here.
    pub fn is_signer(&self, account: Address) -> bool {
        self.signers.contains(&account)
    }

    /// The current signer set.
    pub fn signers(&self) -> &BTreeSet<Address> {
        &self.signers
    }

    /// Number of signers.
    pub fn signer_count(&self) -> u32 {
        self.signers.len() as u32
    }

    /// Current approval requirement.
    pub fn required(&self) -> u32 {
        self.required
    }

    /// A submitted action record, if it exists.
    pub fn action(&self, id: ActionId) -> Option<&PendingAction> {
        self.actions.get(&id)
    }

    /// Distinct approvals recorded for an action.
    pub fn approval_count(&self, id: ActionId) -> Option<u32> {
        self.actions.get(&id).map(|a| a.approvals.len() as u32)
    }

    /// Number of actions still collecting approvals.
    pub fn pending_count(&self) -> usize {
        self.actions
            .values()
            .filter(|a| a.status == ActionStatus::Pending)
            .count()
    }

    fn require_signer(&self, account: Address) -> Result<(), MultisigError> {
        if !self.is_signer(account) {
            return Err(MultisigError::NotSigner {
                role: self.role,
                account,
            });
        }
        Ok(())
    }
}
