//! The approval state machine for book-incentive submissions.
//!
//! Every edge lives in one transition table ([`Action::allowed_from`] plus
//! [`Action::required_roles`]); an action attempted from any other state
//! fails without touching the row. Each mutating action runs as a single
//! transaction: load, re-check state, write guarded by the observed
//! status, append one audit entry, commit. Notifications go out only
//! after the commit and never propagate failures.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde_json::json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::audit;
use crate::authz::{ensure_any_role, roles, Principal};
use crate::errors::AppError;
use crate::models::audit::AuditAction;
use crate::models::submission::{Status, Submission};
use crate::notify::{NotificationKind, Notifier};
use crate::store::{self, WorkflowPatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Submit,
    Verify,
    RejectStaff,
    Resubmit,
    Approve,
    RejectChief,
    Disburse,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Submit => "submit",
            Action::Verify => "verify",
            Action::RejectStaff => "reject_staff",
            Action::Resubmit => "resubmit",
            Action::Approve => "approve",
            Action::RejectChief => "reject_chief",
            Action::Disburse => "disburse",
        }
    }

    /// Valid source states for this action. Anything else is rejected.
    pub fn allowed_from(&self) -> &'static [Status] {
        match self {
            Action::Submit => &[Status::Draft],
            Action::Verify => &[Status::Submitted],
            Action::RejectStaff => &[Status::Submitted, Status::VerifiedStaff],
            Action::Resubmit => &[Status::RevisionRequired],
            Action::Approve => &[Status::VerifiedStaff],
            Action::RejectChief => &[Status::VerifiedStaff],
            Action::Disburse => &[Status::ApprovedChief],
        }
    }

    /// Roles that may perform this action; `None` means the action is
    /// gated on submission ownership instead.
    pub fn required_roles(&self) -> Option<&'static [&'static str]> {
        match self {
            Action::Submit | Action::Resubmit => None,
            Action::Verify | Action::RejectStaff => Some(&[roles::LPPM_STAFF]),
            Action::Approve | Action::RejectChief => Some(&[roles::LPPM_KETUA]),
            Action::Disburse => Some(&[roles::HRD]),
        }
    }

    fn audit_action(&self) -> AuditAction {
        match self {
            Action::Submit => AuditAction::Submitted,
            Action::Verify => AuditAction::Verified,
            Action::RejectStaff => AuditAction::RevisionRequested,
            Action::Resubmit => AuditAction::Resubmitted,
            Action::Approve => AuditAction::Approved,
            Action::RejectChief => AuditAction::Rejected,
            Action::Disburse => AuditAction::PaymentDisbursed,
        }
    }
}

#[derive(Clone)]
pub struct ApprovalWorkflow {
    pool: SqlitePool,
    notifier: Arc<dyn Notifier>,
}

impl ApprovalWorkflow {
    pub fn new(pool: SqlitePool, notifier: Arc<dyn Notifier>) -> Self {
        Self { pool, notifier }
    }

    pub async fn submit(&self, id: Uuid, principal: &Principal) -> Result<Submission, AppError> {
        self.run_transition(id, principal, Action::Submit, |current| {
            let mut patch = WorkflowPatch::from_current(current, Status::Submitted);
            patch.submitted_at = Some(Utc::now());
            Ok((patch, None))
        })
        .await
    }

    pub async fn verify(&self, id: Uuid, principal: &Principal) -> Result<Submission, AppError> {
        self.run_transition(id, principal, Action::Verify, |current| {
            Ok((WorkflowPatch::from_current(current, Status::VerifiedStaff), None))
        })
        .await
    }

    /// Staff sends the submission back for revision; terminal for staff
    /// review but the owner may resubmit.
    pub async fn reject_staff(
        &self,
        id: Uuid,
        principal: &Principal,
        note: String,
    ) -> Result<Submission, AppError> {
        if note.trim().is_empty() {
            return Err(AppError::bad_request("a revision note is required"));
        }

        self.run_transition(id, principal, Action::RejectStaff, move |current| {
            let mut patch = WorkflowPatch::from_current(current, Status::RevisionRequired);
            patch.reject_note = Some(note.clone());
            Ok((patch, Some(note)))
        })
        .await
    }

    pub async fn resubmit(&self, id: Uuid, principal: &Principal) -> Result<Submission, AppError> {
        self.run_transition(id, principal, Action::Resubmit, |current| {
            let mut patch = WorkflowPatch::from_current(current, Status::Submitted);
            patch.reject_note = None;
            patch.rejected_by = None;
            patch.submitted_at = Some(Utc::now());
            Ok((patch, None))
        })
        .await
    }

    pub async fn approve(
        &self,
        id: Uuid,
        principal: &Principal,
        amount: i64,
    ) -> Result<Submission, AppError> {
        if amount <= 0 {
            return Err(AppError::bad_request("approved amount must be positive"));
        }

        let updated = self
            .run_transition(id, principal, Action::Approve, move |current| {
                let mut patch = WorkflowPatch::from_current(current, Status::ApprovedChief);
                patch.approved_amount = Some(amount);
                Ok((patch, None))
            })
            .await?;

        self.dispatch(
            updated.user_id,
            NotificationKind::SubmissionApproved,
            json!({
                "submission_id": updated.id,
                "title": updated.title,
                "approved_amount": amount,
            }),
        )
        .await;

        Ok(updated)
    }

    pub async fn reject_chief(
        &self,
        id: Uuid,
        principal: &Principal,
        note: String,
    ) -> Result<Submission, AppError> {
        if note.trim().is_empty() {
            return Err(AppError::bad_request("a rejection note is required"));
        }

        let actor = principal.user_id;
        self.run_transition(id, principal, Action::RejectChief, move |current| {
            let mut patch = WorkflowPatch::from_current(current, Status::Rejected);
            patch.reject_note = Some(note.clone());
            patch.rejected_by = Some(actor.to_string());
            Ok((patch, Some(note)))
        })
        .await
    }

    /// Record the payment. The date must be well-formed and the submission
    /// must exist; both are checked before the state guard.
    pub async fn disburse(
        &self,
        id: Uuid,
        principal: &Principal,
        payment_date: &str,
    ) -> Result<Submission, AppError> {
        let date = NaiveDate::parse_from_str(payment_date, "%Y-%m-%d").map_err(|_| {
            AppError::bad_request(format!("payment_date '{payment_date}' is not a valid date"))
        })?;

        let updated = self
            .run_transition(id, principal, Action::Disburse, move |current| {
                let mut patch = WorkflowPatch::from_current(current, Status::Paid);
                patch.payment_date = Some(date.format("%Y-%m-%d").to_string());
                Ok((patch, None))
            })
            .await?;

        self.dispatch(
            updated.user_id,
            NotificationKind::IncentiveDisbursed,
            json!({
                "submission_id": updated.id,
                "title": updated.title,
                "approved_amount": updated.approved_amount,
                "payment_date": updated.payment_date,
            }),
        )
        .await;

        Ok(updated)
    }

    /// Shared transition driver. The closure computes the patch and an
    /// optional audit note from the freshly loaded row.
    async fn run_transition<F>(
        &self,
        id: Uuid,
        principal: &Principal,
        action: Action,
        build_patch: F,
    ) -> Result<Submission, AppError>
    where
        F: FnOnce(&Submission) -> Result<(WorkflowPatch, Option<String>), AppError>,
    {
        if let Some(required) = action.required_roles() {
            ensure_any_role(principal, required)?;
        }

        let mut tx = self.pool.begin().await?;

        let current = store::get(&mut tx, id).await?;

        if action.required_roles().is_none() && current.user_id != principal.user_id {
            return Err(AppError::forbidden(format!(
                "only the owner may {} this submission",
                action.as_str()
            )));
        }

        // Re-checked inside the transaction that performs the write, so a
        // lost update between an earlier read and this call cannot slip a
        // transition through from a stale state.
        if !action.allowed_from().contains(&current.status) {
            return Err(AppError::invalid_transition(
                id.to_string(),
                action.as_str(),
                current.status.as_str(),
            ));
        }

        let (patch, note) = build_patch(&current)?;

        store::update_workflow_fields(&mut tx, id, current.status, &patch).await?;
        audit::append(
            &mut tx,
            id,
            principal.user_id,
            action.audit_action(),
            note.as_deref(),
        )
        .await?;

        tx.commit().await?;

        store::get_from_pool(&self.pool, id).await
    }

    /// Fire-and-observe: a dispatch failure is logged, never surfaced.
    async fn dispatch(&self, user_id: Uuid, kind: NotificationKind, payload: serde_json::Value) {
        if let Err(err) = self.notifier.notify(user_id, kind, payload).await {
            tracing::warn!(
                user_id = %user_id,
                kind = kind.as_str(),
                error = %err,
                "notification dispatch failed"
            );
        }
    }
}
