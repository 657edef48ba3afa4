use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;

/// Action codes recorded in the audit log. Each successful workflow
/// transition appends exactly one entry with the matching code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Submitted,
    Verified,
    RevisionRequested,
    Resubmitted,
    Approved,
    Rejected,
    PaymentDisbursed,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Submitted => "SUBMITTED",
            AuditAction::Verified => "VERIFIED",
            AuditAction::RevisionRequested => "REVISION_REQUESTED",
            AuditAction::Resubmitted => "RESUBMITTED",
            AuditAction::Approved => "APPROVED",
            AuditAction::Rejected => "REJECTED",
            AuditAction::PaymentDisbursed => "PAYMENT_DISBURSED",
        }
    }
}

/// Immutable record of an action taken against a submission. Entries are
/// hash-chained: each carries SHA-256(prev_hash || canonical payload), so
/// any retroactive edit breaks the chain.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub submission_id: Uuid,
    pub actor_id: Uuid,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_hash: Option<String>,
    pub hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbAuditLogEntry {
    pub id: String,
    pub submission_id: String,
    pub actor_id: String,
    pub action: String,
    pub note: Option<String>,
    pub prev_hash: Option<String>,
    pub hash: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbAuditLogEntry> for AuditLogEntry {
    type Error = AppError;

    fn try_from(db: DbAuditLogEntry) -> Result<Self, Self::Error> {
        Ok(AuditLogEntry {
            id: Uuid::parse_str(&db.id)
                .map_err(|_| AppError::internal(format!("invalid audit id '{}'", db.id)))?,
            submission_id: Uuid::parse_str(&db.submission_id).map_err(|_| {
                AppError::internal(format!("invalid submission id '{}'", db.submission_id))
            })?,
            actor_id: Uuid::parse_str(&db.actor_id)
                .map_err(|_| AppError::internal(format!("invalid actor id '{}'", db.actor_id)))?,
            action: db.action,
            note: db.note,
            prev_hash: db.prev_hash,
            hash: db.hash,
            created_at: db.created_at,
        })
    }
}
