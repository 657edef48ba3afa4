use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InviteStatus {
    Pending,
    Accepted,
    Rejected,
}

impl InviteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InviteStatus::Pending => "PENDING",
            InviteStatus::Accepted => "ACCEPTED",
            InviteStatus::Rejected => "REJECTED",
        }
    }

    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value {
            "PENDING" => Ok(InviteStatus::Pending),
            "ACCEPTED" => Ok(InviteStatus::Accepted),
            "REJECTED" => Ok(InviteStatus::Rejected),
            other => Err(AppError::internal(format!("unknown invite status '{other}'"))),
        }
    }
}

/// An invited reviewer's response record. Informational only: its
/// lifecycle is independent of the approval workflow and never gates it.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReviewerInvite {
    pub id: Uuid,
    pub submission_id: Uuid,
    pub reviewer_name: String,
    pub reviewer_email: String,
    pub status: InviteStatus,
    pub invited_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbReviewerInvite {
    pub id: String,
    pub submission_id: String,
    pub reviewer_name: String,
    pub reviewer_email: String,
    pub status: String,
    pub invited_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl TryFrom<DbReviewerInvite> for ReviewerInvite {
    type Error = AppError;

    fn try_from(db: DbReviewerInvite) -> Result<Self, Self::Error> {
        Ok(ReviewerInvite {
            id: Uuid::parse_str(&db.id)
                .map_err(|_| AppError::internal(format!("invalid invite id '{}'", db.id)))?,
            submission_id: Uuid::parse_str(&db.submission_id).map_err(|_| {
                AppError::internal(format!("invalid submission id '{}'", db.submission_id))
            })?,
            reviewer_name: db.reviewer_name,
            reviewer_email: db.reviewer_email,
            status: InviteStatus::parse(&db.status)?,
            invited_at: db.invited_at,
            responded_at: db.responded_at,
        })
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReviewerInviteRequest {
    pub reviewer_name: String,
    pub reviewer_email: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReviewerRespondRequest {
    /// ACCEPTED or REJECTED; PENDING is not a valid response.
    pub status: InviteStatus,
}
