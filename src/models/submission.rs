use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;

/// Workflow status of a book submission. Transitions between these values
/// go exclusively through the transition table in `crate::workflow`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Draft,
    Submitted,
    RevisionRequired,
    VerifiedStaff,
    ApprovedChief,
    Rejected,
    Paid,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Draft => "DRAFT",
            Status::Submitted => "SUBMITTED",
            Status::RevisionRequired => "REVISION_REQUIRED",
            Status::VerifiedStaff => "VERIFIED_STAFF",
            Status::ApprovedChief => "APPROVED_CHIEF",
            Status::Rejected => "REJECTED",
            Status::Paid => "PAID",
        }
    }

    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value {
            "DRAFT" => Ok(Status::Draft),
            "SUBMITTED" => Ok(Status::Submitted),
            "REVISION_REQUIRED" => Ok(Status::RevisionRequired),
            "VERIFIED_STAFF" => Ok(Status::VerifiedStaff),
            "APPROVED_CHIEF" => Ok(Status::ApprovedChief),
            "REJECTED" => Ok(Status::Rejected),
            "PAID" => Ok(Status::Paid),
            other => Err(AppError::internal(format!("unknown status '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PublisherLevel {
    National,
    International,
    NationalAccredited,
}

impl PublisherLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublisherLevel::National => "NATIONAL",
            PublisherLevel::International => "INTERNATIONAL",
            PublisherLevel::NationalAccredited => "NATIONAL_ACCREDITED",
        }
    }

    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value {
            "NATIONAL" => Ok(PublisherLevel::National),
            "INTERNATIONAL" => Ok(PublisherLevel::International),
            "NATIONAL_ACCREDITED" => Ok(PublisherLevel::NationalAccredited),
            other => Err(AppError::internal(format!("unknown publisher level '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookType {
    Teaching,
    Reference,
    Monograph,
    Chapter,
}

impl BookType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookType::Teaching => "TEACHING",
            BookType::Reference => "REFERENCE",
            BookType::Monograph => "MONOGRAPH",
            BookType::Chapter => "CHAPTER",
        }
    }

    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value {
            "TEACHING" => Ok(BookType::Teaching),
            "REFERENCE" => Ok(BookType::Reference),
            "MONOGRAPH" => Ok(BookType::Monograph),
            "CHAPTER" => Ok(BookType::Chapter),
            other => Err(AppError::internal(format!("unknown book type '{other}'"))),
        }
    }
}

/// A book-publication incentive submission.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Submission {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub isbn: String,
    pub publication_year: i64,
    pub publisher: String,
    pub publisher_level: PublisherLevel,
    pub book_type: BookType,
    pub total_pages: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_path: Option<String>,
    pub status: Status,
    /// Incentive amount in whole rupiah, set by chief approval only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reject_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw row shape; UUIDs and enums are stored as TEXT and decoded in
/// `TryFrom` so a corrupt row surfaces as an internal error, not a panic.
#[derive(Debug, Clone, FromRow)]
pub struct DbSubmission {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub isbn: String,
    pub publication_year: i64,
    pub publisher: String,
    pub publisher_level: String,
    pub book_type: String,
    pub total_pages: i64,
    pub external_link: Option<String>,
    pub document_path: Option<String>,
    pub status: String,
    pub approved_amount: Option<i64>,
    pub payment_date: Option<String>,
    pub reject_note: Option<String>,
    pub rejected_by: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn parse_uuid(value: &str, field: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(value)
        .map_err(|_| AppError::internal(format!("invalid uuid in column {field}: '{value}'")))
}

impl TryFrom<DbSubmission> for Submission {
    type Error = AppError;

    fn try_from(db: DbSubmission) -> Result<Self, Self::Error> {
        let payment_date = db
            .payment_date
            .as_deref()
            .map(|raw| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|_| AppError::internal(format!("invalid payment_date '{raw}'")))
            })
            .transpose()?;

        Ok(Submission {
            id: parse_uuid(&db.id, "id")?,
            user_id: parse_uuid(&db.user_id, "user_id")?,
            title: db.title,
            isbn: db.isbn,
            publication_year: db.publication_year,
            publisher: db.publisher,
            publisher_level: PublisherLevel::parse(&db.publisher_level)?,
            book_type: BookType::parse(&db.book_type)?,
            total_pages: db.total_pages,
            external_link: db.external_link,
            document_path: db.document_path,
            status: Status::parse(&db.status)?,
            approved_amount: db.approved_amount,
            payment_date,
            reject_note: db.reject_note,
            rejected_by: db.rejected_by.as_deref().map(|raw| parse_uuid(raw, "rejected_by")).transpose()?,
            submitted_at: db.submitted_at,
            created_at: db.created_at,
            updated_at: db.updated_at,
        })
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SubmissionCreateRequest {
    #[schema(example = "Pengantar Sistem Terdistribusi")]
    pub title: String,
    #[schema(example = "978-602-0000-00-0")]
    pub isbn: String,
    pub publication_year: i64,
    pub publisher: String,
    pub publisher_level: PublisherLevel,
    pub book_type: BookType,
    pub total_pages: i64,
    pub external_link: Option<String>,
    pub document_path: Option<String>,
}

/// Owner edits to descriptive fields; allowed while the submission is in
/// DRAFT or REVISION_REQUIRED.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SubmissionUpdateRequest {
    pub title: Option<String>,
    pub isbn: Option<String>,
    pub publication_year: Option<i64>,
    pub publisher: Option<String>,
    pub publisher_level: Option<PublisherLevel>,
    pub book_type: Option<BookType>,
    pub total_pages: Option<i64>,
    pub external_link: Option<String>,
    pub document_path: Option<String>,
}
