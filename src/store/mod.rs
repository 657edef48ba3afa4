//! Persistence for submissions, authors, and reviewer invites.
//!
//! Workflow-mutating writes go through [`update_workflow_fields`], a single
//! UPDATE guarded by the expected status (`WHERE id = ? AND status = ?`).
//! Two racing transitions from the same state cannot both pass the guard;
//! the loser sees a conflict instead of a corrupted row.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::author::{Author, AuthorCreateRequest, DbAuthor};
use crate::models::notification::{DbNotification, Notification};
use crate::models::reviewer::{DbReviewerInvite, InviteStatus, ReviewerInvite, ReviewerInviteRequest};
use crate::models::submission::{
    DbSubmission, Status, Submission, SubmissionCreateRequest, SubmissionUpdateRequest,
};

const SUBMISSION_COLUMNS: &str = "id, user_id, title, isbn, publication_year, publisher, \
     publisher_level, book_type, total_pages, external_link, document_path, status, \
     approved_amount, payment_date, reject_note, rejected_by, submitted_at, created_at, updated_at";

/// Create a new submission in DRAFT. The id is generated here, never by
/// the database.
pub async fn create(
    pool: &SqlitePool,
    owner_id: Uuid,
    req: SubmissionCreateRequest,
) -> Result<Submission, AppError> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO book_submissions \
         (id, user_id, title, isbn, publication_year, publisher, publisher_level, book_type, \
          total_pages, external_link, document_path, status, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(owner_id.to_string())
    .bind(&req.title)
    .bind(&req.isbn)
    .bind(req.publication_year)
    .bind(&req.publisher)
    .bind(req.publisher_level.as_str())
    .bind(req.book_type.as_str())
    .bind(req.total_pages)
    .bind(&req.external_link)
    .bind(&req.document_path)
    .bind(Status::Draft.as_str())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    let mut conn = pool.acquire().await?;
    get(&mut conn, id).await
}

pub async fn get(conn: &mut SqliteConnection, id: Uuid) -> Result<Submission, AppError> {
    let sql = format!("SELECT {SUBMISSION_COLUMNS} FROM book_submissions WHERE id = ?");
    let row = sqlx::query_as::<_, DbSubmission>(&sql)
        .bind(id.to_string())
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| AppError::not_found(format!("submission {id} not found")))?;

    row.try_into()
}

pub async fn get_from_pool(pool: &SqlitePool, id: Uuid) -> Result<Submission, AppError> {
    let mut conn = pool.acquire().await?;
    get(&mut conn, id).await
}

/// List submissions in any of the given statuses, newest submissions
/// first (display ordering, not a correctness invariant).
pub async fn list_by_status(
    pool: &SqlitePool,
    statuses: &[Status],
) -> Result<Vec<Submission>, AppError> {
    if statuses.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; statuses.len()].join(", ");
    let sql = format!(
        "SELECT {SUBMISSION_COLUMNS} FROM book_submissions WHERE status IN ({placeholders}) \
         ORDER BY submitted_at IS NULL, submitted_at DESC, created_at DESC"
    );

    let mut query = sqlx::query_as::<_, DbSubmission>(&sql);
    for status in statuses {
        query = query.bind(status.as_str());
    }

    let rows = query.fetch_all(pool).await?;
    rows.into_iter().map(Submission::try_from).collect()
}

pub async fn list_by_owner(pool: &SqlitePool, owner_id: Uuid) -> Result<Vec<Submission>, AppError> {
    let sql = format!(
        "SELECT {SUBMISSION_COLUMNS} FROM book_submissions WHERE user_id = ? \
         ORDER BY created_at DESC"
    );
    let rows = sqlx::query_as::<_, DbSubmission>(&sql)
        .bind(owner_id.to_string())
        .fetch_all(pool)
        .await?;
    rows.into_iter().map(Submission::try_from).collect()
}

/// Workflow-managed fields written as one unit by a transition.
#[derive(Debug, Clone)]
pub struct WorkflowPatch {
    pub status: Status,
    pub approved_amount: Option<i64>,
    pub payment_date: Option<String>,
    pub reject_note: Option<String>,
    pub rejected_by: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl WorkflowPatch {
    /// Start from the current row so untouched fields carry over.
    pub fn from_current(current: &Submission, status: Status) -> Self {
        Self {
            status,
            approved_amount: current.approved_amount,
            payment_date: current.payment_date.map(|d| d.format("%Y-%m-%d").to_string()),
            reject_note: current.reject_note.clone(),
            rejected_by: current.rejected_by.map(|id| id.to_string()),
            submitted_at: current.submitted_at,
        }
    }
}

/// Apply a workflow patch with the optimistic status guard. `expected` is
/// the status the caller observed when it validated the transition; if the
/// row has moved on since, no fields change and the caller gets a conflict.
pub async fn update_workflow_fields(
    conn: &mut SqliteConnection,
    id: Uuid,
    expected: Status,
    patch: &WorkflowPatch,
) -> Result<(), AppError> {
    let result = sqlx::query(
        "UPDATE book_submissions \
         SET status = ?, approved_amount = ?, payment_date = ?, reject_note = ?, \
             rejected_by = ?, submitted_at = ?, updated_at = ? \
         WHERE id = ? AND status = ?",
    )
    .bind(patch.status.as_str())
    .bind(patch.approved_amount)
    .bind(&patch.payment_date)
    .bind(&patch.reject_note)
    .bind(&patch.rejected_by)
    .bind(patch.submitted_at)
    .bind(Utc::now())
    .bind(id.to_string())
    .bind(expected.as_str())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 1 {
        return Ok(());
    }

    // Zero rows: either the row is gone or another transition won the race.
    let still_there: Option<String> =
        sqlx::query_scalar("SELECT status FROM book_submissions WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(conn)
            .await?;

    match still_there {
        None => Err(AppError::not_found(format!("submission {id} not found"))),
        Some(current) => Err(AppError::conflict(format!(
            "submission {id} changed concurrently (status is now {current})"
        ))),
    }
}

/// Owner edits to descriptive fields, permitted only pre-submission
/// (DRAFT) or while revisions were requested.
pub async fn update_draft_fields(
    pool: &SqlitePool,
    id: Uuid,
    owner_id: Uuid,
    req: SubmissionUpdateRequest,
) -> Result<Submission, AppError> {
    let mut conn = pool.acquire().await?;
    let current = get(&mut conn, id).await?;

    if current.user_id != owner_id {
        return Err(AppError::forbidden("only the owner may edit a submission"));
    }
    if !matches!(current.status, Status::Draft | Status::RevisionRequired) {
        return Err(AppError::invalid_transition(
            id.to_string(),
            "edit",
            current.status.as_str(),
        ));
    }

    sqlx::query(
        "UPDATE book_submissions \
         SET title = COALESCE(?, title), isbn = COALESCE(?, isbn), \
             publication_year = COALESCE(?, publication_year), \
             publisher = COALESCE(?, publisher), \
             publisher_level = COALESCE(?, publisher_level), \
             book_type = COALESCE(?, book_type), \
             total_pages = COALESCE(?, total_pages), \
             external_link = COALESCE(?, external_link), \
             document_path = COALESCE(?, document_path), \
             updated_at = ? \
         WHERE id = ?",
    )
    .bind(&req.title)
    .bind(&req.isbn)
    .bind(req.publication_year)
    .bind(&req.publisher)
    .bind(req.publisher_level.map(|level| level.as_str()))
    .bind(req.book_type.map(|kind| kind.as_str()))
    .bind(req.total_pages)
    .bind(&req.external_link)
    .bind(&req.document_path)
    .bind(Utc::now())
    .bind(id.to_string())
    .execute(&mut *conn)
    .await?;

    get(&mut conn, id).await
}

// ---------------------------------------------------------------------------
// Authors
// ---------------------------------------------------------------------------

pub async fn add_author(
    pool: &SqlitePool,
    submission_id: Uuid,
    req: AuthorCreateRequest,
) -> Result<Author, AppError> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO book_authors (id, submission_id, name, author_role, user_id, created_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(submission_id.to_string())
    .bind(&req.name)
    .bind(req.author_role.as_str())
    .bind(req.user_id.map(|uid| uid.to_string()))
    .bind(now)
    .execute(pool)
    .await?;

    Ok(Author {
        id,
        submission_id,
        name: req.name,
        author_role: req.author_role,
        user_id: req.user_id,
        created_at: now,
    })
}

pub async fn list_authors(pool: &SqlitePool, submission_id: Uuid) -> Result<Vec<Author>, AppError> {
    let rows = sqlx::query_as::<_, DbAuthor>(
        "SELECT id, submission_id, name, author_role, user_id, created_at \
         FROM book_authors WHERE submission_id = ? ORDER BY created_at ASC",
    )
    .bind(submission_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(Author::try_from).collect()
}

// ---------------------------------------------------------------------------
// Reviewer invites
// ---------------------------------------------------------------------------

pub async fn add_reviewer_invite(
    pool: &SqlitePool,
    submission_id: Uuid,
    req: ReviewerInviteRequest,
) -> Result<ReviewerInvite, AppError> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO reviewer_invites \
         (id, submission_id, reviewer_name, reviewer_email, status, invited_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(submission_id.to_string())
    .bind(&req.reviewer_name)
    .bind(&req.reviewer_email)
    .bind(InviteStatus::Pending.as_str())
    .bind(now)
    .execute(pool)
    .await?;

    Ok(ReviewerInvite {
        id,
        submission_id,
        reviewer_name: req.reviewer_name,
        reviewer_email: req.reviewer_email,
        status: InviteStatus::Pending,
        invited_at: now,
        responded_at: None,
    })
}

pub async fn respond_reviewer_invite(
    pool: &SqlitePool,
    invite_id: Uuid,
    response: InviteStatus,
) -> Result<ReviewerInvite, AppError> {
    if response == InviteStatus::Pending {
        return Err(AppError::bad_request("response must be ACCEPTED or REJECTED"));
    }

    let result = sqlx::query(
        "UPDATE reviewer_invites SET status = ?, responded_at = ? \
         WHERE id = ? AND status = 'PENDING'",
    )
    .bind(response.as_str())
    .bind(Utc::now())
    .bind(invite_id.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::conflict(format!(
            "invite {invite_id} not found or already answered"
        )));
    }

    let row = sqlx::query_as::<_, DbReviewerInvite>(
        "SELECT id, submission_id, reviewer_name, reviewer_email, status, invited_at, responded_at \
         FROM reviewer_invites WHERE id = ?",
    )
    .bind(invite_id.to_string())
    .fetch_one(pool)
    .await?;

    row.try_into()
}

pub async fn list_reviewer_invites(
    pool: &SqlitePool,
    submission_id: Uuid,
) -> Result<Vec<ReviewerInvite>, AppError> {
    let rows = sqlx::query_as::<_, DbReviewerInvite>(
        "SELECT id, submission_id, reviewer_name, reviewer_email, status, invited_at, responded_at \
         FROM reviewer_invites WHERE submission_id = ? ORDER BY invited_at ASC",
    )
    .bind(submission_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(ReviewerInvite::try_from).collect()
}

// ---------------------------------------------------------------------------
// Notifications outbox (read side; writes go through crate::notify)
// ---------------------------------------------------------------------------

pub async fn list_notifications(
    pool: &SqlitePool,
    user_id: Uuid,
) -> Result<Vec<Notification>, AppError> {
    let rows = sqlx::query_as::<_, DbNotification>(
        "SELECT id, user_id, kind, payload, created_at \
         FROM notifications WHERE user_id = ? ORDER BY created_at DESC",
    )
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(Notification::try_from).collect()
}
