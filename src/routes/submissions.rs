//! HTTP adapter over the submission workflow. Handlers stay thin: resolve
//! the principal, gate, delegate to the store or workflow, serialize.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{self, ensure_any_role, roles, Principal};
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::audit::AuditLogEntry;
use crate::models::author::{Author, AuthorCreateRequest};
use crate::models::notification::Notification;
use crate::models::reviewer::{ReviewerInvite, ReviewerInviteRequest, ReviewerRespondRequest};
use crate::models::submission::{
    Status, Submission, SubmissionCreateRequest, SubmissionUpdateRequest,
};
use crate::{audit, store};

async fn principal(state: &AppState, auth: AuthUser) -> Result<Principal, AppError> {
    authz::load_principal(&state.pool, auth.user_id).await
}

/// Owner sees their own record; back-office roles see everything.
fn ensure_can_view(principal: &Principal, submission: &Submission) -> Result<(), AppError> {
    if submission.user_id == principal.user_id {
        return Ok(());
    }
    ensure_any_role(principal, roles::BACK_OFFICE)
}

#[derive(Debug, Deserialize)]
pub struct SubmissionListQuery {
    /// Comma-separated status filter, e.g. `SUBMITTED,VERIFIED_STAFF`.
    pub status: Option<String>,
}

fn parse_status_filter(raw: Option<&str>) -> Result<Vec<Status>, AppError> {
    let Some(raw) = raw else {
        // back-office default: everything that has left the owner's desk
        return Ok(vec![
            Status::Submitted,
            Status::RevisionRequired,
            Status::VerifiedStaff,
            Status::ApprovedChief,
            Status::Rejected,
            Status::Paid,
        ]);
    };

    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| {
            Status::parse(token)
                .map_err(|_| AppError::bad_request(format!("unknown status '{token}'")))
        })
        .collect()
}

#[utoipa::path(
    post,
    path = "/submissions",
    tag = "Submissions",
    request_body = SubmissionCreateRequest,
    responses((status = 201, description = "Draft created", body = Submission)),
    security(("bearerAuth" = []))
)]
pub async fn create_submission(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<SubmissionCreateRequest>,
) -> AppResult<(StatusCode, Json<Submission>)> {
    let principal = principal(&state, auth).await?;
    ensure_any_role(&principal, &[roles::DOSEN])?;

    if payload.title.trim().is_empty() {
        return Err(AppError::bad_request("title is required"));
    }
    if payload.total_pages <= 0 {
        return Err(AppError::bad_request("total_pages must be positive"));
    }

    let submission = store::create(&state.pool, principal.user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(submission)))
}

#[utoipa::path(
    get,
    path = "/submissions",
    tag = "Submissions",
    responses((status = 200, description = "Back-office submission queue", body = [Submission])),
    security(("bearerAuth" = []))
)]
pub async fn list_submissions(
    State(state): State<AppState>,
    Query(query): Query<SubmissionListQuery>,
    auth: AuthUser,
) -> AppResult<Json<Vec<Submission>>> {
    let principal = principal(&state, auth).await?;
    ensure_any_role(&principal, roles::BACK_OFFICE)?;

    let statuses = parse_status_filter(query.status.as_deref())?;
    let submissions = store::list_by_status(&state.pool, &statuses).await?;
    Ok(Json(submissions))
}

#[utoipa::path(
    get,
    path = "/submissions/mine",
    tag = "Submissions",
    responses((status = 200, description = "The caller's own submissions", body = [Submission])),
    security(("bearerAuth" = []))
)]
pub async fn list_own_submissions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<Submission>>> {
    let submissions = store::list_by_owner(&state.pool, auth.user_id).await?;
    Ok(Json(submissions))
}

#[utoipa::path(
    get,
    path = "/submissions/{id}",
    tag = "Submissions",
    params(("id" = Uuid, Path, description = "Submission id")),
    responses((status = 200, description = "Submission detail", body = Submission)),
    security(("bearerAuth" = []))
)]
pub async fn get_submission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth: AuthUser,
) -> AppResult<Json<Submission>> {
    let principal = principal(&state, auth).await?;
    let submission = store::get_from_pool(&state.pool, id).await?;
    ensure_can_view(&principal, &submission)?;
    Ok(Json(submission))
}

#[utoipa::path(
    put,
    path = "/submissions/{id}",
    tag = "Submissions",
    params(("id" = Uuid, Path, description = "Submission id")),
    request_body = SubmissionUpdateRequest,
    responses((status = 200, description = "Draft updated", body = Submission)),
    security(("bearerAuth" = []))
)]
pub async fn update_submission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth: AuthUser,
    Json(payload): Json<SubmissionUpdateRequest>,
) -> AppResult<Json<Submission>> {
    let submission = store::update_draft_fields(&state.pool, id, auth.user_id, payload).await?;
    Ok(Json(submission))
}

// ---------------------------------------------------------------------------
// Workflow actions
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/submissions/{id}/submit",
    tag = "Workflow",
    params(("id" = Uuid, Path, description = "Submission id")),
    responses((status = 200, description = "Submitted for review", body = Submission)),
    security(("bearerAuth" = []))
)]
pub async fn submit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth: AuthUser,
) -> AppResult<Json<Submission>> {
    let principal = principal(&state, auth).await?;
    let submission = state.workflow.submit(id, &principal).await?;
    Ok(Json(submission))
}

#[utoipa::path(
    post,
    path = "/submissions/{id}/verify",
    tag = "Workflow",
    params(("id" = Uuid, Path, description = "Submission id")),
    responses((status = 200, description = "Verified by staff", body = Submission)),
    security(("bearerAuth" = []))
)]
pub async fn verify(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth: AuthUser,
) -> AppResult<Json<Submission>> {
    let principal = principal(&state, auth).await?;
    let submission = state.workflow.verify(id, &principal).await?;
    Ok(Json(submission))
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RejectRequest {
    pub note: String,
}

#[utoipa::path(
    post,
    path = "/submissions/{id}/reject",
    tag = "Workflow",
    params(("id" = Uuid, Path, description = "Submission id")),
    request_body = RejectRequest,
    responses((status = 200, description = "Sent back for revision", body = Submission)),
    security(("bearerAuth" = []))
)]
pub async fn reject_staff(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth: AuthUser,
    Json(payload): Json<RejectRequest>,
) -> AppResult<Json<Submission>> {
    let principal = principal(&state, auth).await?;
    let submission = state.workflow.reject_staff(id, &principal, payload.note).await?;
    Ok(Json(submission))
}

#[utoipa::path(
    post,
    path = "/submissions/{id}/resubmit",
    tag = "Workflow",
    params(("id" = Uuid, Path, description = "Submission id")),
    responses((status = 200, description = "Resubmitted after revision", body = Submission)),
    security(("bearerAuth" = []))
)]
pub async fn resubmit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth: AuthUser,
) -> AppResult<Json<Submission>> {
    let principal = principal(&state, auth).await?;
    let submission = state.workflow.resubmit(id, &principal).await?;
    Ok(Json(submission))
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ApproveRequest {
    /// Incentive amount in whole rupiah.
    pub amount: i64,
}

#[utoipa::path(
    post,
    path = "/submissions/{id}/approve",
    tag = "Workflow",
    params(("id" = Uuid, Path, description = "Submission id")),
    request_body = ApproveRequest,
    responses((status = 200, description = "Approved by the chief", body = Submission)),
    security(("bearerAuth" = []))
)]
pub async fn approve(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth: AuthUser,
    Json(payload): Json<ApproveRequest>,
) -> AppResult<Json<Submission>> {
    let principal = principal(&state, auth).await?;
    let submission = state.workflow.approve(id, &principal, payload.amount).await?;
    Ok(Json(submission))
}

#[utoipa::path(
    post,
    path = "/submissions/{id}/reject-final",
    tag = "Workflow",
    params(("id" = Uuid, Path, description = "Submission id")),
    request_body = RejectRequest,
    responses((status = 200, description = "Rejected by the chief", body = Submission)),
    security(("bearerAuth" = []))
)]
pub async fn reject_chief(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth: AuthUser,
    Json(payload): Json<RejectRequest>,
) -> AppResult<Json<Submission>> {
    let principal = principal(&state, auth).await?;
    let submission = state.workflow.reject_chief(id, &principal, payload.note).await?;
    Ok(Json(submission))
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct DisburseRequest {
    /// Payment date as YYYY-MM-DD.
    #[schema(example = "2024-06-01")]
    pub payment_date: String,
}

#[utoipa::path(
    post,
    path = "/submissions/{id}/disburse",
    tag = "Workflow",
    params(("id" = Uuid, Path, description = "Submission id")),
    request_body = DisburseRequest,
    responses((status = 200, description = "Incentive paid out", body = Submission)),
    security(("bearerAuth" = []))
)]
pub async fn disburse(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth: AuthUser,
    Json(payload): Json<DisburseRequest>,
) -> AppResult<Json<Submission>> {
    let principal = principal(&state, auth).await?;
    let submission = state
        .workflow
        .disburse(id, &principal, &payload.payment_date)
        .await?;
    Ok(Json(submission))
}

// ---------------------------------------------------------------------------
// Authors, reviewer invites, audit log, notifications
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/submissions/{id}/authors",
    tag = "Submissions",
    params(("id" = Uuid, Path, description = "Submission id")),
    request_body = AuthorCreateRequest,
    responses((status = 201, description = "Author added", body = Author)),
    security(("bearerAuth" = []))
)]
pub async fn add_author(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth: AuthUser,
    Json(payload): Json<AuthorCreateRequest>,
) -> AppResult<(StatusCode, Json<Author>)> {
    let submission = store::get_from_pool(&state.pool, id).await?;
    if submission.user_id != auth.user_id {
        return Err(AppError::forbidden("only the owner may edit the author list"));
    }
    let author = store::add_author(&state.pool, id, payload).await?;
    Ok((StatusCode::CREATED, Json(author)))
}

#[utoipa::path(
    get,
    path = "/submissions/{id}/authors",
    tag = "Submissions",
    params(("id" = Uuid, Path, description = "Submission id")),
    responses((status = 200, description = "Author list", body = [Author])),
    security(("bearerAuth" = []))
)]
pub async fn list_authors(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth: AuthUser,
) -> AppResult<Json<Vec<Author>>> {
    let principal = principal(&state, auth).await?;
    let submission = store::get_from_pool(&state.pool, id).await?;
    ensure_can_view(&principal, &submission)?;
    let authors = store::list_authors(&state.pool, id).await?;
    Ok(Json(authors))
}

#[utoipa::path(
    post,
    path = "/submissions/{id}/reviewers",
    tag = "Reviewers",
    params(("id" = Uuid, Path, description = "Submission id")),
    request_body = ReviewerInviteRequest,
    responses((status = 201, description = "Reviewer invited", body = ReviewerInvite)),
    security(("bearerAuth" = []))
)]
pub async fn invite_reviewer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth: AuthUser,
    Json(payload): Json<ReviewerInviteRequest>,
) -> AppResult<(StatusCode, Json<ReviewerInvite>)> {
    let principal = principal(&state, auth).await?;
    let submission = store::get_from_pool(&state.pool, id).await?;
    ensure_can_view(&principal, &submission)?;
    let invite = store::add_reviewer_invite(&state.pool, id, payload).await?;
    Ok((StatusCode::CREATED, Json(invite)))
}

#[utoipa::path(
    get,
    path = "/submissions/{id}/reviewers",
    tag = "Reviewers",
    params(("id" = Uuid, Path, description = "Submission id")),
    responses((status = 200, description = "Reviewer invites", body = [ReviewerInvite])),
    security(("bearerAuth" = []))
)]
pub async fn list_reviewer_invites(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth: AuthUser,
) -> AppResult<Json<Vec<ReviewerInvite>>> {
    let principal = principal(&state, auth).await?;
    let submission = store::get_from_pool(&state.pool, id).await?;
    ensure_can_view(&principal, &submission)?;
    let invites = store::list_reviewer_invites(&state.pool, id).await?;
    Ok(Json(invites))
}

#[utoipa::path(
    post,
    path = "/reviewers/{invite_id}/respond",
    tag = "Reviewers",
    params(("invite_id" = Uuid, Path, description = "Invite id")),
    request_body = ReviewerRespondRequest,
    responses((status = 200, description = "Response recorded", body = ReviewerInvite)),
    security(("bearerAuth" = []))
)]
pub async fn respond_reviewer(
    State(state): State<AppState>,
    Path(invite_id): Path<Uuid>,
    _auth: AuthUser,
    Json(payload): Json<ReviewerRespondRequest>,
) -> AppResult<Json<ReviewerInvite>> {
    let invite = store::respond_reviewer_invite(&state.pool, invite_id, payload.status).await?;
    Ok(Json(invite))
}

#[utoipa::path(
    get,
    path = "/submissions/{id}/log",
    tag = "Submissions",
    params(("id" = Uuid, Path, description = "Submission id")),
    responses((status = 200, description = "Audit trail", body = [AuditLogEntry])),
    security(("bearerAuth" = []))
)]
pub async fn list_audit_log(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth: AuthUser,
) -> AppResult<Json<Vec<AuditLogEntry>>> {
    let principal = principal(&state, auth).await?;
    let submission = store::get_from_pool(&state.pool, id).await?;
    ensure_can_view(&principal, &submission)?;
    let entries = audit::list_for_submission(&state.pool, id).await?;
    Ok(Json(entries))
}

#[utoipa::path(
    get,
    path = "/notifications",
    tag = "Notifications",
    responses((status = 200, description = "The caller's notifications", body = [Notification])),
    security(("bearerAuth" = []))
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<Notification>>> {
    let notifications = store::list_notifications(&state.pool, auth.user_id).await?;
    Ok(Json(notifications))
}
