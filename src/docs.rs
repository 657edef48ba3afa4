//! OpenAPI document assembled from the per-handler `#[utoipa::path]`
//! annotations, with a bearer security scheme for the SSO token.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::models::audit::{AuditAction, AuditLogEntry};
use crate::models::author::{Author, AuthorCreateRequest, AuthorRole};
use crate::models::notification::Notification;
use crate::models::reviewer::{
    InviteStatus, ReviewerInvite, ReviewerInviteRequest, ReviewerRespondRequest,
};
use crate::models::submission::{
    BookType, PublisherLevel, Status, Submission, SubmissionCreateRequest, SubmissionUpdateRequest,
};
use crate::routes::submissions::{ApproveRequest, DisburseRequest, RejectRequest};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health::health,
        crate::routes::submissions::create_submission,
        crate::routes::submissions::list_submissions,
        crate::routes::submissions::list_own_submissions,
        crate::routes::submissions::get_submission,
        crate::routes::submissions::update_submission,
        crate::routes::submissions::submit,
        crate::routes::submissions::verify,
        crate::routes::submissions::reject_staff,
        crate::routes::submissions::resubmit,
        crate::routes::submissions::approve,
        crate::routes::submissions::reject_chief,
        crate::routes::submissions::disburse,
        crate::routes::submissions::add_author,
        crate::routes::submissions::list_authors,
        crate::routes::submissions::invite_reviewer,
        crate::routes::submissions::list_reviewer_invites,
        crate::routes::submissions::respond_reviewer,
        crate::routes::submissions::list_audit_log,
        crate::routes::submissions::list_notifications,
    ),
    components(schemas(
        Submission,
        SubmissionCreateRequest,
        SubmissionUpdateRequest,
        Status,
        PublisherLevel,
        BookType,
        Author,
        AuthorCreateRequest,
        AuthorRole,
        ReviewerInvite,
        ReviewerInviteRequest,
        ReviewerRespondRequest,
        InviteStatus,
        AuditLogEntry,
        AuditAction,
        Notification,
        ApproveRequest,
        RejectRequest,
        DisburseRequest,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Submissions", description = "Book incentive submissions"),
        (name = "Workflow", description = "Approval workflow actions"),
        (name = "Reviewers", description = "Reviewer invitations"),
        (name = "Notifications", description = "Notification outbox"),
        (name = "Health", description = "Service health")
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearerAuth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
