mod common;

use insentif_buku::models::author::{AuthorCreateRequest, AuthorRole};
use insentif_buku::models::reviewer::{InviteStatus, ReviewerInviteRequest};
use insentif_buku::models::submission::{Status, SubmissionUpdateRequest};
use insentif_buku::store;

#[tokio::test]
async fn create_assigns_id_and_draft_status() -> anyhow::Result<()> {
    let (pool, _dir) = common::setup_pool().await?;
    let owner_id = common::seed_user(&pool, "Dr. Rina", "Dosen").await?;

    let submission = common::create_draft(&pool, owner_id).await?;
    assert_eq!(submission.status, Status::Draft);
    assert!(submission.approved_amount.is_none());
    assert!(submission.submitted_at.is_none());

    let reloaded = store::get_from_pool(&pool, submission.id).await?;
    assert_eq!(reloaded.id, submission.id);
    assert_eq!(reloaded.title, "Pengantar Sistem Terdistribusi");

    Ok(())
}

#[tokio::test]
async fn list_by_status_orders_newest_submissions_first() -> anyhow::Result<()> {
    let (pool, _dir) = common::setup_pool().await?;
    let owner_id = common::seed_user(&pool, "Dr. Rina", "Dosen").await?;
    let owner = common::principal_for(&pool, owner_id).await?;
    let wf = common::workflow(&pool);

    let first = common::create_draft(&pool, owner_id).await?;
    let second = common::create_draft(&pool, owner_id).await?;
    wf.submit(first.id, &owner).await?;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    wf.submit(second.id, &owner).await?;

    let listed = store::list_by_status(&pool, &[Status::Submitted]).await?;
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, second.id);
    assert_eq!(listed[1].id, first.id);

    // filter excludes drafts
    let third = common::create_draft(&pool, owner_id).await?;
    let listed = store::list_by_status(&pool, &[Status::Submitted]).await?;
    assert!(listed.iter().all(|s| s.id != third.id));

    Ok(())
}

#[tokio::test]
async fn owner_edits_are_limited_to_draft_and_revision() -> anyhow::Result<()> {
    let (pool, _dir) = common::setup_pool().await?;
    let owner_id = common::seed_user(&pool, "Dr. Rina", "Dosen").await?;
    let other_id = common::seed_user(&pool, "Dr. Budi", "Dosen").await?;
    let owner = common::principal_for(&pool, owner_id).await?;
    let wf = common::workflow(&pool);

    let draft = common::create_draft(&pool, owner_id).await?;

    let patch = SubmissionUpdateRequest {
        title: Some("Edisi Revisi".to_string()),
        ..Default::default()
    };
    let updated = store::update_draft_fields(&pool, draft.id, owner_id, patch.clone()).await?;
    assert_eq!(updated.title, "Edisi Revisi");
    // untouched fields survive
    assert_eq!(updated.isbn, draft.isbn);

    // not the owner
    let err = store::update_draft_fields(&pool, draft.id, other_id, patch.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, insentif_buku::errors::AppError::Forbidden(_)));

    // locked once submitted
    wf.submit(draft.id, &owner).await?;
    let err = store::update_draft_fields(&pool, draft.id, owner_id, patch)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        insentif_buku::errors::AppError::InvalidTransition { .. }
    ));

    Ok(())
}

#[tokio::test]
async fn authors_belong_to_their_submission() -> anyhow::Result<()> {
    let (pool, _dir) = common::setup_pool().await?;
    let owner_id = common::seed_user(&pool, "Dr. Rina", "Dosen").await?;
    let draft = common::create_draft(&pool, owner_id).await?;

    store::add_author(
        &pool,
        draft.id,
        AuthorCreateRequest {
            name: "Rina Kusuma".to_string(),
            author_role: AuthorRole::First,
            user_id: Some(owner_id),
        },
    )
    .await?;
    store::add_author(
        &pool,
        draft.id,
        AuthorCreateRequest {
            name: "Budi Santoso".to_string(),
            author_role: AuthorRole::Member,
            user_id: None,
        },
    )
    .await?;

    let authors = store::list_authors(&pool, draft.id).await?;
    assert_eq!(authors.len(), 2);
    assert_eq!(authors[0].author_role, AuthorRole::First);
    assert_eq!(authors[0].user_id, Some(owner_id));
    assert!(authors[1].user_id.is_none());

    Ok(())
}

#[tokio::test]
async fn reviewer_invites_answer_once_and_never_gate_the_workflow() -> anyhow::Result<()> {
    let (pool, _dir) = common::setup_pool().await?;
    let owner_id = common::seed_user(&pool, "Dr. Rina", "Dosen").await?;
    let staff_id = common::seed_user(&pool, "Staf LPPM", "Lppm Staff").await?;
    let draft = common::create_draft(&pool, owner_id).await?;

    let invite = store::add_reviewer_invite(
        &pool,
        draft.id,
        ReviewerInviteRequest {
            reviewer_name: "Prof. Sari".to_string(),
            reviewer_email: "sari@kampus.test".to_string(),
        },
    )
    .await?;
    assert_eq!(invite.status, InviteStatus::Pending);

    let answered = store::respond_reviewer_invite(&pool, invite.id, InviteStatus::Accepted).await?;
    assert_eq!(answered.status, InviteStatus::Accepted);
    assert!(answered.responded_at.is_some());

    // an invite answers once
    let err = store::respond_reviewer_invite(&pool, invite.id, InviteStatus::Rejected)
        .await
        .unwrap_err();
    assert!(matches!(err, insentif_buku::errors::AppError::Conflict(_)));

    // PENDING is not a response
    let invite2 = store::add_reviewer_invite(
        &pool,
        draft.id,
        ReviewerInviteRequest {
            reviewer_name: "Prof. Andi".to_string(),
            reviewer_email: "andi@kampus.test".to_string(),
        },
    )
    .await?;
    let err = store::respond_reviewer_invite(&pool, invite2.id, InviteStatus::Pending)
        .await
        .unwrap_err();
    assert!(matches!(err, insentif_buku::errors::AppError::BadRequest(_)));

    // workflow proceeds regardless of open invites
    let wf = common::workflow(&pool);
    let owner = common::principal_for(&pool, owner_id).await?;
    let staff = common::principal_for(&pool, staff_id).await?;
    wf.submit(draft.id, &owner).await?;
    let verified = wf.verify(draft.id, &staff).await?;
    assert_eq!(verified.status, Status::VerifiedStaff);

    Ok(())
}
