mod common;

use std::sync::Arc;

use insentif_buku::models::submission::Status;
use insentif_buku::store;
use insentif_buku::workflow::ApprovalWorkflow;

#[tokio::test]
async fn failing_dispatcher_does_not_revert_the_transition() -> anyhow::Result<()> {
    let (pool, _dir) = common::setup_pool().await?;

    let owner_id = common::seed_user(&pool, "Dr. Rina", "Dosen").await?;
    let staff_id = common::seed_user(&pool, "Staf LPPM", "Lppm Staff").await?;
    let chief_id = common::seed_user(&pool, "Ketua LPPM", "Lppm Ketua").await?;

    let verified = common::verified_submission(&pool, owner_id, staff_id).await?;
    let chief = common::principal_for(&pool, chief_id).await?;

    let wf = ApprovalWorkflow::new(pool.clone(), Arc::new(common::FailingNotifier));
    let approved = wf.approve(verified.id, &chief, 5_000_000).await?;
    assert_eq!(approved.status, Status::ApprovedChief);

    // the commit stuck even though dispatch failed
    let persisted = store::get_from_pool(&pool, verified.id).await?;
    assert_eq!(persisted.status, Status::ApprovedChief);
    assert_eq!(persisted.approved_amount, Some(5_000_000));

    Ok(())
}

#[tokio::test]
async fn approve_and_disburse_write_to_the_owner_outbox() -> anyhow::Result<()> {
    let (pool, _dir) = common::setup_pool().await?;

    let owner_id = common::seed_user(&pool, "Dr. Rina", "Dosen").await?;
    let staff_id = common::seed_user(&pool, "Staf LPPM", "Lppm Staff").await?;
    let chief_id = common::seed_user(&pool, "Ketua LPPM", "Lppm Ketua").await?;
    let hrd_id = common::seed_user(&pool, "Staf HRD", "Hrd").await?;

    let wf = common::workflow(&pool);
    let verified = common::verified_submission(&pool, owner_id, staff_id).await?;
    let chief = common::principal_for(&pool, chief_id).await?;
    let hrd = common::principal_for(&pool, hrd_id).await?;

    wf.approve(verified.id, &chief, 5_000_000).await?;
    wf.disburse(verified.id, &hrd, "2024-06-01").await?;

    let inbox = store::list_notifications(&pool, owner_id).await?;
    let mut kinds: Vec<&str> = inbox.iter().map(|n| n.kind.as_str()).collect();
    kinds.sort();
    assert_eq!(kinds, vec!["incentive_disbursed", "submission_approved"]);

    let approved = inbox
        .iter()
        .find(|n| n.kind == "submission_approved")
        .unwrap();
    assert_eq!(approved.user_id, owner_id);
    assert_eq!(approved.payload["approved_amount"], 5_000_000);

    // intermediate transitions stay silent
    let staff_inbox = store::list_notifications(&pool, staff_id).await?;
    assert!(staff_inbox.is_empty());

    Ok(())
}

#[tokio::test]
async fn verify_sends_no_notification() -> anyhow::Result<()> {
    let (pool, _dir) = common::setup_pool().await?;

    let owner_id = common::seed_user(&pool, "Dr. Rina", "Dosen").await?;
    let staff_id = common::seed_user(&pool, "Staf LPPM", "Lppm Staff").await?;

    common::verified_submission(&pool, owner_id, staff_id).await?;

    let inbox = store::list_notifications(&pool, owner_id).await?;
    assert!(inbox.is_empty());

    Ok(())
}
