#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tempfile::TempDir;
use uuid::Uuid;

use insentif_buku::authz::{self, Principal};
use insentif_buku::db::MIGRATOR;
use insentif_buku::models::submission::{
    BookType, PublisherLevel, Submission, SubmissionCreateRequest,
};
use insentif_buku::notify::{DbNotifier, NotificationKind, Notifier};
use insentif_buku::store;
use insentif_buku::workflow::ApprovalWorkflow;

/// Fresh migrated database in a temp dir; keep the `TempDir` alive for the
/// duration of the test.
pub async fn setup_pool() -> anyhow::Result<(SqlitePool, TempDir)> {
    let dir = tempfile::tempdir()?;
    let db_path = dir.path().join("test.sqlite");
    std::fs::File::create(&db_path)?;

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&format!("sqlite://{}", db_path.display()))
        .await?;

    MIGRATOR.run(&pool).await?;

    Ok((pool, dir))
}

/// Insert a user with a role-assignment row (comma-joined roles).
pub async fn seed_user(pool: &SqlitePool, name: &str, roles: &str) -> anyhow::Result<Uuid> {
    seed_user_full(pool, name, None, Some(roles)).await
}

/// Insert a user with an optional legacy `users.role` value and an
/// optional role-assignment row.
pub async fn seed_user_full(
    pool: &SqlitePool,
    name: &str,
    legacy_role: Option<&str>,
    assigned_roles: Option<&str>,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO users (id, name, email, role, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(name)
    .bind(format!("{}@kampus.test", id.simple()))
    .bind(legacy_role)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    if let Some(roles) = assigned_roles {
        sqlx::query(
            "INSERT INTO role_assignments (user_id, roles, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(roles)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;
    }

    Ok(id)
}

pub async fn principal_for(pool: &SqlitePool, user_id: Uuid) -> anyhow::Result<Principal> {
    Ok(authz::load_principal(pool, user_id).await?)
}

pub fn draft_request() -> SubmissionCreateRequest {
    SubmissionCreateRequest {
        title: "Pengantar Sistem Terdistribusi".to_string(),
        isbn: "978-602-0000-00-0".to_string(),
        publication_year: 2024,
        publisher: "Penerbit Kampus".to_string(),
        publisher_level: PublisherLevel::NationalAccredited,
        book_type: BookType::Reference,
        total_pages: 312,
        external_link: None,
        document_path: Some("uploads/buku/contoh.pdf".to_string()),
    }
}

pub async fn create_draft(pool: &SqlitePool, owner_id: Uuid) -> anyhow::Result<Submission> {
    Ok(store::create(pool, owner_id, draft_request()).await?)
}

pub fn workflow(pool: &SqlitePool) -> ApprovalWorkflow {
    ApprovalWorkflow::new(pool.clone(), Arc::new(DbNotifier::new(pool.clone())))
}

/// Notifier that always fails; transitions must still commit.
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(
        &self,
        _user_id: Uuid,
        _kind: NotificationKind,
        _payload: Value,
    ) -> anyhow::Result<()> {
        anyhow::bail!("mail relay unreachable")
    }
}

/// A submission moved to VERIFIED_STAFF, ready for the chief.
pub async fn verified_submission(
    pool: &SqlitePool,
    owner_id: Uuid,
    staff_id: Uuid,
) -> anyhow::Result<Submission> {
    let wf = workflow(pool);
    let draft = create_draft(pool, owner_id).await?;
    let owner = principal_for(pool, owner_id).await?;
    let staff = principal_for(pool, staff_id).await?;

    wf.submit(draft.id, &owner).await?;
    Ok(wf.verify(draft.id, &staff).await?)
}
