//! Best-effort notification dispatch.
//!
//! Dispatch runs strictly after the workflow transaction has committed, on
//! its own connection, so a slow or failing channel can never hold a lock
//! or roll back a transition. Errors are logged and swallowed.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::SqlitePool;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    SubmissionApproved,
    IncentiveDisbursed,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::SubmissionApproved => "submission_approved",
            NotificationKind::IncentiveDisbursed => "incentive_disbursed",
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        user_id: Uuid,
        kind: NotificationKind,
        payload: Value,
    ) -> anyhow::Result<()>;
}

/// Production notifier: appends to the notifications outbox table. A
/// delivery channel (mail, in-app) drains the outbox separately.
pub struct DbNotifier {
    pool: SqlitePool,
}

impl DbNotifier {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Notifier for DbNotifier {
    async fn notify(
        &self,
        user_id: Uuid,
        kind: NotificationKind,
        payload: Value,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO notifications (id, user_id, kind, payload, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id.to_string())
        .bind(kind.as_str())
        .bind(payload.to_string())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
