//! Append-only audit trail for submissions.
//!
//! `append` runs inside the workflow transaction; if the insert fails the
//! whole transition rolls back, so a committed transition always has its
//! entry and a failed one never does. Entries are hash-chained: each hash
//! is SHA-256 over the previous hash and the entry's canonical payload.

use chrono::Utc;
use sha2::{Digest, Sha256};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::audit::{AuditAction, AuditLogEntry, DbAuditLogEntry};

fn entry_hash(
    prev_hash: Option<&str>,
    submission_id: &str,
    actor_id: &str,
    action: &str,
    note: Option<&str>,
    created_at: &str,
) -> String {
    let mut hasher = Sha256::new();
    if let Some(prev) = prev_hash {
        hasher.update(prev.as_bytes());
    }
    hasher.update(submission_id.as_bytes());
    hasher.update(actor_id.as_bytes());
    hasher.update(action.as_bytes());
    if let Some(note) = note {
        hasher.update(note.as_bytes());
    }
    hasher.update(created_at.as_bytes());
    hex::encode(hasher.finalize())
}

/// Append one entry. Must be called on the transaction connection of the
/// transition being recorded.
pub async fn append(
    conn: &mut SqliteConnection,
    submission_id: Uuid,
    actor_id: Uuid,
    action: AuditAction,
    note: Option<&str>,
) -> Result<(), AppError> {
    let id = Uuid::new_v4();
    let created_at = Utc::now();
    let created_at_str = created_at.to_rfc3339();

    let prev_hash: Option<String> = sqlx::query_scalar(
        "SELECT hash FROM audit_log ORDER BY created_at DESC, id DESC LIMIT 1",
    )
    .fetch_optional(&mut *conn)
    .await?;

    let submission = submission_id.to_string();
    let actor = actor_id.to_string();
    let hash = entry_hash(
        prev_hash.as_deref(),
        &submission,
        &actor,
        action.as_str(),
        note,
        &created_at_str,
    );

    sqlx::query(
        "INSERT INTO audit_log (id, submission_id, actor_id, action, note, prev_hash, hash, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(&submission)
    .bind(&actor)
    .bind(action.as_str())
    .bind(note)
    .bind(&prev_hash)
    .bind(&hash)
    .bind(created_at)
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn list_for_submission(
    pool: &SqlitePool,
    submission_id: Uuid,
) -> Result<Vec<AuditLogEntry>, AppError> {
    let rows = sqlx::query_as::<_, DbAuditLogEntry>(
        "SELECT id, submission_id, actor_id, action, note, prev_hash, hash, created_at \
         FROM audit_log WHERE submission_id = ? ORDER BY created_at ASC, id ASC",
    )
    .bind(submission_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(AuditLogEntry::try_from).collect()
}

/// Recompute the global chain and report whether every link still matches.
pub async fn verify_chain(pool: &SqlitePool) -> Result<bool, AppError> {
    let rows = sqlx::query_as::<_, DbAuditLogEntry>(
        "SELECT id, submission_id, actor_id, action, note, prev_hash, hash, created_at \
         FROM audit_log ORDER BY created_at ASC, id ASC",
    )
    .fetch_all(pool)
    .await?;

    let mut prev: Option<String> = None;
    for row in rows {
        if row.prev_hash != prev {
            return Ok(false);
        }
        let expected = entry_hash(
            prev.as_deref(),
            &row.submission_id,
            &row.actor_id,
            &row.action,
            row.note.as_deref(),
            &row.created_at.to_rfc3339(),
        );
        if expected != row.hash {
            return Ok(false);
        }
        prev = Some(row.hash);
    }

    Ok(true)
}
