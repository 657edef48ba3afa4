use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;

/// A row in the notifications outbox. Rows are written best-effort after a
/// workflow transition commits; a delivery channel drains them separately.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    #[schema(value_type = Object)]
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbNotification {
    pub id: String,
    pub user_id: String,
    pub kind: String,
    pub payload: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbNotification> for Notification {
    type Error = AppError;

    fn try_from(db: DbNotification) -> Result<Self, Self::Error> {
        Ok(Notification {
            id: Uuid::parse_str(&db.id)
                .map_err(|_| AppError::internal(format!("invalid notification id '{}'", db.id)))?,
            user_id: Uuid::parse_str(&db.user_id)
                .map_err(|_| AppError::internal(format!("invalid user id '{}'", db.user_id)))?,
            kind: db.kind,
            payload: serde_json::from_str(&db.payload)
                .map_err(|_| AppError::internal("invalid notification payload"))?,
            created_at: db.created_at,
        })
    }
}
