use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorRole {
    First,
    Member,
    Corresponding,
}

impl AuthorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorRole::First => "FIRST",
            AuthorRole::Member => "MEMBER",
            AuthorRole::Corresponding => "CORRESPONDING",
        }
    }

    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value {
            "FIRST" => Ok(AuthorRole::First),
            "MEMBER" => Ok(AuthorRole::Member),
            "CORRESPONDING" => Ok(AuthorRole::Corresponding),
            other => Err(AppError::internal(format!("unknown author role '{other}'"))),
        }
    }
}

/// A listed author of a submitted book; may or may not correspond to a
/// registered user.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Author {
    pub id: Uuid,
    pub submission_id: Uuid,
    pub name: String,
    pub author_role: AuthorRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbAuthor {
    pub id: String,
    pub submission_id: String,
    pub name: String,
    pub author_role: String,
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbAuthor> for Author {
    type Error = AppError;

    fn try_from(db: DbAuthor) -> Result<Self, Self::Error> {
        Ok(Author {
            id: Uuid::parse_str(&db.id)
                .map_err(|_| AppError::internal(format!("invalid author id '{}'", db.id)))?,
            submission_id: Uuid::parse_str(&db.submission_id).map_err(|_| {
                AppError::internal(format!("invalid submission id '{}'", db.submission_id))
            })?,
            name: db.name,
            author_role: AuthorRole::parse(&db.author_role)?,
            user_id: db
                .user_id
                .as_deref()
                .map(Uuid::parse_str)
                .transpose()
                .map_err(|_| AppError::internal("invalid author user id"))?,
            created_at: db.created_at,
        })
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AuthorCreateRequest {
    pub name: String,
    pub author_role: AuthorRole,
    pub user_id: Option<Uuid>,
}
