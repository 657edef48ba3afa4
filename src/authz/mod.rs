//! Access control: resolves a principal's effective role set and gates
//! workflow actions on it.
//!
//! Role storage is loose by history: the authoritative store is a
//! `role_assignments` row holding a comma-joined token string, and older
//! accounts may still carry a single role in the legacy `users.role`
//! column. Both are unioned here, once, and every other component checks
//! roles only through [`Principal`].

use std::collections::HashSet;

use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::errors::AppError;

pub mod principal;
pub use principal::Principal;

pub mod roles {
    pub const DOSEN: &str = "Dosen";
    pub const LPPM_STAFF: &str = "Lppm Staff";
    pub const LPPM_KETUA: &str = "Lppm Ketua";
    pub const HRD: &str = "Hrd";

    /// Roles allowed to see the back-office submission queues.
    pub const BACK_OFFICE: &[&str] = &[LPPM_STAFF, LPPM_KETUA, HRD];
}

/// Normalize a comma-joined role string into a set of trimmed tokens.
/// Tokens are case-sensitive; empties are dropped, duplicates collapse.
pub fn parse_role_list(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(String::from)
        .collect()
}

/// Load a principal with their resolved role set.
///
/// This is the single place role storage is read; the assignment row is
/// authoritative and the legacy column is an additive fallback.
pub async fn load_principal(pool: &SqlitePool, user_id: Uuid) -> Result<Principal, AppError> {
    let user_row = sqlx::query("SELECT name, role FROM users WHERE id = ?")
        .bind(user_id.to_string())
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::unauthorized(format!("unknown user {user_id}")))?;

    let name: String = user_row.get("name");
    let legacy_role: Option<String> = user_row.get("role");

    let assigned: Option<String> =
        sqlx::query_scalar("SELECT roles FROM role_assignments WHERE user_id = ?")
            .bind(user_id.to_string())
            .fetch_optional(pool)
            .await?;

    let mut roles = assigned.as_deref().map(parse_role_list).unwrap_or_default();
    if let Some(legacy) = legacy_role.as_deref() {
        roles.extend(parse_role_list(legacy));
    }

    Ok(Principal::new(user_id).with_name(name).with_roles(roles))
}

/// Precondition guard used before every role-gated workflow action.
/// Failing it is an error, never a silent no-op.
pub fn ensure_any_role(principal: &Principal, required: &[&str]) -> Result<(), AppError> {
    if principal.has_any_role(required) {
        return Ok(());
    }
    tracing::debug!(
        user_id = %principal.user_id,
        required = ?required,
        "role check denied"
    );
    Err(AppError::forbidden(format!(
        "requires one of: {}",
        required.join(", ")
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_and_dedupes() {
        let roles = parse_role_list(" Dosen , Lppm Staff ,Dosen,, ");
        assert_eq!(roles.len(), 2);
        assert!(roles.contains("Dosen"));
        assert!(roles.contains("Lppm Staff"));
    }

    #[test]
    fn parse_is_case_sensitive() {
        let roles = parse_role_list("lppm staff");
        assert!(!roles.contains("Lppm Staff"));
        assert!(roles.contains("lppm staff"));
    }

    #[test]
    fn parse_empty_string_yields_empty_set() {
        assert!(parse_role_list("").is_empty());
        assert!(parse_role_list("  , ,").is_empty());
    }

    #[test]
    fn ensure_any_role_checks_intersection() {
        let principal = Principal::new(uuid::Uuid::new_v4())
            .with_roles(vec!["Dosen".to_string(), "Lppm Staff".to_string()]);

        assert!(ensure_any_role(&principal, &[roles::LPPM_STAFF, roles::LPPM_KETUA]).is_ok());
        assert!(matches!(
            ensure_any_role(&principal, &[roles::HRD]),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn never_matches_raw_substrings() {
        // "Lppm Staff Assistant" must not satisfy a check for "Lppm Staff".
        let principal =
            Principal::new(uuid::Uuid::new_v4()).with_roles(vec!["Lppm Staff Assistant".to_string()]);
        assert!(!principal.has_any_role(&[roles::LPPM_STAFF]));
    }
}
