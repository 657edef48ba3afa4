use std::sync::Arc;

use axum::http::Method;
use axum::routing::{get, post, put};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::errors::AppError;
use crate::jwt::JwtConfig;
use crate::notify::{DbNotifier, Notifier};
use crate::routes::{health, submissions};
use crate::workflow::ApprovalWorkflow;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt: Arc<JwtConfig>,
    pub workflow: ApprovalWorkflow,
}

impl AppState {
    pub fn new(pool: SqlitePool, jwt: JwtConfig, notifier: Arc<dyn Notifier>) -> Self {
        let workflow = ApprovalWorkflow::new(pool.clone(), notifier);
        Self {
            pool,
            jwt: Arc::new(jwt),
            workflow,
        }
    }
}

pub async fn create_app(pool: SqlitePool) -> Result<Router, AppError> {
    let jwt_config = JwtConfig::from_env()?;
    let notifier = Arc::new(DbNotifier::new(pool.clone()));
    let state = AppState::new(pool, jwt_config, notifier);

    Ok(build_router(state))
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    let submission_routes = Router::new()
        .route("/", get(submissions::list_submissions))
        .route("/", post(submissions::create_submission))
        .route("/mine", get(submissions::list_own_submissions))
        .route("/:id", get(submissions::get_submission))
        .route("/:id", put(submissions::update_submission))
        // workflow actions
        .route("/:id/submit", post(submissions::submit))
        .route("/:id/verify", post(submissions::verify))
        .route("/:id/reject", post(submissions::reject_staff))
        .route("/:id/resubmit", post(submissions::resubmit))
        .route("/:id/approve", post(submissions::approve))
        .route("/:id/reject-final", post(submissions::reject_chief))
        .route("/:id/disburse", post(submissions::disburse))
        // related records
        .route("/:id/authors", get(submissions::list_authors).post(submissions::add_author))
        .route(
            "/:id/reviewers",
            get(submissions::list_reviewer_invites).post(submissions::invite_reviewer),
        )
        .route("/:id/log", get(submissions::list_audit_log));

    Router::new()
        .route("/health", get(health::health))
        .nest("/submissions", submission_routes)
        .route("/reviewers/:invite_id/respond", post(submissions::respond_reviewer))
        .route("/notifications", get(submissions::list_notifications))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
