mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::util::ServiceExt;
use uuid::Uuid;

use insentif_buku::jwt::JwtConfig;
use insentif_buku::notify::DbNotifier;
use insentif_buku::{build_router, AppState};

fn test_state(pool: sqlx::SqlitePool) -> AppState {
    let jwt = JwtConfig {
        secret: Arc::new(b"test-secret".to_vec()),
        exp_hours: 24,
    };
    AppState::new(pool.clone(), jwt, Arc::new(DbNotifier::new(pool)))
}

async fn body_json(response: axum::response::Response) -> anyhow::Result<Value> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn bearer(state: &AppState, user_id: Uuid) -> String {
    format!("Bearer {}", state.jwt.encode(user_id).unwrap())
}

#[tokio::test]
async fn health_answers_without_auth() -> anyhow::Result<()> {
    let (pool, _dir) = common::setup_pool().await?;
    let app = build_router(test_state(pool));

    let response = app
        .oneshot(Request::get("/health").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await?;
    assert_eq!(body["status"], "ok");

    Ok(())
}

#[tokio::test]
async fn missing_token_is_unauthorized() -> anyhow::Result<()> {
    let (pool, _dir) = common::setup_pool().await?;
    let app = build_router(test_state(pool));

    let response = app
        .oneshot(Request::get("/submissions/mine").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn workflow_over_http_with_role_gating() -> anyhow::Result<()> {
    let (pool, _dir) = common::setup_pool().await?;

    let owner_id = common::seed_user(&pool, "Dr. Rina", "Dosen").await?;
    let staff_id = common::seed_user(&pool, "Staf LPPM", "Lppm Staff").await?;
    let chief_id = common::seed_user(&pool, "Ketua LPPM", "Lppm Ketua").await?;
    let hrd_id = common::seed_user(&pool, "Staf HRD", "Hrd").await?;

    let state = test_state(pool);
    let app = build_router(state.clone());

    // owner creates a draft
    let create = Request::post("/submissions")
        .header(header::AUTHORIZATION, bearer(&state, owner_id))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({
                "title": "Pengantar Sistem Terdistribusi",
                "isbn": "978-602-0000-00-0",
                "publication_year": 2024,
                "publisher": "Penerbit Kampus",
                "publisher_level": "NATIONAL_ACCREDITED",
                "book_type": "REFERENCE",
                "total_pages": 312
            })
            .to_string(),
        ))?;
    let response = app.clone().oneshot(create).await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await?;
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["status"], "DRAFT");

    // owner submits
    let response = app
        .clone()
        .oneshot(
            Request::post(format!("/submissions/{id}/submit"))
                .header(header::AUTHORIZATION, bearer(&state, owner_id))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    // the owner cannot verify their own submission
    let response = app
        .clone()
        .oneshot(
            Request::post(format!("/submissions/{id}/verify"))
                .header(header::AUTHORIZATION, bearer(&state, owner_id))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // staff verifies, chief approves, HRD disburses
    let response = app
        .clone()
        .oneshot(
            Request::post(format!("/submissions/{id}/verify"))
                .header(header::AUTHORIZATION, bearer(&state, staff_id))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::post(format!("/submissions/{id}/approve"))
                .header(header::AUTHORIZATION, bearer(&state, chief_id))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "amount": 5_000_000 }).to_string()))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let approved = body_json(response).await?;
    assert_eq!(approved["status"], "APPROVED_CHIEF");
    assert_eq!(approved["approved_amount"], 5_000_000);

    let response = app
        .clone()
        .oneshot(
            Request::post(format!("/submissions/{id}/disburse"))
                .header(header::AUTHORIZATION, bearer(&state, hrd_id))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "payment_date": "2024-06-01" }).to_string()))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let paid = body_json(response).await?;
    assert_eq!(paid["status"], "PAID");
    assert_eq!(paid["payment_date"], "2024-06-01");

    // a repeated disburse surfaces as unprocessable, naming the status
    let response = app
        .clone()
        .oneshot(
            Request::post(format!("/submissions/{id}/disburse"))
                .header(header::AUTHORIZATION, bearer(&state, hrd_id))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "payment_date": "2024-06-02" }).to_string()))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let error = body_json(response).await?;
    assert_eq!(error["error"], "invalid_transition");
    assert!(error["message"].as_str().unwrap().contains("PAID"));

    // the audit trail is visible to the owner
    let response = app
        .clone()
        .oneshot(
            Request::get(format!("/submissions/{id}/log"))
                .header(header::AUTHORIZATION, bearer(&state, owner_id))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let log = body_json(response).await?;
    let actions: Vec<&str> = log
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["action"].as_str().unwrap())
        .collect();
    assert_eq!(actions, vec!["SUBMITTED", "VERIFIED", "APPROVED", "PAYMENT_DISBURSED"]);

    // but not to an unrelated academic
    let other_id = common::seed_user(&state.pool, "Dr. Budi", "Dosen").await?;
    let response = app
        .clone()
        .oneshot(
            Request::get(format!("/submissions/{id}/log"))
                .header(header::AUTHORIZATION, bearer(&state, other_id))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn back_office_listing_requires_a_back_office_role() -> anyhow::Result<()> {
    let (pool, _dir) = common::setup_pool().await?;

    let owner_id = common::seed_user(&pool, "Dr. Rina", "Dosen").await?;
    let staff_id = common::seed_user(&pool, "Staf LPPM", "Lppm Staff").await?;

    let wf = common::workflow(&pool);
    let draft = common::create_draft(&pool, owner_id).await?;
    let owner = common::principal_for(&pool, owner_id).await?;
    wf.submit(draft.id, &owner).await?;

    let state = test_state(pool);
    let app = build_router(state.clone());

    let response = app
        .clone()
        .oneshot(
            Request::get("/submissions?status=SUBMITTED")
                .header(header::AUTHORIZATION, bearer(&state, staff_id))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let listed = body_json(response).await?;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    // a plain academic is turned away from the queue
    let response = app
        .clone()
        .oneshot(
            Request::get("/submissions")
                .header(header::AUTHORIZATION, bearer(&state, owner_id))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // garbage filter values are a client error
    let response = app
        .oneshot(
            Request::get("/submissions?status=NOT_A_STATUS")
                .header(header::AUTHORIZATION, bearer(&state, staff_id))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    Ok(())
}
