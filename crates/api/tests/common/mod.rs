//! Shared helpers for API integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tasklane_core::types::DbId;
use tower::ServiceExt;

use tasklane_api::auth::jwt::{generate_access_token, JwtConfig};
use tasklane_api::config::ServerConfig;
use tasklane_api::router::build_app_router;
use tasklane_api::state::AppState;

const TEST_JWT_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: TEST_JWT_SECRET.to_string(),
        access_token_expiry_mins: 15,
    }
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        database_url: String::new(),
        db_max_connections: 5,
        jwt: test_jwt_config(),
    }
}

/// Build the application router over the given pool, with the production
/// middleware stack.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

/// A valid access token for `user_id`.
pub fn token(user_id: DbId) -> String {
    generate_access_token(user_id, &test_jwt_config()).unwrap()
}

/// Unauthenticated GET.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

/// GET with a Bearer token for `user_id`.
pub async fn get_as(app: Router, uri: &str, user_id: DbId) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {}", token(user_id)))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Parse an NDJSON body into one value per line.
pub async fn body_ndjson(response: Response<Body>) -> Vec<serde_json::Value> {
    let bytes = body_bytes(response).await;
    String::from_utf8(bytes)
        .unwrap()
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

/// A member user with workspace `acme` and project `PROJ`.
pub struct Fixture {
    pub user_id: DbId,
    pub workspace_id: DbId,
    pub project_id: DbId,
}

impl Fixture {
    pub fn project_path(&self) -> String {
        format!(
            "/api/v1/workspaces/{}/projects/{}/issues/search",
            self.workspace_id, self.project_id
        )
    }
}

pub async fn insert_user(pool: &PgPool, email: &str) -> DbId {
    sqlx::query_scalar("INSERT INTO users (email) VALUES ($1) RETURNING id")
        .bind(email)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn seed_fixture(pool: &PgPool) -> Fixture {
    let user_id = insert_user(pool, "owner@example.com").await;
    let workspace_id: DbId = sqlx::query_scalar(
        "INSERT INTO workspaces (slug, name, owner_id) VALUES ('acme', 'Acme', $1) RETURNING id",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
    .unwrap();
    let project_id: DbId = sqlx::query_scalar(
        "INSERT INTO projects (workspace_id, identifier, name) \
         VALUES ($1, 'PROJ', 'Project') RETURNING id",
    )
    .bind(workspace_id)
    .fetch_one(pool)
    .await
    .unwrap();
    sqlx::query("INSERT INTO workspace_members (workspace_id, member_id) VALUES ($1, $2)")
        .bind(workspace_id)
        .bind(user_id)
        .execute(pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO project_members (project_id, member_id) VALUES ($1, $2)")
        .bind(project_id)
        .bind(user_id)
        .execute(pool)
        .await
        .unwrap();
    Fixture {
        user_id,
        workspace_id,
        project_id,
    }
}

pub async fn insert_issue(
    pool: &PgPool,
    fx: &Fixture,
    sequence_id: i32,
    name: &str,
    priority: Option<&str>,
) -> DbId {
    sqlx::query_scalar(
        "INSERT INTO issues (workspace_id, project_id, sequence_id, name, priority, created_by_id) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
    )
    .bind(fx.workspace_id)
    .bind(fx.project_id)
    .bind(sequence_id)
    .bind(name)
    .bind(priority)
    .bind(fx.user_id)
    .fetch_one(pool)
    .await
    .unwrap()
}
