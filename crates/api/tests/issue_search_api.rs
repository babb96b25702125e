//! HTTP-level tests for the issue search endpoints.

mod common;

use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use common::{body_json, body_ndjson, get, get_as, insert_issue, insert_user, seed_fixture};
use serde_json::json;
use sqlx::PgPool;

const GLOBAL: &str = "/api/v1/issues/search";

// ---------------------------------------------------------------------------
// Authentication and validation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_token_is_unauthorized(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, GLOBAL).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn garbage_token_is_unauthorized(pool: PgPool) {
    let app = common::build_test_app(pool);
    let request = axum::http::Request::builder()
        .uri(GLOBAL)
        .header("authorization", "Bearer not-a-jwt")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(app, request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn limit_above_maximum_is_rejected(pool: PgPool) {
    let fx = seed_fixture(&pool).await;
    let app = common::build_test_app(pool);
    let response = get_as(app, &format!("{GLOBAL}?limit=101"), fx.user_id).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_group_key_is_rejected(pool: PgPool) {
    let fx = seed_fixture(&pool).await;
    let app = common::build_test_app(pool);
    let response = get_as(app, &format!("{GLOBAL}?group_by=sequence_id"), fx.user_id).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn malformed_id_list_is_rejected(pool: PgPool) {
    let fx = seed_fixture(&pool).await;
    let app = common::build_test_app(pool);
    let response = get_as(app, &format!("{GLOBAL}?labels=1,two"), fx.user_id).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("two"));
}

// ---------------------------------------------------------------------------
// Project scope
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_project_is_not_found(pool: PgPool) {
    let fx = seed_fixture(&pool).await;
    let app = common::build_test_app(pool);
    let uri = format!(
        "/api/v1/workspaces/{}/projects/999999/issues/search",
        fx.workspace_id
    );
    let response = get_as(app, &uri, fx.user_id).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn non_member_is_forbidden(pool: PgPool) {
    let fx = seed_fixture(&pool).await;
    let outsider = insert_user(&pool, "outsider@example.com").await;
    let app = common::build_test_app(pool);
    let response = get_as(app, &fx.project_path(), outsider).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "FORBIDDEN");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn non_member_global_search_sees_nothing(pool: PgPool) {
    let fx = seed_fixture(&pool).await;
    insert_issue(&pool, &fx, 1, "Private", None).await;
    let outsider = insert_user(&pool, "outsider@example.com").await;
    let app = common::build_test_app(pool);
    let response = get_as(app, GLOBAL, outsider).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["pagination_meta"]["count"], 0);
    assert_eq!(json["data"]["issues"].as_array().unwrap().len(), 0);
}

// ---------------------------------------------------------------------------
// Result shapes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn only_count_returns_count_envelope(pool: PgPool) {
    let fx = seed_fixture(&pool).await;
    for n in 1..=3 {
        insert_issue(&pool, &fx, n, &format!("Issue {n}"), None).await;
    }
    let app = common::build_test_app(pool);
    let uri = format!("{}?only_count=true", fx.project_path());
    let response = get_as(app, &uri, fx.user_id).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"], json!({ "count": 3 }));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn flat_page_reports_total_and_window(pool: PgPool) {
    let fx = seed_fixture(&pool).await;
    for n in 1..=5 {
        insert_issue(&pool, &fx, n, &format!("Issue {n}"), None).await;
    }
    let app = common::build_test_app(pool);
    let uri = format!("{}?limit=2&offset=2", fx.project_path());
    let response = get_as(app, &uri, fx.user_id).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let meta = &json["data"]["pagination_meta"];
    assert_eq!(meta["count"], 5);
    assert_eq!(meta["limit"], 2);
    assert_eq!(meta["offset"], 2);

    let sequences: Vec<i64> = json["data"]["issues"]
        .as_array()
        .unwrap()
        .iter()
        .map(|issue| issue["sequence_id"].as_i64().unwrap())
        .collect();
    assert_eq!(sequences, vec![3, 4]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn light_view_omits_aggregates(pool: PgPool) {
    let fx = seed_fixture(&pool).await;
    insert_issue(&pool, &fx, 1, "Issue", None).await;
    let app = common::build_test_app(pool);
    let uri = format!("{}?light=true", fx.project_path());
    let json = body_json(get_as(app, &uri, fx.user_id).await).await;

    let issue = &json["data"]["issues"][0];
    assert_eq!(issue["name"], "Issue");
    assert!(issue.get("sub_issues_count").is_none());
    assert!(issue.get("search_rank").is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn grouped_response_lists_buckets(pool: PgPool) {
    let fx = seed_fixture(&pool).await;
    insert_issue(&pool, &fx, 1, "A", Some("high")).await;
    insert_issue(&pool, &fx, 2, "B", Some("urgent")).await;
    insert_issue(&pool, &fx, 3, "C", Some("high")).await;
    insert_issue(&pool, &fx, 4, "D", None).await;
    let app = common::build_test_app(pool);
    let uri = format!("{}?group_by=priority", fx.project_path());
    let response = get_as(app, &uri, fx.user_id).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["group_by"], "priority");
    assert_eq!(data["pagination_meta"]["count"], 3);

    let buckets = data["issues"].as_array().unwrap();
    let keys: Vec<serde_json::Value> = buckets.iter().map(|b| b["group_key"].clone()).collect();
    assert_eq!(keys, vec![json!("urgent"), json!("high"), json!(null)]);
    assert_eq!(buckets[1]["bucket_count"], 2);
    assert_eq!(buckets[1]["items"].as_array().unwrap().len(), 2);
}

// ---------------------------------------------------------------------------
// Streaming
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn stream_emits_one_line_per_bucket_then_meta(pool: PgPool) {
    let fx = seed_fixture(&pool).await;
    insert_issue(&pool, &fx, 1, "A", Some("low")).await;
    insert_issue(&pool, &fx, 2, "B", Some("urgent")).await;
    let app = common::build_test_app(pool);
    let uri = format!("{}/stream?group_by=priority", fx.project_path());
    let response = get_as(app, &uri, fx.user_id).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(CONTENT_TYPE).unwrap(),
        "application/x-ndjson"
    );

    let lines = body_ndjson(response).await;
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["group_key"], "urgent");
    assert_eq!(lines[1]["group_key"], "low");
    assert_eq!(lines[2]["pagination_meta"]["count"], 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn global_stream_uses_membership_scope(pool: PgPool) {
    let fx = seed_fixture(&pool).await;
    insert_issue(&pool, &fx, 1, "A", Some("medium")).await;
    let app = common::build_test_app(pool);
    let uri = format!("{GLOBAL}/stream?group_by=author");
    let lines = body_ndjson(get_as(app, &uri, fx.user_id).await).await;

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["group_key"], fx.user_id);
    assert_eq!(lines[0]["bucket_count"], 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn stream_without_group_key_is_rejected(pool: PgPool) {
    let fx = seed_fixture(&pool).await;
    let app = common::build_test_app(pool);
    let uri = format!("{}/stream", fx.project_path());
    let response = get_as(app, &uri, fx.user_id).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}
