//! Handlers for issue search.
//!
//! Flat, grouped and count results share one endpoint per scope; the
//! `/stream` variants emit grouped results as NDJSON while buckets are
//! computed.

use std::convert::Infallible;

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tasklane_core::error::CoreError;
use tasklane_core::issue_search::SearchScope;
use tasklane_core::types::DbId;
use tasklane_db::repositories::{IssueSearchRepo, MembershipRepo};
use tasklane_db::search::SearchError;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::IssueSearchQuery;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::stream::{ndjson_line, ChannelSink, STREAM_BUFFER};

const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

// ---------------------------------------------------------------------------
// Scope resolution
// ---------------------------------------------------------------------------

/// Resolve a project scope, checking the project exists inside the
/// workspace and that the caller is a member of both.
async fn project_scope(
    state: &AppState,
    auth: &AuthUser,
    workspace_id: DbId,
    project_id: DbId,
) -> AppResult<SearchScope> {
    if !MembershipRepo::project_exists(&state.pool, workspace_id, project_id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "project",
            id: project_id,
        }));
    }
    if !MembershipRepo::is_project_member(&state.pool, auth.user_id, workspace_id, project_id)
        .await?
    {
        return Err(AppError::Core(CoreError::Forbidden(
            "You are not a member of this project".into(),
        )));
    }
    Ok(SearchScope::project(auth.user_id, workspace_id, project_id))
}

// ---------------------------------------------------------------------------
// Collected search
// ---------------------------------------------------------------------------

/// GET /api/v1/issues/search
///
/// Search every project the caller is a member of.
pub async fn search_issues(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<IssueSearchQuery>,
) -> AppResult<impl IntoResponse> {
    let scope = SearchScope::global(auth.user_id);
    run_search(&state, query, &scope).await
}

/// GET /api/v1/workspaces/{workspace_id}/projects/{project_id}/issues/search
pub async fn search_project_issues(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((workspace_id, project_id)): Path<(DbId, DbId)>,
    Query(query): Query<IssueSearchQuery>,
) -> AppResult<impl IntoResponse> {
    let scope = project_scope(&state, &auth, workspace_id, project_id).await?;
    run_search(&state, query, &scope).await
}

async fn run_search(
    state: &AppState,
    query: IssueSearchQuery,
    scope: &SearchScope,
) -> AppResult<impl IntoResponse> {
    let params = query.into_params()?;
    let outcome = IssueSearchRepo::search(&state.pool, params, scope).await?;
    Ok(Json(DataResponse { data: outcome }))
}

// ---------------------------------------------------------------------------
// Streamed grouped search
// ---------------------------------------------------------------------------

/// GET /api/v1/issues/search/stream
pub async fn stream_issues(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<IssueSearchQuery>,
) -> AppResult<Response> {
    let scope = SearchScope::global(auth.user_id);
    run_stream(&state, query, scope)
}

/// GET /api/v1/workspaces/{workspace_id}/projects/{project_id}/issues/search/stream
pub async fn stream_project_issues(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((workspace_id, project_id)): Path<(DbId, DbId)>,
    Query(query): Query<IssueSearchQuery>,
) -> AppResult<Response> {
    let scope = project_scope(&state, &auth, workspace_id, project_id).await?;
    run_stream(&state, query, scope)
}

/// Validate the request, then hand bucket computation to a task that feeds
/// the response body.
///
/// Validation failures are ordinary error responses. Once streaming has
/// started, a failure is written as a final `{ "error", "code" }` line.
fn run_stream(
    state: &AppState,
    query: IssueSearchQuery,
    scope: SearchScope,
) -> AppResult<Response> {
    let search = query
        .into_params()?
        .validate()
        .map_err(SearchError::from)?;
    let group_by = search.group_by.ok_or_else(|| {
        CoreError::Validation("group_by is required for streamed search".into())
    })?;

    let (tx, rx) = mpsc::channel::<String>(STREAM_BUFFER);
    let pool = state.pool.clone();

    tokio::spawn(async move {
        let mut sink = ChannelSink::new(tx.clone());
        let result =
            IssueSearchRepo::stream_grouped(&pool, &search, &scope, group_by, &mut sink).await;

        let closing = match result {
            Ok(pagination_meta) => json!({ "pagination_meta": pagination_meta }),
            Err(SearchError::Sink(err)) => {
                tracing::debug!(error = %err, "Issue stream aborted by sink");
                return;
            }
            Err(err) => AppError::from(err).body().1,
        };
        if let Ok(line) = ndjson_line(&closing) {
            let _ = tx.send(line).await;
        }
    });

    let body = Body::from_stream(ReceiverStream::new(rx).map(Ok::<_, Infallible>));
    Ok(([(CONTENT_TYPE, NDJSON_CONTENT_TYPE)], body).into_response())
}
