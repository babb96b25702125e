pub mod health;
pub mod issue_search;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /issues/search                                              global search
/// /issues/search/stream                                       global grouped NDJSON
/// /workspaces/{workspace_id}/projects/{project_id}/issues/search         project search
/// /workspaces/{workspace_id}/projects/{project_id}/issues/search/stream  project grouped NDJSON
/// ```
///
/// Every route requires a Bearer token.
pub fn api_routes() -> Router<AppState> {
    Router::new().merge(issue_search::router())
}
