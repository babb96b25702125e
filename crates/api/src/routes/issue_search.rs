//! Route definitions for issue search.

use axum::routing::get;
use axum::Router;

use crate::handlers::issue_search;
use crate::state::AppState;

/// Issue search routes, mounted directly under `/api/v1`.
///
/// ```text
/// GET /issues/search                                                   -> search_issues
/// GET /issues/search/stream                                            -> stream_issues
/// GET /workspaces/{workspace_id}/projects/{project_id}/issues/search        -> search_project_issues
/// GET /workspaces/{workspace_id}/projects/{project_id}/issues/search/stream -> stream_project_issues
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/issues/search", get(issue_search::search_issues))
        .route("/issues/search/stream", get(issue_search::stream_issues))
        .route(
            "/workspaces/{workspace_id}/projects/{project_id}/issues/search",
            get(issue_search::search_project_issues),
        )
        .route(
            "/workspaces/{workspace_id}/projects/{project_id}/issues/search/stream",
            get(issue_search::stream_project_issues),
        )
}
