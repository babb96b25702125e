//! Issue query engine: compiles a validated [`IssueSearch`] into SQL plans.
//!
//! - [`plan`] -- the shared plan object and SQL renderers
//! - [`filters`] -- filter compiler (scope, lifecycle, dimensions, text)
//! - [`sort`] -- sort resolver
//! - [`fulltext`] -- rank, highlight and aggregate projections
//! - [`grouping`] -- bucket discovery, restriction and sinks
//! - [`projector`] -- light / full result shapes
//!
//! Execution lives in [`crate::repositories::IssueSearchRepo`].

use serde::Serialize;
use tasklane_core::issue_search::{IssueSearch, SearchScope, SearchValidationError};

use crate::models::issue_view::{CountResponse, IssuesGroupedResponse, IssuesPageResponse};

pub mod filters;
pub mod fulltext;
pub mod grouping;
pub mod plan;
pub mod projector;
pub mod sort;

pub use grouping::{CollectSink, GroupSink, SinkError};
pub use plan::{BindValue, IssueQuery};

/// Failure of a search, by where it happened.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error(transparent)]
    Validation(#[from] SearchValidationError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Group sink failed: {0}")]
    Sink(SinkError),
}

/// Result of a search, in the shape the request asked for.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SearchOutcome {
    Count(CountResponse),
    Page(IssuesPageResponse),
    Grouped(IssuesGroupedResponse),
}

/// Plan carrying only the filters. Used for counts and bucket discovery.
pub fn compile_filters(search: &IssueSearch, scope: &SearchScope) -> IssueQuery {
    let mut query = IssueQuery::new();
    filters::apply_filters(search, scope, &mut query);
    query
}

/// Plan for materializing rows: filters, then rank/highlights, aggregates
/// and ordering.
pub fn compile_page(search: &IssueSearch, scope: &SearchScope) -> IssueQuery {
    let mut query = compile_filters(search, scope);
    fulltext::apply_text_projections(search, &mut query);
    fulltext::apply_aggregates(search, &mut query);
    sort::apply_sort(search, &mut query);
    query
}
