//! Query-string parameters for the issue search endpoints.
//!
//! Multi-value filters arrive as comma-separated lists (`?labels=3,4,`).
//! An empty entry in a list is the "no value" sentinel: `labels=3,` matches
//! issues labelled 3 *or* carrying no label at all.

use std::str::FromStr;

use serde::Deserialize;
use tasklane_core::error::CoreError;
use tasklane_core::issue_search::{Filters, SearchParams, ValueFilter, DEFAULT_SEARCH_LIMIT};

/// Raw `?...` parameters accepted by the search endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct IssueSearchQuery {
    pub order_by: Option<String>,
    #[serde(default)]
    pub desc: bool,
    pub group_by: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    #[serde(default)]
    pub light: bool,
    #[serde(default)]
    pub only_count: bool,
    #[serde(default)]
    pub only_active: bool,
    #[serde(default)]
    pub only_pinned: bool,
    #[serde(default)]
    pub hide_sub_issues: bool,
    #[serde(default)]
    pub draft: bool,
    pub search_query: Option<String>,

    pub authors: Option<String>,
    pub assignees: Option<String>,
    pub watchers: Option<String>,
    pub labels: Option<String>,
    pub sprints: Option<String>,
    pub workspaces: Option<String>,
    pub workspace_slugs: Option<String>,
    pub projects: Option<String>,
    pub states: Option<String>,
    pub priorities: Option<String>,

    #[serde(default)]
    pub assigned_to_me: bool,
    #[serde(default)]
    pub watched_by_me: bool,
    #[serde(default)]
    pub authored_by_me: bool,
}

impl IssueSearchQuery {
    /// Convert into engine parameters.
    ///
    /// Only list parsing is checked here; limits, sort and group keys are
    /// validated by the engine.
    pub fn into_params(self) -> Result<SearchParams, CoreError> {
        let filters = Filters {
            author_ids: parse_list("authors", self.authors.as_deref())?,
            assignee_ids: parse_list("assignees", self.assignees.as_deref())?,
            watcher_ids: parse_list("watchers", self.watchers.as_deref())?,
            label_ids: parse_list("labels", self.labels.as_deref())?,
            sprint_ids: parse_list("sprints", self.sprints.as_deref())?,
            workspace_ids: parse_list("workspaces", self.workspaces.as_deref())?,
            workspace_slugs: parse_list("workspace_slugs", self.workspace_slugs.as_deref())?,
            project_ids: parse_list("projects", self.projects.as_deref())?,
            state_ids: parse_list("states", self.states.as_deref())?,
            priorities: parse_list("priorities", self.priorities.as_deref())?,
            search_query: self.search_query.unwrap_or_default(),
            assigned_to_me: self.assigned_to_me,
            watched_by_me: self.watched_by_me,
            authored_by_me: self.authored_by_me,
        };

        Ok(SearchParams {
            filters,
            order_by: self.order_by.unwrap_or_default(),
            desc: self.desc,
            group_by: self.group_by.unwrap_or_default(),
            limit: self.limit.unwrap_or(DEFAULT_SEARCH_LIMIT),
            offset: self.offset.unwrap_or(0),
            light_search: self.light,
            only_count: self.only_count,
            only_active: self.only_active,
            only_pinned: self.only_pinned,
            hide_sub_issues: self.hide_sub_issues,
            draft: self.draft,
        })
    }
}

/// Parse a comma-separated list. An absent parameter leaves the dimension
/// unconstrained.
fn parse_list<T: FromStr>(name: &str, raw: Option<&str>) -> Result<ValueFilter<T>, CoreError> {
    match raw {
        None => Ok(ValueFilter::default()),
        Some(raw) => ValueFilter::from_raw(raw.split(',')).map_err(|bad| {
            CoreError::Validation(format!("invalid value '{bad}' in '{name}'"))
        }),
    }
}
