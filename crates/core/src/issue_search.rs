//! Issue search request model and validation.
//!
//! [`SearchParams`] is what a caller asks for; [`SearchParams::validate`]
//! checks it and produces an [`IssueSearch`] with typed sort and group keys
//! and a parsed text query. Nothing here touches the database.

use std::str::FromStr;

use crate::issue_fields::{GroupBy, Priority, SortKey};
use crate::search::TextQuery;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Default page size when the caller does not pass `limit`.
pub const DEFAULT_SEARCH_LIMIT: i64 = 50;

/// Maximum page size. Larger values are rejected, not clamped.
pub const MAX_SEARCH_LIMIT: i64 = 100;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Request validation failures, raised before any query runs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchValidationError {
    #[error("limit {limit} exceeds the maximum of {max}")]
    LimitTooHigh { limit: i64, max: i64 },

    #[error("limit must be positive, got {0}")]
    NonPositiveLimit(i64),

    #[error("offset must not be negative, got {0}")]
    NegativeOffset(i64),

    #[error("unsupported group_by value '{0}'")]
    UnsupportedGroup(String),

    #[error("unsupported order_by value '{0}'")]
    UnsupportedSort(String),

    #[error("only_count cannot be combined with group_by")]
    GroupedCount,
}

// ---------------------------------------------------------------------------
// Value filters
// ---------------------------------------------------------------------------

/// A set of accepted values for one filter dimension.
///
/// `include_none` carries the empty-string sentinel: it admits rows that
/// have no value at all in this dimension. A row passes the filter if it
/// has a matching value OR (when `include_none`) has no value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueFilter<T> {
    pub values: Vec<T>,
    pub include_none: bool,
}

impl<T> Default for ValueFilter<T> {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            include_none: false,
        }
    }
}

/// Filter over numeric entity ids.
pub type IdFilter = ValueFilter<DbId>;

/// Filter over workspace slugs.
pub type SlugFilter = ValueFilter<String>;

/// Filter over priorities (`include_none` matches issues with no priority).
pub type PriorityFilter = ValueFilter<Priority>;

impl<T> ValueFilter<T> {
    /// A filter accepting exactly `values`.
    pub fn of(values: impl IntoIterator<Item = T>) -> Self {
        Self {
            values: values.into_iter().collect(),
            include_none: false,
        }
    }

    /// Add the "no value" sentinel.
    pub fn or_none(mut self) -> Self {
        self.include_none = true;
        self
    }

    /// `true` when the dimension was not specified and imposes no constraint.
    pub fn is_unconstrained(&self) -> bool {
        self.values.is_empty() && !self.include_none
    }
}

impl<T: FromStr> ValueFilter<T> {
    /// Build a filter from raw request values. An empty (or blank) entry is
    /// the "no value" sentinel; every other entry must parse as `T`.
    ///
    /// Returns the offending entry on failure.
    pub fn from_raw<'a, I>(raw: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut filter = Self::default();
        for entry in raw {
            let entry = entry.trim();
            if entry.is_empty() {
                filter.include_none = true;
                continue;
            }
            let value = entry.parse::<T>().map_err(|_| entry.to_string())?;
            filter.values.push(value);
        }
        Ok(filter)
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Filter dimensions of a search. Unspecified dimensions are unconstrained.
#[derive(Debug, Clone, Default)]
pub struct Filters {
    pub author_ids: IdFilter,
    pub assignee_ids: IdFilter,
    pub watcher_ids: IdFilter,
    pub label_ids: IdFilter,
    pub sprint_ids: IdFilter,
    pub workspace_ids: IdFilter,
    pub workspace_slugs: SlugFilter,
    pub project_ids: IdFilter,
    pub state_ids: IdFilter,
    pub priorities: PriorityFilter,
    pub search_query: String,
    pub assigned_to_me: bool,
    pub watched_by_me: bool,
    pub authored_by_me: bool,
}

/// Raw search request, as supplied by the caller.
#[derive(Debug, Clone)]
pub struct SearchParams {
    pub filters: Filters,
    pub order_by: String,
    pub desc: bool,
    pub group_by: String,
    pub limit: i64,
    pub offset: i64,
    pub light_search: bool,
    pub only_count: bool,
    pub only_active: bool,
    pub only_pinned: bool,
    pub hide_sub_issues: bool,
    pub draft: bool,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            filters: Filters::default(),
            order_by: String::new(),
            desc: false,
            group_by: String::new(),
            limit: DEFAULT_SEARCH_LIMIT,
            offset: 0,
            light_search: false,
            only_count: false,
            only_active: false,
            only_pinned: false,
            hide_sub_issues: false,
            draft: false,
        }
    }
}

/// Who is asking and which issues they may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchScope {
    /// The caller; used for membership and the "…by me" filters.
    pub user_id: DbId,
    pub kind: ScopeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Confined to a single project.
    Project {
        workspace_id: DbId,
        project_id: DbId,
    },
    /// Confined to projects and workspaces the caller is a member of.
    Global,
}

impl SearchScope {
    pub fn project(user_id: DbId, workspace_id: DbId, project_id: DbId) -> Self {
        Self {
            user_id,
            kind: ScopeKind::Project {
                workspace_id,
                project_id,
            },
        }
    }

    pub fn global(user_id: DbId) -> Self {
        Self {
            user_id,
            kind: ScopeKind::Global,
        }
    }
}

/// A validated search, ready to be compiled into SQL.
#[derive(Debug, Clone)]
pub struct IssueSearch {
    pub filters: Filters,
    pub text: Option<TextQuery>,
    pub sort: SortKey,
    pub desc: bool,
    pub group_by: Option<GroupBy>,
    pub limit: i64,
    pub offset: i64,
    pub light_search: bool,
    pub only_count: bool,
    pub only_active: bool,
    pub only_pinned: bool,
    pub hide_sub_issues: bool,
    pub draft: bool,
}

impl SearchParams {
    /// Check the request and resolve its sort/group keys.
    ///
    /// Limit, offset, group and sort checks all happen here so an invalid
    /// request never reaches the database.
    pub fn validate(self) -> Result<IssueSearch, SearchValidationError> {
        if self.limit > MAX_SEARCH_LIMIT {
            return Err(SearchValidationError::LimitTooHigh {
                limit: self.limit,
                max: MAX_SEARCH_LIMIT,
            });
        }
        if self.limit <= 0 {
            return Err(SearchValidationError::NonPositiveLimit(self.limit));
        }
        if self.offset < 0 {
            return Err(SearchValidationError::NegativeOffset(self.offset));
        }

        let group_by = match self.group_by.trim() {
            "" => None,
            raw => Some(
                GroupBy::parse(raw)
                    .ok_or_else(|| SearchValidationError::UnsupportedGroup(raw.to_string()))?,
            ),
        };
        if group_by.is_some() && self.only_count {
            return Err(SearchValidationError::GroupedCount);
        }

        let sort = SortKey::parse(&self.order_by)
            .ok_or_else(|| SearchValidationError::UnsupportedSort(self.order_by.clone()))?;

        let text = TextQuery::parse(&self.filters.search_query);

        Ok(IssueSearch {
            filters: self.filters,
            text,
            sort,
            desc: self.desc,
            group_by,
            limit: self.limit,
            offset: self.offset,
            light_search: self.light_search,
            only_count: self.only_count,
            only_active: self.only_active,
            only_pinned: self.only_pinned,
            hide_sub_issues: self.hide_sub_issues,
            draft: self.draft,
        })
    }
}

impl IssueSearch {
    /// Sort actually applied: `search_rank` without a text query falls back
    /// to the default key.
    pub fn effective_sort(&self) -> SortKey {
        match (self.sort, &self.text) {
            (SortKey::SearchRank, None) => SortKey::DEFAULT,
            (sort, _) => sort,
        }
    }
}
