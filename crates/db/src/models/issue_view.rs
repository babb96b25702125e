//! Response shapes for issue search.

use chrono::NaiveDate;
use serde::Serialize;
use tasklane_core::issue_fields::GroupBy;
use tasklane_core::types::{DbId, Timestamp};

use super::issue::{IssueBrief, LabelLight, ProjectLight, StateLight, UserLight, WorkspaceLight};

// ---------------------------------------------------------------------------
// Issue projections
// ---------------------------------------------------------------------------

/// Core fields and directly related entities.
#[derive(Debug, Clone, Serialize)]
pub struct IssueLight {
    pub id: DbId,
    pub sequence_id: i32,
    pub name: String,
    pub priority: Option<String>,
    pub is_draft: bool,
    pub pinned: bool,
    pub parent_id: Option<DbId>,
    pub start_date: Option<NaiveDate>,
    pub target_date: Option<NaiveDate>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub author: Option<UserLight>,
    pub state: Option<StateLight>,
    pub project: Option<ProjectLight>,
    pub workspace: Option<WorkspaceLight>,
    pub assignees: Vec<UserLight>,
    pub watchers: Vec<UserLight>,
    pub labels: Vec<LabelLight>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IssueCounts {
    pub sub_issues_count: i64,
    pub link_count: i64,
    pub attachment_count: i64,
    pub linked_issues_count: i64,
    pub comments_count: i64,
}

/// Light view plus aggregates, search output and resolved links.
#[derive(Debug, Clone, Serialize)]
pub struct IssueFull {
    #[serde(flatten)]
    pub issue: IssueLight,
    #[serde(flatten)]
    pub counts: IssueCounts,
    pub search_rank: Option<f32>,
    pub name_highlighted: Option<String>,
    pub description_highlighted: Option<String>,
    pub parent: Option<IssueBrief>,
    pub linked_issues: Vec<IssueBrief>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum IssueView {
    Light(IssueLight),
    Full(Box<IssueFull>),
}

impl IssueView {
    pub fn id(&self) -> DbId {
        match self {
            Self::Light(issue) => issue.id,
            Self::Full(full) => full.issue.id,
        }
    }
}

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

/// `count` is the total the page was taken from; `offset` and `limit` echo
/// the row window that was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationMeta {
    pub count: i64,
    pub offset: i64,
    pub limit: i64,
}

/// Flat search result.
#[derive(Debug, Clone, Serialize)]
pub struct IssuesPageResponse {
    pub pagination_meta: PaginationMeta,
    pub issues: Vec<IssueView>,
}

/// Value identifying a bucket. `None` is the "no value" bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum GroupKey {
    Id(DbId),
    Value(String),
    None,
}

/// One bucket of a grouped search, paginated on its own.
#[derive(Debug, Clone, Serialize)]
pub struct IssueGroup {
    pub group_key: GroupKey,
    pub group_label: Option<String>,
    /// Issues in this bucket, ignoring limit and offset.
    pub bucket_count: i64,
    pub items: Vec<IssueView>,
}

/// Grouped search result.
///
/// Every discovered bucket is returned; the bucket list is not paged.
/// `pagination_meta.count` is the number of buckets, while its `offset` and
/// `limit` are the row window applied inside each bucket.
#[derive(Debug, Clone, Serialize)]
pub struct IssuesGroupedResponse {
    pub pagination_meta: PaginationMeta,
    pub group_by: GroupBy,
    pub issues: Vec<IssueGroup>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountResponse {
    pub count: i64,
}
