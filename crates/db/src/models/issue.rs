//! Row types produced by the issue search queries.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;
use tasklane_core::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Search rows
// ---------------------------------------------------------------------------

/// One issue as returned by a compiled search, plus its computed columns.
///
/// Aggregate counts, rank and highlights are only projected by some plans;
/// when a plan leaves them out the defaults apply.
#[derive(Debug, Clone, FromRow)]
pub struct IssueRow {
    pub id: DbId,
    pub workspace_id: DbId,
    pub project_id: DbId,
    pub sequence_id: i32,
    pub name: String,
    pub priority: Option<String>,
    pub state_id: Option<DbId>,
    pub created_by_id: DbId,
    pub parent_id: Option<DbId>,
    pub is_draft: bool,
    pub pinned: bool,
    pub start_date: Option<NaiveDate>,
    pub target_date: Option<NaiveDate>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,

    /// Rows matching the filters, ignoring limit and offset.
    pub all_count: i64,

    #[sqlx(default)]
    pub sub_issues_count: i64,
    #[sqlx(default)]
    pub link_count: i64,
    #[sqlx(default)]
    pub attachment_count: i64,
    #[sqlx(default)]
    pub linked_issues_count: i64,
    #[sqlx(default)]
    pub comments_count: i64,

    #[sqlx(default)]
    pub search_rank: Option<f32>,
    #[sqlx(default)]
    pub name_highlighted: Option<String>,
    #[sqlx(default)]
    pub description_highlighted: Option<String>,
}

/// A bucket found during group discovery.
///
/// Exactly one of `group_id` / `group_value` is set for a real bucket; both
/// are `NULL` for the "no value" bucket.
#[derive(Debug, Clone, FromRow)]
pub struct GroupBucketRow {
    pub group_id: Option<DbId>,
    pub group_value: Option<String>,
    pub group_label: Option<String>,
    pub bucket_count: i64,
}

// ---------------------------------------------------------------------------
// Related entities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct UserLight {
    pub id: DbId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: Option<String>,
}

/// A user attached to an issue (assignee or watcher).
#[derive(Debug, Clone, FromRow)]
pub struct IssueUserRow {
    pub issue_id: DbId,
    #[sqlx(flatten)]
    pub user: UserLight,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct LabelLight {
    pub id: DbId,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct IssueLabelRow {
    pub issue_id: DbId,
    #[sqlx(flatten)]
    pub label: LabelLight,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct StateLight {
    pub id: DbId,
    pub name: String,
    pub color: String,
    pub group_name: String,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ProjectLight {
    pub id: DbId,
    pub identifier: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct WorkspaceLight {
    pub id: DbId,
    pub slug: String,
    pub name: String,
}

/// Minimal issue reference used for parents and linked issues.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct IssueBrief {
    pub id: DbId,
    pub project_id: DbId,
    pub sequence_id: i32,
    pub name: String,
    /// `IDENT-123` built from the project identifier.
    pub reference: String,
}

/// A linked issue as seen from `issue_id`.
#[derive(Debug, Clone, FromRow)]
pub struct LinkedIssueRow {
    pub issue_id: DbId,
    #[sqlx(flatten)]
    pub linked: IssueBrief,
}
