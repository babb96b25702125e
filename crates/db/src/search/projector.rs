//! Result projector: shapes search rows into light or full views.
//!
//! Pure mapping over a page of [`IssueRow`]s and the related entities loaded
//! for that page. Order and membership of the page are never changed.

use std::collections::HashMap;

use tasklane_core::types::DbId;

use crate::models::issue::{
    IssueBrief, IssueRow, LabelLight, ProjectLight, StateLight, UserLight, WorkspaceLight,
};
use crate::models::issue_view::{IssueCounts, IssueFull, IssueLight, IssueView};

/// Related entities of one page, keyed for lookup by the projector.
#[derive(Debug, Clone, Default)]
pub struct RelationIndex {
    pub users: HashMap<DbId, UserLight>,
    pub states: HashMap<DbId, StateLight>,
    pub projects: HashMap<DbId, ProjectLight>,
    pub workspaces: HashMap<DbId, WorkspaceLight>,
    pub assignees: HashMap<DbId, Vec<UserLight>>,
    pub watchers: HashMap<DbId, Vec<UserLight>>,
    pub labels: HashMap<DbId, Vec<LabelLight>>,
    /// Parent issues by their own id (full view only).
    pub parents: HashMap<DbId, IssueBrief>,
    /// Linked issues keyed by the issue they are linked to (full view only).
    pub linked: HashMap<DbId, Vec<IssueBrief>>,
}

pub fn project_light(row: &IssueRow, index: &RelationIndex) -> IssueLight {
    IssueLight {
        id: row.id,
        sequence_id: row.sequence_id,
        name: row.name.clone(),
        priority: row.priority.clone(),
        is_draft: row.is_draft,
        pinned: row.pinned,
        parent_id: row.parent_id,
        start_date: row.start_date,
        target_date: row.target_date,
        completed_at: row.completed_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
        author: index.users.get(&row.created_by_id).cloned(),
        state: row.state_id.and_then(|id| index.states.get(&id).cloned()),
        project: index.projects.get(&row.project_id).cloned(),
        workspace: index.workspaces.get(&row.workspace_id).cloned(),
        assignees: list(&index.assignees, row.id),
        watchers: list(&index.watchers, row.id),
        labels: list(&index.labels, row.id),
    }
}

pub fn project_full(row: &IssueRow, index: &RelationIndex) -> IssueFull {
    IssueFull {
        issue: project_light(row, index),
        counts: IssueCounts {
            sub_issues_count: row.sub_issues_count,
            link_count: row.link_count,
            attachment_count: row.attachment_count,
            linked_issues_count: row.linked_issues_count,
            comments_count: row.comments_count,
        },
        search_rank: row.search_rank,
        name_highlighted: row.name_highlighted.clone(),
        description_highlighted: row.description_highlighted.clone(),
        parent: row.parent_id.and_then(|id| index.parents.get(&id).cloned()),
        linked_issues: list(&index.linked, row.id),
    }
}

/// Project a page in order.
pub fn project_page(rows: &[IssueRow], index: &RelationIndex, light: bool) -> Vec<IssueView> {
    rows.iter()
        .map(|row| {
            if light {
                IssueView::Light(project_light(row, index))
            } else {
                IssueView::Full(Box::new(project_full(row, index)))
            }
        })
        .collect()
}

fn list<T: Clone>(map: &HashMap<DbId, Vec<T>>, id: DbId) -> Vec<T> {
    map.get(&id).cloned().unwrap_or_default()
}
