//! Batched loading of the entities related to a page of issues.
//!
//! One query per relation over the ids on the page, never one per row.

use std::collections::{BTreeSet, HashMap};

use sqlx::PgPool;
use tasklane_core::types::DbId;

use crate::models::issue::{
    IssueBrief, IssueLabelRow, IssueRow, IssueUserRow, LabelLight, LinkedIssueRow, ProjectLight,
    StateLight, UserLight, WorkspaceLight,
};
use crate::search::projector::RelationIndex;

const USER_COLUMNS: &str = "u.id, u.email, u.first_name, u.last_name, u.avatar";

const BRIEF_COLUMNS: &str =
    "i.id, i.project_id, i.sequence_id, i.name, p.identifier || '-' || i.sequence_id AS reference";

pub struct IssueRelationRepo;

impl IssueRelationRepo {
    /// Load everything the projector needs for `rows`.
    ///
    /// Parents and linked issues are only loaded for the full view.
    pub async fn load(
        pool: &PgPool,
        rows: &[IssueRow],
        full: bool,
    ) -> Result<RelationIndex, sqlx::Error> {
        let mut index = RelationIndex::default();
        if rows.is_empty() {
            return Ok(index);
        }

        let issue_ids: Vec<DbId> = rows.iter().map(|r| r.id).collect();
        let author_ids = distinct(rows.iter().map(|r| r.created_by_id));
        let state_ids = distinct(rows.iter().filter_map(|r| r.state_id));
        let project_ids = distinct(rows.iter().map(|r| r.project_id));
        let workspace_ids = distinct(rows.iter().map(|r| r.workspace_id));

        index.users = Self::users(pool, &author_ids).await?;
        index.states = Self::states(pool, &state_ids).await?;
        index.projects = Self::projects(pool, &project_ids).await?;
        index.workspaces = Self::workspaces(pool, &workspace_ids).await?;
        index.assignees = Self::issue_users(pool, "issue_assignees", "assignee_id", &issue_ids).await?;
        index.watchers = Self::issue_users(pool, "issue_watchers", "watcher_id", &issue_ids).await?;
        index.labels = Self::labels(pool, &issue_ids).await?;

        if full {
            let parent_ids = distinct(rows.iter().filter_map(|r| r.parent_id));
            index.parents = Self::briefs(pool, &parent_ids).await?;
            index.linked = Self::linked(pool, &issue_ids).await?;
        }

        Ok(index)
    }

    // -----------------------------------------------------------------------
    // Entities by id
    // -----------------------------------------------------------------------

    async fn users(pool: &PgPool, ids: &[DbId]) -> Result<HashMap<DbId, UserLight>, sqlx::Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = ANY($1)");
        let users = sqlx::query_as::<_, UserLight>(&sql)
            .bind(ids)
            .fetch_all(pool)
            .await?;
        Ok(users.into_iter().map(|u| (u.id, u)).collect())
    }

    async fn states(pool: &PgPool, ids: &[DbId]) -> Result<HashMap<DbId, StateLight>, sqlx::Error> {
        let states = sqlx::query_as::<_, StateLight>(
            "SELECT id, name, color, group_name FROM states WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(pool)
        .await?;
        Ok(states.into_iter().map(|s| (s.id, s)).collect())
    }

    async fn projects(
        pool: &PgPool,
        ids: &[DbId],
    ) -> Result<HashMap<DbId, ProjectLight>, sqlx::Error> {
        let projects = sqlx::query_as::<_, ProjectLight>(
            "SELECT id, identifier, name FROM projects WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(pool)
        .await?;
        Ok(projects.into_iter().map(|p| (p.id, p)).collect())
    }

    async fn workspaces(
        pool: &PgPool,
        ids: &[DbId],
    ) -> Result<HashMap<DbId, WorkspaceLight>, sqlx::Error> {
        let workspaces = sqlx::query_as::<_, WorkspaceLight>(
            "SELECT id, slug, name FROM workspaces WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(pool)
        .await?;
        Ok(workspaces.into_iter().map(|w| (w.id, w)).collect())
    }

    async fn briefs(pool: &PgPool, ids: &[DbId]) -> Result<HashMap<DbId, IssueBrief>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let sql = format!(
            "SELECT {BRIEF_COLUMNS} FROM issues i JOIN projects p ON p.id = i.project_id \
             WHERE i.id = ANY($1) AND i.deleted_at IS NULL"
        );
        let briefs = sqlx::query_as::<_, IssueBrief>(&sql)
            .bind(ids)
            .fetch_all(pool)
            .await?;
        Ok(briefs.into_iter().map(|b| (b.id, b)).collect())
    }

    // -----------------------------------------------------------------------
    // Per-issue lists
    // -----------------------------------------------------------------------

    async fn issue_users(
        pool: &PgPool,
        table: &str,
        column: &str,
        issue_ids: &[DbId],
    ) -> Result<HashMap<DbId, Vec<UserLight>>, sqlx::Error> {
        let sql = format!(
            "SELECT r.issue_id, {USER_COLUMNS} FROM {table} r JOIN users u ON u.id = r.{column} \
             WHERE r.issue_id = ANY($1) ORDER BY r.issue_id, u.id"
        );
        let rows = sqlx::query_as::<_, IssueUserRow>(&sql)
            .bind(issue_ids)
            .fetch_all(pool)
            .await?;
        Ok(group(rows.into_iter().map(|r| (r.issue_id, r.user))))
    }

    async fn labels(
        pool: &PgPool,
        issue_ids: &[DbId],
    ) -> Result<HashMap<DbId, Vec<LabelLight>>, sqlx::Error> {
        let rows = sqlx::query_as::<_, IssueLabelRow>(
            "SELECT il.issue_id, l.id, l.name, l.color FROM issue_labels il \
             JOIN labels l ON l.id = il.label_id \
             WHERE il.issue_id = ANY($1) ORDER BY il.issue_id, l.name, l.id",
        )
        .bind(issue_ids)
        .fetch_all(pool)
        .await?;
        Ok(group(rows.into_iter().map(|r| (r.issue_id, r.label))))
    }

    /// Links are stored once per pair, so both directions are read.
    async fn linked(
        pool: &PgPool,
        issue_ids: &[DbId],
    ) -> Result<HashMap<DbId, Vec<IssueBrief>>, sqlx::Error> {
        let sql = format!(
            "SELECT l.issue_id, {BRIEF_COLUMNS} FROM ( \
                SELECT issue_id1 AS issue_id, issue_id2 AS other_id FROM linked_issues \
                WHERE issue_id1 = ANY($1) \
                UNION \
                SELECT issue_id2, issue_id1 FROM linked_issues WHERE issue_id2 = ANY($1) \
             ) l \
             JOIN issues i ON i.id = l.other_id \
             JOIN projects p ON p.id = i.project_id \
             WHERE i.deleted_at IS NULL \
             ORDER BY l.issue_id, i.id"
        );
        let rows = sqlx::query_as::<_, LinkedIssueRow>(&sql)
            .bind(issue_ids)
            .fetch_all(pool)
            .await?;
        Ok(group(rows.into_iter().map(|r| (r.issue_id, r.linked))))
    }
}

fn distinct(ids: impl Iterator<Item = DbId>) -> Vec<DbId> {
    ids.collect::<BTreeSet<_>>().into_iter().collect()
}

fn group<T>(pairs: impl Iterator<Item = (DbId, T)>) -> HashMap<DbId, Vec<T>> {
    let mut map: HashMap<DbId, Vec<T>> = HashMap::new();
    for (issue_id, item) in pairs {
        map.entry(issue_id).or_default().push(item);
    }
    map
}
