//! Seeding helpers for issue search integration tests.
//!
//! Rows are inserted with plain SQL; the engine itself never writes.

#![allow(dead_code)]

use sqlx::PgPool;
use tasklane_core::issue_search::SearchScope;
use tasklane_core::types::DbId;

/// A user who is a member of one workspace and one project in it.
pub struct Fixture {
    pub user_id: DbId,
    pub workspace_id: DbId,
    pub project_id: DbId,
}

impl Fixture {
    pub fn project_scope(&self) -> SearchScope {
        SearchScope::project(self.user_id, self.workspace_id, self.project_id)
    }

    pub fn global_scope(&self) -> SearchScope {
        SearchScope::global(self.user_id)
    }
}

pub async fn insert_user(pool: &PgPool, email: &str, last_name: &str) -> DbId {
    sqlx::query_scalar("INSERT INTO users (email, last_name) VALUES ($1, $2) RETURNING id")
        .bind(email)
        .bind(last_name)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn insert_workspace(pool: &PgPool, slug: &str, owner_id: DbId) -> DbId {
    sqlx::query_scalar(
        "INSERT INTO workspaces (slug, name, owner_id) VALUES ($1, $1, $2) RETURNING id",
    )
    .bind(slug)
    .bind(owner_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn insert_project(pool: &PgPool, workspace_id: DbId, identifier: &str) -> DbId {
    sqlx::query_scalar(
        "INSERT INTO projects (workspace_id, identifier, name) VALUES ($1, $2, $2) RETURNING id",
    )
    .bind(workspace_id)
    .bind(identifier)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn add_members(pool: &PgPool, user_id: DbId, workspace_id: DbId, project_id: DbId) {
    sqlx::query("INSERT INTO workspace_members (workspace_id, member_id) VALUES ($1, $2)")
        .bind(workspace_id)
        .bind(user_id)
        .execute(pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO project_members (project_id, member_id) VALUES ($1, $2)")
        .bind(project_id)
        .bind(user_id)
        .execute(pool)
        .await
        .unwrap();
}

/// Workspace `acme` with project `PROJ`, and a member user.
pub async fn seed_fixture(pool: &PgPool) -> Fixture {
    let user_id = insert_user(pool, "owner@example.com", "Owner").await;
    let workspace_id = insert_workspace(pool, "acme", user_id).await;
    let project_id = insert_project(pool, workspace_id, "PROJ").await;
    add_members(pool, user_id, workspace_id, project_id).await;
    Fixture {
        user_id,
        workspace_id,
        project_id,
    }
}

pub async fn insert_state(pool: &PgPool, fx: &Fixture, name: &str, group_name: &str) -> DbId {
    sqlx::query_scalar(
        "INSERT INTO states (workspace_id, project_id, name, group_name) \
         VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(fx.workspace_id)
    .bind(fx.project_id)
    .bind(name)
    .bind(group_name)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn insert_label(pool: &PgPool, fx: &Fixture, name: &str) -> DbId {
    sqlx::query_scalar(
        "INSERT INTO labels (workspace_id, project_id, name) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(fx.workspace_id)
    .bind(fx.project_id)
    .bind(name)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Attach `related_id` to `issue_id` through a join table.
pub async fn relate(pool: &PgPool, table: &str, column: &str, issue_id: DbId, related_id: DbId) {
    let sql = format!("INSERT INTO {table} (issue_id, {column}) VALUES ($1, $2)");
    sqlx::query(&sql)
        .bind(issue_id)
        .bind(related_id)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn link_issues(pool: &PgPool, a: DbId, b: DbId) {
    sqlx::query("INSERT INTO linked_issues (issue_id1, issue_id2) VALUES ($1, $2)")
        .bind(a)
        .bind(b)
        .execute(pool)
        .await
        .unwrap();
}

// ---------------------------------------------------------------------------
// Issues
// ---------------------------------------------------------------------------

/// Issue to insert; defaults to a plain top-level, non-draft issue.
#[derive(Default)]
pub struct IssueSeed {
    pub sequence_id: i32,
    pub name: String,
    pub description: String,
    pub priority: Option<&'static str>,
    pub state_id: Option<DbId>,
    pub parent_id: Option<DbId>,
    pub is_draft: bool,
    pub pinned: bool,
    pub author_id: Option<DbId>,
}

impl IssueSeed {
    pub fn new(sequence_id: i32, name: &str) -> Self {
        Self {
            sequence_id,
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn priority(mut self, priority: &'static str) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn state(mut self, state_id: DbId) -> Self {
        self.state_id = Some(state_id);
        self
    }

    pub fn parent(mut self, parent_id: DbId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn draft(mut self) -> Self {
        self.is_draft = true;
        self
    }

    pub fn author(mut self, author_id: DbId) -> Self {
        self.author_id = Some(author_id);
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub async fn insert(self, pool: &PgPool, fx: &Fixture) -> DbId {
        sqlx::query_scalar(
            "INSERT INTO issues \
                (workspace_id, project_id, sequence_id, name, description_stripped, priority, \
                 state_id, created_by_id, parent_id, is_draft, pinned) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING id",
        )
        .bind(fx.workspace_id)
        .bind(fx.project_id)
        .bind(self.sequence_id)
        .bind(&self.name)
        .bind(&self.description)
        .bind(self.priority)
        .bind(self.state_id)
        .bind(self.author_id.unwrap_or(fx.user_id))
        .bind(self.parent_id)
        .bind(self.is_draft)
        .bind(self.pinned)
        .fetch_one(pool)
        .await
        .unwrap()
    }
}
