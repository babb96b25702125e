//! Membership lookups used to authorize project-scoped searches.

use sqlx::PgPool;
use tasklane_core::types::DbId;

pub struct MembershipRepo;

impl MembershipRepo {
    /// Whether `project_id` exists inside `workspace_id`.
    pub async fn project_exists(
        pool: &PgPool,
        workspace_id: DbId,
        project_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM projects WHERE id = $1 AND workspace_id = $2)",
        )
        .bind(project_id)
        .bind(workspace_id)
        .fetch_one(pool)
        .await
    }

    /// Whether the user belongs to both the project and its workspace.
    pub async fn is_project_member(
        pool: &PgPool,
        user_id: DbId,
        workspace_id: DbId,
        project_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS ( \
                SELECT 1 FROM project_members pm \
                JOIN projects p ON p.id = pm.project_id \
                JOIN workspace_members wm \
                  ON wm.workspace_id = p.workspace_id AND wm.member_id = pm.member_id \
                WHERE pm.member_id = $1 AND p.id = $2 AND p.workspace_id = $3)",
        )
        .bind(user_id)
        .bind(project_id)
        .bind(workspace_id)
        .fetch_one(pool)
        .await
    }
}
