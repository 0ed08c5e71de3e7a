use scyflow_core::model::{Project, ScyflowUuid};
use uuid::Uuid;

use crate::error::StoreError;
use crate::rows::project_from_row;
use crate::Store;

impl Store {
    /// Creates a new, empty project.
    pub async fn create_project(
        &self,
        name: &str,
        users: &[ScyflowUuid],
        default_retries: i32,
    ) -> Result<Project, StoreError> {
        let client = self.pool.get().await?;
        let id = Uuid::new_v4();
        let row = client
            .query_one(
                "INSERT INTO projects (id, name, users, default_retries)
                 VALUES ($1, $2, $3, $4)
                 RETURNING id, name, created_at, users, default_retries",
                &[&id, &name, &users, &default_retries],
            )
            .await?;
        project_from_row(&row)
    }

    /// Fetches a project by id.
    pub async fn get_project(&self, id: ScyflowUuid) -> Result<Project, StoreError> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "SELECT id, name, created_at, users, default_retries FROM projects WHERE id = $1",
                &[&id],
            )
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("project {id}")))?;
        project_from_row(&row)
    }

    /// Lists every project a user is a member of.
    pub async fn list_projects_for_user(
        &self,
        user_id: ScyflowUuid,
    ) -> Result<Vec<Project>, StoreError> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                "SELECT id, name, created_at, users, default_retries
                 FROM projects WHERE $1 = ANY(users)
                 ORDER BY created_at DESC",
                &[&user_id],
            )
            .await?;
        rows.iter().map(project_from_row).collect()
    }

    /// True iff `user_id` is a member of `project_id`. Used by the API
    /// layer's membership check (§10.5); never used to gate reads of
    /// non-sensitive metadata.
    pub async fn is_member(
        &self,
        project_id: ScyflowUuid,
        user_id: ScyflowUuid,
    ) -> Result<bool, StoreError> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                "SELECT $2 = ANY(users) AS is_member FROM projects WHERE id = $1",
                &[&project_id, &user_id],
            )
            .await?;
        Ok(row.try_get("is_member")?)
    }

    /// Deletes a project and, via `ON DELETE CASCADE`, every block,
    /// entrypoint, port, and edge beneath it.
    pub async fn delete_project(&self, id: ScyflowUuid) -> Result<(), StoreError> {
        let client = self.pool.get().await?;
        let affected = client
            .execute("DELETE FROM projects WHERE id = $1", &[&id])
            .await?;
        if affected == 0 {
            return Err(StoreError::NotFound(format!("project {id}")));
        }
        Ok(())
    }
}
