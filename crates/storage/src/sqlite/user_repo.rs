use tracing::debug;
use training_core::model::{LearnerId, Role, UserProfile};

use super::SqliteRepository;
use super::mapping::{conn, id_to_i64, map_user_row};
use crate::repository::{StorageError, UserRepository};

#[async_trait::async_trait]
impl UserRepository for SqliteRepository {
    async fn upsert_user(&self, user: &UserProfile) -> Result<(), StorageError> {
        let id = id_to_i64("user_id", user.id().value())?;
        // created_at is only written on insert.
        sqlx::query(
            r"
            INSERT INTO users (id, display_name, role, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                display_name = excluded.display_name,
                role = excluded.role,
                updated_at = excluded.updated_at
            ",
        )
        .bind(id)
        .bind(user.display_name())
        .bind(user.role().as_str())
        .bind(user.created_at())
        .bind(user.updated_at())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        debug!(user_id = id, role = user.role().as_str(), "upserted user");
        Ok(())
    }

    async fn get_user(&self, id: LearnerId) -> Result<Option<UserProfile>, StorageError> {
        let row = sqlx::query(
            "SELECT id, display_name, role, created_at, updated_at FROM users WHERE id = ?1",
        )
        .bind(id_to_i64("user_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_user_row).transpose()
    }

    async fn list_users(&self, role: Option<Role>) -> Result<Vec<UserProfile>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, display_name, role, created_at, updated_at
            FROM users
            WHERE (?1 IS NULL OR role = ?1)
            ORDER BY id ASC
            ",
        )
        .bind(role.map(Role::as_str))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_user_row).collect()
    }
}
