use super::DbRepository;
use crate::error::DbError;
use core_types::{SessionUser, User};

impl DbRepository {
    /// Creates or refreshes the `users` row for a signed-in account.
    ///
    /// A farm id claim that does not match an existing farm is stored as NULL.
    pub async fn upsert_user(&self, session: &SessionUser) -> Result<User, DbError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, name, role, farm_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, (SELECT id FROM farms WHERE id = $5), NOW(), NOW())
            ON CONFLICT (id) DO UPDATE
            SET email = EXCLUDED.email,
                name = EXCLUDED.name,
                role = EXCLUDED.role,
                farm_id = EXCLUDED.farm_id,
                updated_at = NOW()
            RETURNING id, email, name, role, farm_id, created_at, updated_at
            "#,
        )
        .bind(&session.id)
        .bind(&session.email)
        .bind(&session.name)
        .bind(session.role)
        .bind(session.farm_id)
        .fetch_one(self.db.pool())
        .await?;
        Ok(user)
    }
}
