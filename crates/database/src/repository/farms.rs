use super::DbRepository;
use crate::error::DbError;
use core_types::{Animal, Farm, User};
use sqlx::postgres::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

const FARM_COLUMNS: &str = "id, name, location, owner_name, owner_email, owner_phone, total_area, \
     description, is_active, created_at, updated_at";

impl DbRepository {
    /// Inserts a new farm and returns the stored row.
    pub async fn create_farm(&self, farm: &Farm) -> Result<Farm, DbError> {
        let stored = sqlx::query_as::<_, Farm>(&format!(
            r#"
            INSERT INTO farms (id, name, location, owner_name, owner_email, owner_phone,
                               total_area, description, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {FARM_COLUMNS}
            "#
        ))
        .bind(farm.id)
        .bind(&farm.name)
        .bind(&farm.location)
        .bind(&farm.owner_name)
        .bind(&farm.owner_email)
        .bind(&farm.owner_phone)
        .bind(farm.total_area)
        .bind(&farm.description)
        .bind(farm.is_active)
        .bind(farm.created_at)
        .bind(farm.updated_at)
        .fetch_one(self.db.pool())
        .await?;
        Ok(stored)
    }

    /// Fetches a farm together with all of its animals and users.
    pub async fn get_farm(&self, farm_id: Uuid) -> Result<Farm, DbError> {
        let farm = sqlx::query_as::<_, Farm>(&format!(
            "SELECT {FARM_COLUMNS} FROM farms WHERE id = $1"
        ))
        .bind(farm_id)
        .fetch_optional(self.db.pool())
        .await?
        .ok_or(DbError::NotFound)?;

        let mut farms = vec![farm];
        load_relations(self.db.pool(), &mut farms).await?;
        Ok(farms.remove(0))
    }

    /// Fetches farms (newest first) with their animals and users loaded.
    pub async fn list_farms(&self, include_inactive: bool) -> Result<Vec<Farm>, DbError> {
        let mut farms = sqlx::query_as::<_, Farm>(&format!(
            "SELECT {FARM_COLUMNS} FROM farms WHERE is_active OR $1 ORDER BY created_at DESC"
        ))
        .bind(include_inactive)
        .fetch_all(self.db.pool())
        .await?;

        load_relations(self.db.pool(), &mut farms).await?;
        Ok(farms)
    }

    /// Writes back the mutable columns of a farm that was loaded and modified.
    pub async fn save_farm(&self, farm: &Farm) -> Result<(), DbError> {
        let result = sqlx::query(
            r#"
            UPDATE farms
            SET name = $2, location = $3, owner_name = $4, owner_email = $5, owner_phone = $6,
                total_area = $7, description = $8, is_active = $9, updated_at = $10
            WHERE id = $1
            "#,
        )
        .bind(farm.id)
        .bind(&farm.name)
        .bind(&farm.location)
        .bind(&farm.owner_name)
        .bind(&farm.owner_email)
        .bind(&farm.owner_phone)
        .bind(farm.total_area)
        .bind(&farm.description)
        .bind(farm.is_active)
        .bind(farm.updated_at)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    /// Soft-deletes a farm. Its animals keep their own active flag.
    pub async fn deactivate_farm(&self, farm_id: Uuid) -> Result<Farm, DbError> {
        let farm = self
            .db
            .transaction(move |conn| {
                Box::pin(async move {
                    let mut farm = sqlx::query_as::<_, Farm>(&format!(
                        "SELECT {FARM_COLUMNS} FROM farms WHERE id = $1 FOR UPDATE"
                    ))
                    .bind(farm_id)
                    .fetch_optional(&mut *conn)
                    .await?
                    .ok_or(DbError::NotFound)?;

                    if !farm.is_active {
                        return Ok(farm);
                    }
                    farm.deactivate();

                    sqlx::query("UPDATE farms SET is_active = $2, updated_at = $3 WHERE id = $1")
                        .bind(farm.id)
                        .bind(farm.is_active)
                        .bind(farm.updated_at)
                        .execute(&mut *conn)
                        .await?;

                    tracing::info!(farm_id = %farm.id, "Farm deactivated");
                    Ok::<_, DbError>(farm)
                })
            })
            .await?;
        Ok(farm)
    }
}

/// Loads the animals and users of every farm in `farms` with one query each.
async fn load_relations(pool: &PgPool, farms: &mut [Farm]) -> Result<(), DbError> {
    if farms.is_empty() {
        return Ok(());
    }
    let ids: Vec<Uuid> = farms.iter().map(|farm| farm.id).collect();

    let animals_future = sqlx::query_as::<_, Animal>(
        r#"
        SELECT id, ear_tag, name, breed, birth_date, sex, mother_id, father_id, farm_id,
               is_active, created_at, updated_at
        FROM animals
        WHERE farm_id = ANY($1)
        ORDER BY ear_tag ASC
        "#,
    )
    .bind(&ids)
    .fetch_all(pool);

    let users_future = sqlx::query_as::<_, User>(
        r#"
        SELECT id, email, name, role, farm_id, created_at, updated_at
        FROM users
        WHERE farm_id = ANY($1)
        ORDER BY name ASC
        "#,
    )
    .bind(&ids)
    .fetch_all(pool);

    let (animals_res, users_res) = tokio::join!(animals_future, users_future);

    let mut animals_by_farm: HashMap<Uuid, Vec<Animal>> = HashMap::new();
    for animal in animals_res? {
        animals_by_farm.entry(animal.farm_id).or_default().push(animal);
    }
    let mut users_by_farm: HashMap<Uuid, Vec<User>> = HashMap::new();
    for user in users_res? {
        if let Some(farm_id) = user.farm_id {
            users_by_farm.entry(farm_id).or_default().push(user);
        }
    }

    for farm in farms.iter_mut() {
        farm.animals = animals_by_farm.remove(&farm.id).unwrap_or_default();
        farm.users = users_by_farm.remove(&farm.id).unwrap_or_default();
    }
    Ok(())
}
