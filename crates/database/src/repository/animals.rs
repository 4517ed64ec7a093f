use super::DbRepository;
use crate::error::DbError;
use chrono::Utc;
use core_types::{Animal, NewVeterinaryVisit, NewWeightRecord, VeterinaryVisit, WeightRecord};
use sqlx::postgres::PgConnection;
use uuid::Uuid;

const ANIMAL_COLUMNS: &str = "id, ear_tag, name, breed, birth_date, sex, mother_id, father_id, \
     farm_id, is_active, created_at, updated_at";

impl DbRepository {
    /// Inserts a new animal. A reused ear tag yields `DbError::Duplicate`.
    pub async fn create_animal(&self, animal: &Animal) -> Result<Animal, DbError> {
        let stored = sqlx::query_as::<_, Animal>(&format!(
            r#"
            INSERT INTO animals (id, ear_tag, name, breed, birth_date, sex, mother_id, father_id,
                                 farm_id, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {ANIMAL_COLUMNS}
            "#
        ))
        .bind(animal.id)
        .bind(&animal.ear_tag)
        .bind(&animal.name)
        .bind(&animal.breed)
        .bind(animal.birth_date)
        .bind(animal.sex)
        .bind(animal.mother_id)
        .bind(animal.father_id)
        .bind(animal.farm_id)
        .bind(animal.is_active)
        .bind(animal.created_at)
        .bind(animal.updated_at)
        .fetch_one(self.db.pool())
        .await?;
        Ok(stored)
    }

    /// Fetches an animal with its full weight history and visit log.
    pub async fn get_animal(&self, animal_id: Uuid) -> Result<Animal, DbError> {
        let sql = format!("SELECT {ANIMAL_COLUMNS} FROM animals WHERE id = $1");
        let animal_future = sqlx::query_as::<_, Animal>(&sql)
            .bind(animal_id)
            .fetch_optional(self.db.pool());

        let (animal_res, weights_res, visits_res) = tokio::join!(
            animal_future,
            self.list_weight_records(animal_id),
            self.list_veterinary_visits(animal_id)
        );

        let mut animal = animal_res?.ok_or(DbError::NotFound)?;
        animal.weight_records = weights_res?;
        animal.veterinary_visits = visits_res?;
        Ok(animal)
    }

    /// Lists animals by ear tag, optionally restricted to one farm.
    pub async fn list_animals(
        &self,
        farm_id: Option<Uuid>,
        include_inactive: bool,
    ) -> Result<Vec<Animal>, DbError> {
        let animals = sqlx::query_as::<_, Animal>(&format!(
            r#"
            SELECT {ANIMAL_COLUMNS}
            FROM animals
            WHERE ($1::uuid IS NULL OR farm_id = $1) AND (is_active OR $2)
            ORDER BY ear_tag ASC
            "#
        ))
        .bind(farm_id)
        .bind(include_inactive)
        .fetch_all(self.db.pool())
        .await?;
        Ok(animals)
    }

    /// Writes back the mutable columns of an animal that was loaded and modified.
    pub async fn save_animal(&self, animal: &Animal) -> Result<(), DbError> {
        let result = sqlx::query(
            r#"
            UPDATE animals
            SET name = $2, breed = $3, birth_date = $4, mother_id = $5, father_id = $6,
                is_active = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(animal.id)
        .bind(&animal.name)
        .bind(&animal.breed)
        .bind(animal.birth_date)
        .bind(animal.mother_id)
        .bind(animal.father_id)
        .bind(animal.is_active)
        .bind(animal.updated_at)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    pub async fn deactivate_animal(&self, animal_id: Uuid) -> Result<Animal, DbError> {
        let mut animal = self.get_animal(animal_id).await?;
        if animal.is_active {
            animal.deactivate();
            self.save_animal(&animal).await?;
        }
        Ok(animal)
    }

    /// Records a weighing and bumps the animal's `updated_at`, atomically.
    pub async fn add_weight_record(
        &self,
        animal_id: Uuid,
        input: &NewWeightRecord,
    ) -> Result<WeightRecord, DbError> {
        let now = Utc::now();
        let record = WeightRecord {
            id: Uuid::new_v4(),
            animal_id,
            weight: input.weight,
            recorded_at: input.recorded_at.unwrap_or(now),
            notes: input.notes.clone(),
            created_at: now,
        };

        self.db
            .transaction(move |conn| {
                Box::pin(async move {
                    touch_animal(conn, animal_id).await?;
                    let stored = sqlx::query_as::<_, WeightRecord>(
                        r#"
                        INSERT INTO weight_records (id, animal_id, weight, recorded_at, notes, created_at)
                        VALUES ($1, $2, $3, $4, $5, $6)
                        RETURNING id, animal_id, weight, recorded_at, notes, created_at
                        "#,
                    )
                    .bind(record.id)
                    .bind(record.animal_id)
                    .bind(record.weight)
                    .bind(record.recorded_at)
                    .bind(&record.notes)
                    .bind(record.created_at)
                    .fetch_one(&mut *conn)
                    .await?;
                    Ok::<_, DbError>(stored)
                })
            })
            .await
    }

    /// All weighings of one animal, oldest first.
    pub async fn list_weight_records(&self, animal_id: Uuid) -> Result<Vec<WeightRecord>, DbError> {
        let records = sqlx::query_as::<_, WeightRecord>(
            r#"
            SELECT id, animal_id, weight, recorded_at, notes, created_at
            FROM weight_records
            WHERE animal_id = $1
            ORDER BY recorded_at ASC
            "#,
        )
        .bind(animal_id)
        .fetch_all(self.db.pool())
        .await?;
        Ok(records)
    }

    /// Records a veterinary visit and bumps the animal's `updated_at`, atomically.
    pub async fn add_veterinary_visit(
        &self,
        animal_id: Uuid,
        input: &NewVeterinaryVisit,
    ) -> Result<VeterinaryVisit, DbError> {
        let visit = VeterinaryVisit {
            id: Uuid::new_v4(),
            animal_id,
            visit_date: input.visit_date,
            veterinarian_name: input.veterinarian_name.trim().to_string(),
            reason: input.reason.trim().to_string(),
            diagnosis: input.diagnosis.clone(),
            treatment: input.treatment.clone(),
            notes: input.notes.clone(),
            created_at: Utc::now(),
        };

        self.db
            .transaction(move |conn| {
                Box::pin(async move {
                    touch_animal(conn, animal_id).await?;
                    let stored = sqlx::query_as::<_, VeterinaryVisit>(
                        r#"
                        INSERT INTO veterinary_visits (id, animal_id, visit_date, veterinarian_name,
                                                       reason, diagnosis, treatment, notes, created_at)
                        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                        RETURNING id, animal_id, visit_date, veterinarian_name, reason, diagnosis,
                                  treatment, notes, created_at
                        "#,
                    )
                    .bind(visit.id)
                    .bind(visit.animal_id)
                    .bind(visit.visit_date)
                    .bind(&visit.veterinarian_name)
                    .bind(&visit.reason)
                    .bind(&visit.diagnosis)
                    .bind(&visit.treatment)
                    .bind(&visit.notes)
                    .bind(visit.created_at)
                    .fetch_one(&mut *conn)
                    .await?;
                    Ok::<_, DbError>(stored)
                })
            })
            .await
    }

    /// All visits of one animal, oldest first.
    pub async fn list_veterinary_visits(
        &self,
        animal_id: Uuid,
    ) -> Result<Vec<VeterinaryVisit>, DbError> {
        let visits = sqlx::query_as::<_, VeterinaryVisit>(
            r#"
            SELECT id, animal_id, visit_date, veterinarian_name, reason, diagnosis, treatment,
                   notes, created_at
            FROM veterinary_visits
            WHERE animal_id = $1
            ORDER BY visit_date ASC
            "#,
        )
        .bind(animal_id)
        .fetch_all(self.db.pool())
        .await?;
        Ok(visits)
    }
}

/// Refreshes `updated_at` of an active animal, failing with `NotFound` otherwise.
async fn touch_animal(conn: &mut PgConnection, animal_id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE animals SET updated_at = NOW() WHERE id = $1 AND is_active")
        .bind(animal_id)
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
