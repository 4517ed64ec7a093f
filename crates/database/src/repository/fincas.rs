use super::DbRepository;
use crate::error::DbError;
use core_types::{Finca, FincaCreateInput, FincaUpdateInput};
use sqlx::FromRow;
use uuid::Uuid;

/// A finca row joined with the number of active animals registered under its id.
#[derive(Debug, Clone, FromRow)]
pub struct FincaWithCount {
    #[sqlx(flatten)]
    pub finca: Finca,
    pub total_animales: i64,
}

const FINCA_WITH_COUNT: &str = r#"
    SELECT f.id, f.nombre, f.ubicacion, f.propietario, f.fecha_registro, f.fecha_actualizacion,
           f.activa, f.hectareas, f.capacidad_maxima, f.telefono_contacto, f.email_contacto,
           (SELECT COUNT(*) FROM animals a WHERE a.farm_id = f.id AND a.is_active) AS total_animales
    FROM fincas f
"#;

const FINCA_RETURNING: &str = "RETURNING id, nombre, ubicacion, propietario, fecha_registro, \
     fecha_actualizacion, activa, hectareas, capacidad_maxima, telefono_contacto, email_contacto";

impl DbRepository {
    /// Inserts a validated creation request.
    pub async fn create_finca(&self, input: &FincaCreateInput) -> Result<Finca, DbError> {
        let finca = sqlx::query_as::<_, Finca>(&format!(
            r#"
            INSERT INTO fincas (id, nombre, ubicacion, propietario, hectareas, capacidad_maxima,
                                telefono_contacto, email_contacto)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            {FINCA_RETURNING}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(input.nombre.trim())
        .bind(input.ubicacion.trim())
        .bind(input.propietario.trim())
        .bind(input.hectareas)
        .bind(input.capacidad_maxima)
        .bind(&input.telefono_contacto)
        .bind(&input.email_contacto)
        .fetch_one(self.db.pool())
        .await?;
        Ok(finca)
    }

    pub async fn get_finca(&self, finca_id: Uuid) -> Result<FincaWithCount, DbError> {
        let finca = sqlx::query_as::<_, FincaWithCount>(&format!(
            "{FINCA_WITH_COUNT} WHERE f.id = $1"
        ))
        .bind(finca_id)
        .fetch_optional(self.db.pool())
        .await?
        .ok_or(DbError::NotFound)?;
        Ok(finca)
    }

    pub async fn list_fincas(&self, include_inactive: bool) -> Result<Vec<FincaWithCount>, DbError> {
        let fincas = sqlx::query_as::<_, FincaWithCount>(&format!(
            "{FINCA_WITH_COUNT} WHERE f.activa OR $1 ORDER BY f.nombre ASC"
        ))
        .bind(include_inactive)
        .fetch_all(self.db.pool())
        .await?;
        Ok(fincas)
    }

    /// Applies the fields present in `input`; absent fields keep their value.
    pub async fn update_finca(
        &self,
        finca_id: Uuid,
        input: &FincaUpdateInput,
    ) -> Result<Finca, DbError> {
        let finca = sqlx::query_as::<_, Finca>(&format!(
            r#"
            UPDATE fincas
            SET nombre = COALESCE($2, nombre),
                ubicacion = COALESCE($3, ubicacion),
                propietario = COALESCE($4, propietario),
                hectareas = COALESCE($5, hectareas),
                capacidad_maxima = COALESCE($6, capacidad_maxima),
                telefono_contacto = COALESCE($7, telefono_contacto),
                email_contacto = COALESCE($8, email_contacto),
                activa = COALESCE($9, activa),
                fecha_actualizacion = NOW()
            WHERE id = $1
            {FINCA_RETURNING}
            "#
        ))
        .bind(finca_id)
        .bind(input.nombre.as_deref().map(str::trim))
        .bind(input.ubicacion.as_deref().map(str::trim))
        .bind(input.propietario.as_deref().map(str::trim))
        .bind(input.hectareas)
        .bind(input.capacidad_maxima)
        .bind(&input.telefono_contacto)
        .bind(&input.email_contacto)
        .bind(input.activa)
        .fetch_optional(self.db.pool())
        .await?
        .ok_or(DbError::NotFound)?;
        Ok(finca)
    }

    /// Soft-deletes a finca. Already inactive fincas are returned unchanged.
    pub async fn deactivate_finca(&self, finca_id: Uuid) -> Result<Finca, DbError> {
        let updated = sqlx::query_as::<_, Finca>(&format!(
            "UPDATE fincas SET activa = FALSE, fecha_actualizacion = NOW() WHERE id = $1 AND activa {FINCA_RETURNING}"
        ))
        .bind(finca_id)
        .fetch_optional(self.db.pool())
        .await?;

        match updated {
            Some(finca) => Ok(finca),
            None => Ok(self.get_finca(finca_id).await?.finca),
        }
    }
}
