use super::DbRepository;
use crate::error::DbError;
use core_types::{UserRole, Usuario, UsuarioCreateInput, UsuarioUpdateInput};
use uuid::Uuid;

const USUARIO_COLUMNS: &str = "id, email, nombre, rol, finca_id, fecha_creacion, \
     fecha_actualizacion, activo, telefono, direccion, ultimo_acceso";

impl DbRepository {
    /// Inserts a validated registration. The password is not stored.
    /// An email that is already registered yields `DbError::Duplicate`.
    pub async fn create_usuario(
        &self,
        input: &UsuarioCreateInput,
        rol: UserRole,
    ) -> Result<Usuario, DbError> {
        let usuario = sqlx::query_as::<_, Usuario>(&format!(
            r#"
            INSERT INTO usuarios (id, email, nombre, rol, finca_id, telefono, direccion)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USUARIO_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(input.email.trim().to_lowercase())
        .bind(input.nombre.trim())
        .bind(rol)
        .bind(input.finca_id)
        .bind(&input.telefono)
        .bind(&input.direccion)
        .fetch_one(self.db.pool())
        .await?;
        Ok(usuario)
    }

    pub async fn get_usuario(&self, usuario_id: Uuid) -> Result<Usuario, DbError> {
        let usuario = sqlx::query_as::<_, Usuario>(&format!(
            "SELECT {USUARIO_COLUMNS} FROM usuarios WHERE id = $1"
        ))
        .bind(usuario_id)
        .fetch_optional(self.db.pool())
        .await?
        .ok_or(DbError::NotFound)?;
        Ok(usuario)
    }

    pub async fn find_usuario_by_email(&self, email: &str) -> Result<Option<Usuario>, DbError> {
        let usuario = sqlx::query_as::<_, Usuario>(&format!(
            "SELECT {USUARIO_COLUMNS} FROM usuarios WHERE email = $1"
        ))
        .bind(email.trim().to_lowercase())
        .fetch_optional(self.db.pool())
        .await?;
        Ok(usuario)
    }

    pub async fn list_usuarios(
        &self,
        finca_id: Option<Uuid>,
        include_inactive: bool,
    ) -> Result<Vec<Usuario>, DbError> {
        let usuarios = sqlx::query_as::<_, Usuario>(&format!(
            r#"
            SELECT {USUARIO_COLUMNS}
            FROM usuarios
            WHERE ($1::uuid IS NULL OR finca_id = $1) AND (activo OR $2)
            ORDER BY nombre ASC
            "#
        ))
        .bind(finca_id)
        .bind(include_inactive)
        .fetch_all(self.db.pool())
        .await?;
        Ok(usuarios)
    }

    /// Applies the fields present in `input`; absent fields keep their value.
    pub async fn update_usuario(
        &self,
        usuario_id: Uuid,
        input: &UsuarioUpdateInput,
    ) -> Result<Usuario, DbError> {
        let usuario = sqlx::query_as::<_, Usuario>(&format!(
            r#"
            UPDATE usuarios
            SET nombre = COALESCE($2, nombre),
                telefono = COALESCE($3, telefono),
                direccion = COALESCE($4, direccion),
                activo = COALESCE($5, activo),
                fecha_actualizacion = NOW()
            WHERE id = $1
            RETURNING {USUARIO_COLUMNS}
            "#
        ))
        .bind(usuario_id)
        .bind(input.nombre.as_deref().map(str::trim))
        .bind(&input.telefono)
        .bind(&input.direccion)
        .bind(input.activo)
        .fetch_optional(self.db.pool())
        .await?
        .ok_or(DbError::NotFound)?;
        Ok(usuario)
    }

    /// Soft-deletes an account. Already inactive accounts are returned unchanged.
    pub async fn deactivate_usuario(&self, usuario_id: Uuid) -> Result<Usuario, DbError> {
        let updated = sqlx::query_as::<_, Usuario>(&format!(
            r#"
            UPDATE usuarios SET activo = FALSE, fecha_actualizacion = NOW()
            WHERE id = $1 AND activo
            RETURNING {USUARIO_COLUMNS}
            "#
        ))
        .bind(usuario_id)
        .fetch_optional(self.db.pool())
        .await?;

        match updated {
            Some(usuario) => Ok(usuario),
            None => self.get_usuario(usuario_id).await,
        }
    }

    /// Stamps `ultimo_acceso` for an active account after a successful sign-in.
    /// Returns `None` when no active account uses that email.
    pub async fn touch_last_access(&self, email: &str) -> Result<Option<Usuario>, DbError> {
        let usuario = sqlx::query_as::<_, Usuario>(&format!(
            r#"
            UPDATE usuarios SET ultimo_acceso = NOW()
            WHERE email = $1 AND activo
            RETURNING {USUARIO_COLUMNS}
            "#
        ))
        .bind(email.trim().to_lowercase())
        .fetch_optional(self.db.pool())
        .await?;
        Ok(usuario)
    }
}
