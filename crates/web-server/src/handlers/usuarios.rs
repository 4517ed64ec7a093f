use super::JsonBody;
use crate::{AppState, error::AppError};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use core_types::{
    UsuarioCreateInput, UsuarioError, UsuarioLoginInput, UsuarioResponse, UsuarioUpdateInput,
    map_usuario_to_response, validate_usuario_create, validate_usuario_login,
    validate_usuario_update,
};
use database::DbError;
use identity::{IdentityError, SignUpRequest};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct UsuarioQuery {
    pub finca_id: Option<Uuid>,
    #[serde(default)]
    pub include_inactive: bool,
}

fn not_found(err: DbError) -> AppError {
    AppError::or_not_found(UsuarioError::NotFound)(err)
}

/// # GET /api/usuarios
pub async fn list_usuarios(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UsuarioQuery>,
) -> Result<Json<Vec<UsuarioResponse>>, AppError> {
    let usuarios = state
        .repo
        .list_usuarios(query.finca_id, query.include_inactive)
        .await?;
    Ok(Json(
        usuarios
            .iter()
            .map(|u| map_usuario_to_response(u, None))
            .collect(),
    ))
}

/// # POST /api/usuarios
/// Registers the account at the identity provider, then stores the profile.
pub async fn create_usuario(
    State(state): State<Arc<AppState>>,
    JsonBody(input): JsonBody<UsuarioCreateInput>,
) -> Result<(StatusCode, Json<UsuarioResponse>), AppError> {
    let rol = validate_usuario_create(&input)?;
    if state.repo.find_usuario_by_email(&input.email).await?.is_some() {
        return Err(UsuarioError::Duplicate.into());
    }

    let request = SignUpRequest {
        email: input.email.trim().to_lowercase(),
        password: input.password.clone(),
        name: input.nombre.trim().to_string(),
        role: rol,
        farm_id: input.finca_id,
    };
    let provider_sub = match state.identity.sign_up(&request).await {
        Ok(outcome) => Some(outcome.user_sub),
        Err(IdentityError::UserExists(_)) => return Err(UsuarioError::Duplicate.into()),
        Err(IdentityError::NotConfigured) => {
            tracing::warn!(email = %request.email, "Identity provider not configured; storing profile only");
            None
        }
        Err(e) => return Err(e.into()),
    };

    let usuario = state
        .repo
        .create_usuario(&input, rol)
        .await
        .map_err(|e| profile_insert_error(e, provider_sub.as_deref(), &request.email))?;
    tracing::info!(usuario_id = %usuario.id, rol = %usuario.rol, "Usuario creado");
    Ok((StatusCode::CREATED, Json(map_usuario_to_response(&usuario, None))))
}

/// Maps a failed profile insert. An account the provider already created
/// for it is left orphaned, so that is reported at error level.
fn profile_insert_error(err: DbError, provider_sub: Option<&str>, email: &str) -> AppError {
    if let Some(user_sub) = provider_sub {
        tracing::error!(
            user_sub,
            email,
            error = %err,
            "Provider account created but profile insert failed; account is orphaned"
        );
    }
    match err {
        DbError::Duplicate(_) => UsuarioError::Duplicate.into(),
        other => AppError::from(other),
    }
}

/// # GET /api/usuarios/:id
pub async fn get_usuario(
    Path(usuario_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<UsuarioResponse>, AppError> {
    let usuario = state.repo.get_usuario(usuario_id).await.map_err(not_found)?;
    Ok(Json(map_usuario_to_response(&usuario, None)))
}

/// # PUT /api/usuarios/:id
pub async fn update_usuario(
    Path(usuario_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
    JsonBody(input): JsonBody<UsuarioUpdateInput>,
) -> Result<Json<UsuarioResponse>, AppError> {
    validate_usuario_update(&input)?;
    let usuario = state
        .repo
        .update_usuario(usuario_id, &input)
        .await
        .map_err(not_found)?;
    Ok(Json(map_usuario_to_response(&usuario, None)))
}

/// # DELETE /api/usuarios/:id
pub async fn delete_usuario(
    Path(usuario_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<UsuarioResponse>, AppError> {
    let usuario = state
        .repo
        .deactivate_usuario(usuario_id)
        .await
        .map_err(not_found)?;
    Ok(Json(map_usuario_to_response(&usuario, None)))
}

/// # POST /api/usuarios/login
/// Returns the profile with the provider's id token attached.
pub async fn login_usuario(
    State(state): State<Arc<AppState>>,
    JsonBody(input): JsonBody<UsuarioLoginInput>,
) -> Result<Json<UsuarioResponse>, AppError> {
    validate_usuario_login(&input)?;
    let tokens = state
        .identity
        .authenticate(input.email.trim(), &input.password)
        .await?;

    let usuario = state
        .repo
        .touch_last_access(&input.email)
        .await?
        .ok_or(UsuarioError::NotFound)?;
    Ok(Json(map_usuario_to_response(&usuario, Some(tokens.id_token))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_insert_duplicate_is_a_conflict() {
        let err = profile_insert_error(
            DbError::Duplicate("usuarios_email_key".into()),
            Some("1b2c3d4e-sub"),
            "laura@bovitrack.co",
        );
        assert!(matches!(err, AppError::Usuario(UsuarioError::Duplicate)));
    }

    #[test]
    fn profile_insert_failure_after_sign_up_stays_a_database_error() {
        let err = profile_insert_error(
            DbError::Query(sqlx::Error::PoolClosed),
            Some("1b2c3d4e-sub"),
            "laura@bovitrack.co",
        );
        assert!(matches!(err, AppError::Database(DbError::Query(_))));

        let err = profile_insert_error(DbError::NotFound, None, "laura@bovitrack.co");
        assert!(matches!(err, AppError::Database(DbError::NotFound)));
    }
}
