use super::{JsonBody, ListQuery};
use crate::{AppState, error::AppError};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use core_types::{
    FincaCreateInput, FincaError, FincaResponse, FincaUpdateInput, map_finca_to_response,
    validate_finca_create, validate_finca_update,
};
use std::sync::Arc;
use uuid::Uuid;

/// # GET /api/fincas
pub async fn list_fincas(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<FincaResponse>>, AppError> {
    let fincas = state.repo.list_fincas(query.include_inactive).await?;
    Ok(Json(
        fincas
            .iter()
            .map(|row| map_finca_to_response(&row.finca, Some(row.total_animales)))
            .collect(),
    ))
}

/// # POST /api/fincas
pub async fn create_finca(
    State(state): State<Arc<AppState>>,
    JsonBody(input): JsonBody<FincaCreateInput>,
) -> Result<(StatusCode, Json<FincaResponse>), AppError> {
    validate_finca_create(&input)?;
    let finca = state.repo.create_finca(&input).await?;
    tracing::info!(finca_id = %finca.id, nombre = %finca.nombre, "Finca creada");
    Ok((StatusCode::CREATED, Json(map_finca_to_response(&finca, Some(0)))))
}

/// # GET /api/fincas/:id
pub async fn get_finca(
    Path(finca_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<FincaResponse>, AppError> {
    let row = state
        .repo
        .get_finca(finca_id)
        .await
        .map_err(AppError::or_not_found(FincaError::NotFound))?;
    Ok(Json(map_finca_to_response(&row.finca, Some(row.total_animales))))
}

/// # PUT /api/fincas/:id
pub async fn update_finca(
    Path(finca_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
    JsonBody(input): JsonBody<FincaUpdateInput>,
) -> Result<Json<FincaResponse>, AppError> {
    validate_finca_update(&input)?;
    let finca = state
        .repo
        .update_finca(finca_id, &input)
        .await
        .map_err(AppError::or_not_found(FincaError::NotFound))?;
    Ok(Json(map_finca_to_response(&finca, None)))
}

/// # DELETE /api/fincas/:id
pub async fn delete_finca(
    Path(finca_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<FincaResponse>, AppError> {
    let finca = state
        .repo
        .deactivate_finca(finca_id)
        .await
        .map_err(AppError::or_not_found(FincaError::NotFound))?;
    Ok(Json(map_finca_to_response(&finca, None)))
}
