use super::{JsonBody, ListQuery};
use crate::{AppState, error::AppError};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use core_types::{Animal, FarmError, FarmResponse, FarmUpdate, NewFarm, User};
use std::sync::Arc;
use uuid::Uuid;

/// # GET /api/farms
pub async fn list_farms(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<FarmResponse>>, AppError> {
    let farms = state.repo.list_farms(query.include_inactive).await?;
    Ok(Json(farms.into_iter().map(FarmResponse::from).collect()))
}

/// # POST /api/farms
pub async fn create_farm(
    State(state): State<Arc<AppState>>,
    JsonBody(input): JsonBody<NewFarm>,
) -> Result<(StatusCode, Json<FarmResponse>), AppError> {
    let farm = input.into_farm();
    let errors = farm.validate();
    if !errors.is_empty() {
        return Err(FarmError::Validation(errors).into());
    }

    let farm = state.repo.create_farm(&farm).await?;
    tracing::info!(farm_id = %farm.id, name = %farm.name, "Farm created");
    Ok((StatusCode::CREATED, Json(farm.into())))
}

/// # GET /api/farms/:id
pub async fn get_farm(
    Path(farm_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<FarmResponse>, AppError> {
    let farm = state
        .repo
        .get_farm(farm_id)
        .await
        .map_err(AppError::or_not_found(FarmError::NotFound))?;
    Ok(Json(farm.into()))
}

/// # PUT /api/farms/:id
pub async fn update_farm(
    Path(farm_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
    JsonBody(update): JsonBody<FarmUpdate>,
) -> Result<Json<FarmResponse>, AppError> {
    let mut farm = state
        .repo
        .get_farm(farm_id)
        .await
        .map_err(AppError::or_not_found(FarmError::NotFound))?;

    farm.apply_update(&update);
    let errors = farm.validate();
    if !errors.is_empty() {
        return Err(FarmError::Validation(errors).into());
    }

    state.repo.save_farm(&farm).await?;
    Ok(Json(farm.into()))
}

/// # DELETE /api/farms/:id
/// Deactivates the farm and every animal on it.
pub async fn delete_farm(
    Path(farm_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<FarmResponse>, AppError> {
    let farm = state
        .repo
        .deactivate_farm(farm_id)
        .await
        .map_err(AppError::or_not_found(FarmError::NotFound))?;
    Ok(Json(farm.into()))
}

/// # GET /api/farms/:id/animals
pub async fn farm_animals(
    Path(farm_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Animal>>, AppError> {
    let farm = state
        .repo
        .get_farm(farm_id)
        .await
        .map_err(AppError::or_not_found(FarmError::NotFound))?;

    let animals = if query.include_inactive {
        farm.animals
    } else {
        farm.active_animals().into_iter().cloned().collect()
    };
    Ok(Json(animals))
}

/// # GET /api/farms/:id/users
pub async fn farm_users(
    Path(farm_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<User>>, AppError> {
    let farm = state
        .repo
        .get_farm(farm_id)
        .await
        .map_err(AppError::or_not_found(FarmError::NotFound))?;
    Ok(Json(farm.users))
}
