use super::JsonBody;
use crate::{AppState, error::AppError};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use core_types::{
    Animal, AnimalError, AnimalSummary, AnimalUpdate, FarmError, NewAnimal, NewVeterinaryVisit,
    NewWeightRecord, VeterinaryVisit, WeightRecord,
};
use database::DbError;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct AnimalQuery {
    pub farm_id: Option<Uuid>,
    #[serde(default)]
    pub include_inactive: bool,
}

fn not_found(err: DbError) -> AppError {
    AppError::or_not_found(AnimalError::NotFound)(err)
}

/// # GET /api/animals?farm_id=
pub async fn list_animals(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnimalQuery>,
) -> Result<Json<Vec<Animal>>, AppError> {
    let animals = state
        .repo
        .list_animals(query.farm_id, query.include_inactive)
        .await?;
    Ok(Json(animals))
}

/// # POST /api/animals
pub async fn create_animal(
    State(state): State<Arc<AppState>>,
    JsonBody(input): JsonBody<NewAnimal>,
) -> Result<(StatusCode, Json<Animal>), AppError> {
    let animal = input.into_animal();
    let errors = animal.validate();
    if !errors.is_empty() {
        return Err(AnimalError::Validation(errors).into());
    }

    let farm = state
        .repo
        .get_farm(animal.farm_id)
        .await
        .map_err(AppError::or_not_found(FarmError::NotFound))?;
    if !farm.is_active {
        return Err(FarmError::NotFound.into());
    }

    let stored = state.repo.create_animal(&animal).await.map_err(|e| match e {
        DbError::Duplicate(_) => AnimalError::DuplicateEarTag(animal.ear_tag.clone()).into(),
        other => AppError::from(other),
    })?;
    tracing::info!(animal_id = %stored.id, ear_tag = %stored.ear_tag, farm_id = %stored.farm_id, "Animal registered");
    Ok((StatusCode::CREATED, Json(stored)))
}

/// # GET /api/animals/:id
pub async fn get_animal(
    Path(animal_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Animal>, AppError> {
    let animal = state.repo.get_animal(animal_id).await.map_err(not_found)?;
    Ok(Json(animal))
}

/// # PUT /api/animals/:id
pub async fn update_animal(
    Path(animal_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
    JsonBody(update): JsonBody<AnimalUpdate>,
) -> Result<Json<Animal>, AppError> {
    let mut animal = state.repo.get_animal(animal_id).await.map_err(not_found)?;
    animal.update_details(
        update.name.as_deref(),
        update.breed.as_deref(),
        update.birth_date,
    );
    let errors = animal.validate();
    if !errors.is_empty() {
        return Err(AnimalError::Validation(errors).into());
    }

    state.repo.save_animal(&animal).await.map_err(not_found)?;
    Ok(Json(animal))
}

/// # DELETE /api/animals/:id
pub async fn delete_animal(
    Path(animal_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Animal>, AppError> {
    let animal = state
        .repo
        .deactivate_animal(animal_id)
        .await
        .map_err(not_found)?;
    Ok(Json(animal))
}

/// # GET /api/animals/:id/summary
/// Age, current weight, weight history and last visit in one payload.
pub async fn animal_summary(
    Path(animal_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<AnimalSummary>, AppError> {
    let animal = state.repo.get_animal(animal_id).await.map_err(not_found)?;
    Ok(Json(AnimalSummary::from_animal(
        &animal,
        Utc::now().date_naive(),
    )))
}

/// # GET /api/animals/:id/weights
pub async fn list_weights(
    Path(animal_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<WeightRecord>>, AppError> {
    let animal = state.repo.get_animal(animal_id).await.map_err(not_found)?;
    Ok(Json(animal.weight_records))
}

/// # POST /api/animals/:id/weights
pub async fn add_weight(
    Path(animal_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
    JsonBody(input): JsonBody<NewWeightRecord>,
) -> Result<(StatusCode, Json<WeightRecord>), AppError> {
    let errors = input.validate();
    if !errors.is_empty() {
        return Err(AnimalError::Validation(errors).into());
    }
    let record = state
        .repo
        .add_weight_record(animal_id, &input)
        .await
        .map_err(not_found)?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// # GET /api/animals/:id/visits
pub async fn list_visits(
    Path(animal_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<VeterinaryVisit>>, AppError> {
    let animal = state.repo.get_animal(animal_id).await.map_err(not_found)?;
    Ok(Json(animal.veterinary_visits))
}

/// # POST /api/animals/:id/visits
pub async fn add_visit(
    Path(animal_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
    JsonBody(input): JsonBody<NewVeterinaryVisit>,
) -> Result<(StatusCode, Json<VeterinaryVisit>), AppError> {
    let errors = input.validate();
    if !errors.is_empty() {
        return Err(AnimalError::Validation(errors).into());
    }
    let visit = state
        .repo
        .add_veterinary_visit(animal_id, &input)
        .await
        .map_err(not_found)?;
    Ok((StatusCode::CREATED, Json(visit)))
}
