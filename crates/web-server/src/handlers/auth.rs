use super::JsonBody;
use crate::{AppState, error::AppError};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
};
use core_types::User;
use identity::{AuthTokens, IdentityError, SignUpOutcome, SignUpRequest, session_user_from_token};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: User,
    pub tokens: AuthTokens,
}

/// # POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    JsonBody(request): JsonBody<SignUpRequest>,
) -> Result<(StatusCode, Json<SignUpOutcome>), AppError> {
    let outcome = state.identity.sign_up(&request).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// # POST /api/auth/login
/// Signs in at the provider and mirrors the account into `users`.
pub async fn login(
    State(state): State<Arc<AppState>>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let tokens = state
        .identity
        .authenticate(&request.email, &request.password)
        .await?;
    let session_user = session_user_from_token(&tokens.id_token)?;
    let user = state.repo.upsert_user(&session_user).await?;

    tracing::info!(user_id = %user.id, role = %user.role, "User signed in");
    Ok(Json(LoginResponse { user, tokens }))
}

/// # POST /api/auth/logout
/// Expects `Authorization: Bearer <access token>`.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let access_token = bearer_token(&headers).ok_or(IdentityError::NoSession)?;
    state.identity.sign_out(access_token).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extracts_bearer_tokens_only() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer eyJraWQ"));
        assert_eq!(bearer_token(&headers), Some("eyJraWQ"));
    }
}
