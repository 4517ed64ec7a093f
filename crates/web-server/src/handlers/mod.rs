//! Request handlers, one module per resource.

pub mod animals;
pub mod auth;
pub mod farms;
pub mod fincas;
pub mod usuarios;

use crate::error::AppError;
use axum::extract::FromRequest;
use serde::Deserialize;

/// `axum::Json` whose rejections answer with the usual `{"error": ...}` body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// `?include_inactive=true` on list endpoints also returns soft-deleted rows.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub include_inactive: bool,
}
