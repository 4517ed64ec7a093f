use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use core_types::{AnimalError, FarmError, FincaError, UsuarioError};
use database::DbError;
use identity::IdentityError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),
    #[error(transparent)]
    Farm(#[from] FarmError),
    #[error(transparent)]
    Animal(#[from] AnimalError),
    #[error(transparent)]
    Finca(#[from] FincaError),
    #[error(transparent)]
    Usuario(#[from] UsuarioError),
    #[error("Identity provider error: {0}")]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Body(#[from] JsonRejection),
}

impl AppError {
    /// Turns `DbError::NotFound` into the given entity error; passes the rest through.
    pub fn or_not_found<E: Into<AppError>>(not_found: E) -> impl FnOnce(DbError) -> AppError {
        move |err| match err {
            DbError::NotFound => not_found.into(),
            other => other.into(),
        }
    }

    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::Farm(FarmError::Validation(_))
            | AppError::Animal(AnimalError::Validation(_))
            | AppError::Finca(FincaError::Validation(_))
            | AppError::Usuario(UsuarioError::Validation(_)) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            AppError::Farm(FarmError::NotFound)
            | AppError::Animal(AnimalError::NotFound)
            | AppError::Finca(FincaError::NotFound)
            | AppError::Usuario(UsuarioError::NotFound) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Body(rejection) => (rejection.status(), rejection.body_text()),
            AppError::Database(DbError::NotFound) => {
                (StatusCode::NOT_FOUND, "Recurso no encontrado".to_string())
            }
            AppError::Animal(AnimalError::DuplicateEarTag(_))
            | AppError::Usuario(UsuarioError::Duplicate)
            | AppError::Identity(IdentityError::UserExists(_)) => {
                (StatusCode::CONFLICT, self.to_string())
            }
            AppError::Database(DbError::Duplicate(_)) => {
                (StatusCode::CONFLICT, "El registro ya existe".to_string())
            }
            AppError::Identity(err @ (IdentityError::NotAuthorized(_) | IdentityError::NoSession)) => {
                (StatusCode::UNAUTHORIZED, err.user_message())
            }
            AppError::Identity(IdentityError::Provider { message, .. }) => {
                (StatusCode::BAD_REQUEST, message.clone())
            }
            AppError::Database(db_err) => {
                tracing::error!(error = ?db_err, "Database error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal database error occurred".to_string(),
                )
            }
            AppError::Identity(id_err) => {
                tracing::error!(error = ?id_err, "Identity provider error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An authentication service error occurred".to_string(),
                )
            }
        }
    }
}

/// Converts our custom `AppError` into an HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = self.status_and_message();
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(err: impl Into<AppError>) -> StatusCode {
        err.into().status_and_message().0
    }

    #[test]
    fn validation_errors_are_bad_requests() {
        assert_eq!(
            status(FincaError::Validation("Nombre de finca requerido".into())),
            StatusCode::BAD_REQUEST
        );
        let (code, message) = AppError::from(FarmError::Validation(vec![
            "El nombre de la finca es requerido".into(),
            "La ubicación es requerida".into(),
        ]))
        .status_and_message();
        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert_eq!(
            message,
            "El nombre de la finca es requerido; La ubicación es requerida"
        );
    }

    #[test]
    fn not_found_and_duplicates() {
        assert_eq!(status(UsuarioError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status(DbError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status(UsuarioError::Duplicate), StatusCode::CONFLICT);
        assert_eq!(
            status(DbError::Duplicate("usuarios_email_key".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(AnimalError::DuplicateEarTag("CO-001".into())),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn or_not_found_substitutes_the_entity_error() {
        let mapped = AppError::or_not_found(FincaError::NotFound)(DbError::NotFound);
        let (code, message) = mapped.status_and_message();
        assert_eq!(code, StatusCode::NOT_FOUND);
        assert_eq!(message, "Finca no encontrada");

        let passed = AppError::or_not_found(FincaError::NotFound)(DbError::Duplicate("x".into()));
        assert!(matches!(passed, AppError::Database(DbError::Duplicate(_))));
    }

    #[test]
    fn identity_errors() {
        assert_eq!(
            status(IdentityError::NotAuthorized("Incorrect username or password.".into())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(status(IdentityError::NoSession), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status(IdentityError::UserExists("User already exists".into())),
            StatusCode::CONFLICT
        );
        let (code, message) = AppError::from(IdentityError::NotConfigured).status_and_message();
        assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "An authentication service error occurred");
    }
}
