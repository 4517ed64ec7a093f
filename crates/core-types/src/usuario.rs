use crate::enums::UserRole;
use crate::error::UsuarioError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// A row of the `usuarios` table. Passwords are held by the identity provider, never here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Usuario {
    pub id: Uuid,
    pub email: String,
    pub nombre: String,
    pub rol: UserRole,
    pub finca_id: Option<Uuid>,
    pub fecha_creacion: DateTime<Utc>,
    pub fecha_actualizacion: DateTime<Utc>,
    pub activo: bool,
    pub telefono: Option<String>,
    pub direccion: Option<String>,
    pub ultimo_acceso: Option<DateTime<Utc>>,
}

/// Registration request. `rol` stays a string until validated so that an
/// unknown role surfaces as a validation error, not a malformed body.
#[derive(Clone, Default, Deserialize)]
pub struct UsuarioCreateInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub rol: String,
    pub finca_id: Option<Uuid>,
    pub telefono: Option<String>,
    pub direccion: Option<String>,
}

impl fmt::Debug for UsuarioCreateInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UsuarioCreateInput")
            .field("email", &self.email)
            .field("nombre", &self.nombre)
            .field("password", &"<redacted>")
            .field("rol", &self.rol)
            .field("finca_id", &self.finca_id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsuarioUpdateInput {
    pub nombre: Option<String>,
    pub telefono: Option<String>,
    pub direccion: Option<String>,
    pub activo: Option<bool>,
}

#[derive(Clone, Deserialize)]
pub struct UsuarioLoginInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for UsuarioLoginInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UsuarioLoginInput")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// API shape of an account. Carries the session token after a login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsuarioResponse {
    pub id: Uuid,
    pub email: String,
    pub nombre: String,
    pub rol: UserRole,
    pub finca_id: Option<Uuid>,
    pub fecha_creacion: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direccion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

fn invalid(message: &str) -> UsuarioError {
    UsuarioError::Validation(message.to_string())
}

/// Checks a registration request, reporting the first violated rule.
/// On success returns the parsed role.
pub fn validate_usuario_create(input: &UsuarioCreateInput) -> Result<UserRole, UsuarioError> {
    if !input.email.contains('@') {
        return Err(invalid("Email inválido"));
    }
    if input.nombre.trim().chars().count() < 2 {
        return Err(invalid("Nombre debe tener al menos 2 caracteres"));
    }
    if input.password.chars().count() < 8 {
        return Err(invalid("Contraseña debe tener al menos 8 caracteres"));
    }
    // Only the canonical spelling is accepted from API clients.
    UserRole::ALL
        .into_iter()
        .find(|role| role.as_str() == input.rol)
        .ok_or_else(|| invalid("Rol inválido"))
}

pub fn validate_usuario_update(input: &UsuarioUpdateInput) -> Result<(), UsuarioError> {
    if input
        .nombre
        .as_deref()
        .is_some_and(|nombre| nombre.trim().chars().count() < 2)
    {
        return Err(invalid("Nombre debe tener al menos 2 caracteres"));
    }
    Ok(())
}

pub fn validate_usuario_login(input: &UsuarioLoginInput) -> Result<(), UsuarioError> {
    if !input.email.contains('@') {
        return Err(invalid("Email inválido"));
    }
    if input.password.is_empty() {
        return Err(invalid("Contraseña requerida"));
    }
    Ok(())
}

pub fn map_usuario_to_response(usuario: &Usuario, token: Option<String>) -> UsuarioResponse {
    UsuarioResponse {
        id: usuario.id,
        email: usuario.email.clone(),
        nombre: usuario.nombre.clone(),
        rol: usuario.rol,
        finca_id: usuario.finca_id,
        fecha_creacion: usuario.fecha_creacion,
        telefono: usuario.telefono.clone(),
        direccion: usuario.direccion.clone(),
        token,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_input() -> UsuarioCreateInput {
        UsuarioCreateInput {
            email: "a@b.com".to_string(),
            nombre: "Ana".to_string(),
            password: "12345678".to_string(),
            rol: "PRODUCTOR".to_string(),
            ..Default::default()
        }
    }

    fn rejection(input: &UsuarioCreateInput) -> String {
        match validate_usuario_create(input) {
            Err(UsuarioError::Validation(msg)) => msg,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn accepts_minimal_valid_input() {
        assert_eq!(validate_usuario_create(&minimal_input()), Ok(UserRole::Productor));

        let mut vet = minimal_input();
        vet.rol = "VETERINARIO".to_string();
        assert_eq!(validate_usuario_create(&vet), Ok(UserRole::Veterinario));
    }

    #[test]
    fn rejects_email_without_at_sign() {
        let mut input = minimal_input();
        input.email = "ab.com".to_string();
        assert_eq!(rejection(&input), "Email inválido");
    }

    #[test]
    fn rejects_short_name() {
        let mut input = minimal_input();
        input.nombre = " A ".to_string();
        assert_eq!(rejection(&input), "Nombre debe tener al menos 2 caracteres");
    }

    #[test]
    fn rejects_short_password() {
        let mut input = minimal_input();
        input.password = "1234567".to_string();
        assert_eq!(rejection(&input), "Contraseña debe tener al menos 8 caracteres");
    }

    #[test]
    fn rejects_unknown_roles() {
        for rol in ["GANADERO", "productor", "admin", ""] {
            let mut input = minimal_input();
            input.rol = rol.to_string();
            assert_eq!(rejection(&input), "Rol inválido", "role {rol:?}");
        }
    }

    #[test]
    fn unknown_role_in_json_is_a_validation_error() {
        let input: UsuarioCreateInput = serde_json::from_str(
            r#"{"email":"a@b.com","nombre":"Ana","password":"12345678","rol":"DUEÑO"}"#,
        )
        .unwrap();
        assert_eq!(rejection(&input), "Rol inválido");
    }

    #[test]
    fn debug_output_hides_the_password() {
        let rendered = format!("{:?}", minimal_input());
        assert!(!rendered.contains("12345678"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn response_never_contains_password_or_internal_fields() {
        let now = Utc::now();
        let usuario = Usuario {
            id: Uuid::new_v4(),
            email: "vet@finca.co".to_string(),
            nombre: "Carlos".to_string(),
            rol: UserRole::Veterinario,
            finca_id: None,
            fecha_creacion: now,
            fecha_actualizacion: now,
            activo: true,
            telefono: Some("3001234567".to_string()),
            direccion: None,
            ultimo_acceso: Some(now),
        };

        let response = map_usuario_to_response(&usuario, None);
        assert_eq!(response.direccion, None);
        assert_eq!(response.token, None);
        assert_eq!(response.telefono.as_deref(), Some("3001234567"));

        let json = serde_json::to_value(&response).unwrap();
        let object = json.as_object().unwrap();
        for hidden in ["password", "fecha_actualizacion", "activo", "ultimo_acceso", "direccion", "token"] {
            assert!(!object.contains_key(hidden), "{hidden} leaked");
        }
        // A missing farm is an explicit null, not an absent key.
        assert!(object["finca_id"].is_null());
        assert_eq!(object["rol"], "VETERINARIO");

        let with_token = map_usuario_to_response(&usuario, Some("id-token".to_string()));
        assert_eq!(with_token.token.as_deref(), Some("id-token"));
    }

    #[test]
    fn update_and_login_rules() {
        assert_eq!(validate_usuario_update(&UsuarioUpdateInput::default()), Ok(()));
        let update = UsuarioUpdateInput { nombre: Some("B".to_string()), ..Default::default() };
        assert!(validate_usuario_update(&update).is_err());

        let login = UsuarioLoginInput { email: "a@b.com".to_string(), password: String::new() };
        assert!(validate_usuario_login(&login).is_err());
        let login = UsuarioLoginInput { email: "a@b.com".to_string(), password: "secreto123".to_string() };
        assert_eq!(validate_usuario_login(&login), Ok(()));
    }
}
