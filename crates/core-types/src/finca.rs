use crate::error::FincaError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A row of the `fincas` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Finca {
    pub id: Uuid,
    pub nombre: String,
    pub ubicacion: String,
    pub propietario: String,
    pub fecha_registro: DateTime<Utc>,
    pub fecha_actualizacion: DateTime<Utc>,
    pub activa: bool,
    pub hectareas: Option<Decimal>,
    pub capacidad_maxima: Option<i32>,
    pub telefono_contacto: Option<String>,
    pub email_contacto: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FincaCreateInput {
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub ubicacion: String,
    #[serde(default)]
    pub propietario: String,
    pub hectareas: Option<Decimal>,
    pub capacidad_maxima: Option<i32>,
    pub telefono_contacto: Option<String>,
    pub email_contacto: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FincaUpdateInput {
    pub nombre: Option<String>,
    pub ubicacion: Option<String>,
    pub propietario: Option<String>,
    pub hectareas: Option<Decimal>,
    pub capacidad_maxima: Option<i32>,
    pub telefono_contacto: Option<String>,
    pub email_contacto: Option<String>,
    pub activa: Option<bool>,
}

/// API shape of a finca. `fecha_actualizacion` is internal and never exposed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FincaResponse {
    pub id: Uuid,
    pub nombre: String,
    pub ubicacion: String,
    pub propietario: String,
    pub fecha_registro: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hectareas: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacidad_maxima: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefono_contacto: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_contacto: Option<String>,
    pub activa: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_animales: Option<i64>,
}

fn trimmed_len(value: &str) -> usize {
    value.trim().chars().count()
}

fn check_nombre(nombre: &str) -> Result<(), FincaError> {
    if trimmed_len(nombre) < 2 {
        return Err(FincaError::Validation(
            "Nombre debe tener al menos 2 caracteres".to_string(),
        ));
    }
    Ok(())
}

fn check_ubicacion(ubicacion: &str) -> Result<(), FincaError> {
    if trimmed_len(ubicacion) < 5 {
        return Err(FincaError::Validation(
            "Ubicación debe tener al menos 5 caracteres".to_string(),
        ));
    }
    Ok(())
}

fn check_propietario(propietario: &str) -> Result<(), FincaError> {
    if trimmed_len(propietario) < 2 {
        return Err(FincaError::Validation(
            "Propietario debe tener al menos 2 caracteres".to_string(),
        ));
    }
    Ok(())
}

fn check_optional_fields(
    hectareas: Option<Decimal>,
    capacidad_maxima: Option<i32>,
    email_contacto: Option<&str>,
) -> Result<(), FincaError> {
    if hectareas.is_some_and(|h| h < Decimal::ZERO) {
        return Err(FincaError::Validation(
            "Hectáreas no puede ser negativo".to_string(),
        ));
    }
    if capacidad_maxima.is_some_and(|c| c < 0) {
        return Err(FincaError::Validation(
            "Capacidad máxima no puede ser negativo".to_string(),
        ));
    }
    // An empty email is treated as "not provided".
    if email_contacto.is_some_and(|e| !e.is_empty() && !e.contains('@')) {
        return Err(FincaError::Validation(
            "Email de contacto inválido".to_string(),
        ));
    }
    Ok(())
}

/// Checks a creation request, reporting the first violated rule.
pub fn validate_finca_create(input: &FincaCreateInput) -> Result<(), FincaError> {
    check_nombre(&input.nombre)?;
    check_ubicacion(&input.ubicacion)?;
    check_propietario(&input.propietario)?;
    check_optional_fields(
        input.hectareas,
        input.capacidad_maxima,
        input.email_contacto.as_deref(),
    )
}

/// Applies the creation rules to the fields an update actually carries.
pub fn validate_finca_update(input: &FincaUpdateInput) -> Result<(), FincaError> {
    if let Some(nombre) = &input.nombre {
        check_nombre(nombre)?;
    }
    if let Some(ubicacion) = &input.ubicacion {
        check_ubicacion(ubicacion)?;
    }
    if let Some(propietario) = &input.propietario {
        check_propietario(propietario)?;
    }
    check_optional_fields(
        input.hectareas,
        input.capacidad_maxima,
        input.email_contacto.as_deref(),
    )
}

pub fn map_finca_to_response(finca: &Finca, total_animales: Option<i64>) -> FincaResponse {
    FincaResponse {
        id: finca.id,
        nombre: finca.nombre.clone(),
        ubicacion: finca.ubicacion.clone(),
        propietario: finca.propietario.clone(),
        fecha_registro: finca.fecha_registro,
        hectareas: finca.hectareas,
        capacidad_maxima: finca.capacidad_maxima,
        telefono_contacto: finca.telefono_contacto.clone(),
        email_contacto: finca.email_contacto.clone(),
        activa: finca.activa,
        total_animales,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn valid_input() -> FincaCreateInput {
        FincaCreateInput {
            nombre: "El Roble".to_string(),
            ubicacion: "Vereda San José".to_string(),
            propietario: "Ana Ruiz".to_string(),
            hectareas: Some(dec!(45.5)),
            capacidad_maxima: Some(120),
            telefono_contacto: None,
            email_contacto: Some("ana@elroble.co".to_string()),
        }
    }

    fn message(result: Result<(), FincaError>) -> String {
        match result {
            Err(FincaError::Validation(msg)) => msg,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn accepts_valid_input() {
        assert_eq!(validate_finca_create(&valid_input()), Ok(()));
    }

    #[test]
    fn rejects_each_rule() {
        let mut input = valid_input();
        input.nombre = " A ".to_string();
        assert_eq!(message(validate_finca_create(&input)), "Nombre debe tener al menos 2 caracteres");

        let mut input = valid_input();
        input.ubicacion = "Sur ".to_string();
        assert_eq!(message(validate_finca_create(&input)), "Ubicación debe tener al menos 5 caracteres");

        let mut input = valid_input();
        input.propietario = String::new();
        assert_eq!(message(validate_finca_create(&input)), "Propietario debe tener al menos 2 caracteres");

        let mut input = valid_input();
        input.hectareas = Some(dec!(-1));
        assert_eq!(message(validate_finca_create(&input)), "Hectáreas no puede ser negativo");

        let mut input = valid_input();
        input.capacidad_maxima = Some(-10);
        assert_eq!(message(validate_finca_create(&input)), "Capacidad máxima no puede ser negativo");

        let mut input = valid_input();
        input.email_contacto = Some("ana.elroble.co".to_string());
        assert_eq!(message(validate_finca_create(&input)), "Email de contacto inválido");
    }

    #[test]
    fn first_violation_wins() {
        let input = FincaCreateInput::default();
        assert_eq!(message(validate_finca_create(&input)), "Nombre debe tener al menos 2 caracteres");
    }

    #[test]
    fn counts_characters_not_bytes() {
        let mut input = valid_input();
        input.ubicacion = "Ñuñoa".to_string();
        assert_eq!(validate_finca_create(&input), Ok(()));
    }

    #[test]
    fn update_only_checks_supplied_fields() {
        assert_eq!(validate_finca_update(&FincaUpdateInput::default()), Ok(()));

        let update = FincaUpdateInput { activa: Some(false), ..Default::default() };
        assert_eq!(validate_finca_update(&update), Ok(()));

        let update = FincaUpdateInput { ubicacion: Some("x".to_string()), ..Default::default() };
        assert_eq!(message(validate_finca_update(&update)), "Ubicación debe tener al menos 5 caracteres");
    }

    #[test]
    fn response_omits_absent_optionals_and_internal_fields() {
        let now = Utc::now();
        let finca = Finca {
            id: Uuid::new_v4(),
            nombre: "La Pradera".to_string(),
            ubicacion: "Km 12 vía al mar".to_string(),
            propietario: "Luis Mora".to_string(),
            fecha_registro: now,
            fecha_actualizacion: now,
            activa: true,
            hectareas: None,
            capacidad_maxima: Some(80),
            telefono_contacto: None,
            email_contacto: None,
        };

        let response = map_finca_to_response(&finca, None);
        assert_eq!(response.hectareas, None);
        assert_eq!(response.capacidad_maxima, Some(80));
        assert_eq!(response.total_animales, None);

        let json = serde_json::to_value(&response).unwrap();
        let object = json.as_object().unwrap();
        assert!(!object.contains_key("fecha_actualizacion"));
        assert!(!object.contains_key("hectareas"));
        assert!(!object.contains_key("total_animales"));
        assert_eq!(object["capacidad_maxima"], 80);

        let counted = map_finca_to_response(&finca, Some(14));
        assert_eq!(counted.total_animales, Some(14));
    }
}
