use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A single weighing of an animal. Represents a row of the `weight_records` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct WeightRecord {
    pub id: Uuid,
    pub animal_id: Uuid,
    /// Weight in kilograms.
    pub weight: Decimal,
    pub recorded_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request body for recording a new weight.
#[derive(Debug, Clone, Deserialize)]
pub struct NewWeightRecord {
    pub weight: Decimal,
    /// Defaults to the time the record is stored.
    pub recorded_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl NewWeightRecord {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.weight <= Decimal::ZERO {
            errors.push("El peso debe ser mayor a 0".to_string());
        }
        errors
    }
}

/// A veterinary visit for one animal. Represents a row of the `veterinary_visits` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct VeterinaryVisit {
    pub id: Uuid,
    pub animal_id: Uuid,
    pub visit_date: DateTime<Utc>,
    pub veterinarian_name: String,
    pub reason: String,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewVeterinaryVisit {
    pub visit_date: DateTime<Utc>,
    #[serde(default)]
    pub veterinarian_name: String,
    #[serde(default)]
    pub reason: String,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
    pub notes: Option<String>,
}

impl NewVeterinaryVisit {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.veterinarian_name.trim().is_empty() {
            errors.push("El nombre del veterinario es requerido".to_string());
        }
        if self.reason.trim().is_empty() {
            errors.push("El motivo de la visita es requerido".to_string());
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn weight_must_be_positive() {
        let record = NewWeightRecord { weight: dec!(0), recorded_at: None, notes: None };
        assert_eq!(record.validate(), vec!["El peso debe ser mayor a 0".to_string()]);

        let record = NewWeightRecord { weight: dec!(412.5), recorded_at: None, notes: None };
        assert!(record.validate().is_empty());
    }

    #[test]
    fn visit_requires_veterinarian_and_reason() {
        let visit: NewVeterinaryVisit =
            serde_json::from_str(r#"{"visit_date":"2024-03-01T10:00:00Z","reason":"  "}"#).unwrap();
        let errors = visit.validate();
        assert_eq!(errors.len(), 2);
        assert!(errors.contains(&"El nombre del veterinario es requerido".to_string()));
        assert!(errors.contains(&"El motivo de la visita es requerido".to_string()));
    }
}
