use crate::enums::Sex;
use crate::records::{VeterinaryVisit, WeightRecord};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An animal registered on a farm. Represents a row of the `animals` table,
/// optionally carrying its loaded weight records and veterinary visits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Animal {
    pub id: Uuid,
    /// Unique ear-tag number, the animal's natural key.
    pub ear_tag: String,
    pub name: String,
    pub breed: String,
    pub birth_date: NaiveDate,
    pub sex: Sex,
    // Parent references are informational and not enforced as foreign keys.
    pub mother_id: Option<Uuid>,
    pub father_id: Option<Uuid>,
    pub farm_id: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub weight_records: Vec<WeightRecord>,
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub veterinary_visits: Vec<VeterinaryVisit>,
}

/// A single point of an animal's weight curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightPoint {
    pub date: DateTime<Utc>,
    pub weight: Decimal,
}

impl Animal {
    pub fn new(
        ear_tag: impl Into<String>,
        name: impl Into<String>,
        breed: impl Into<String>,
        birth_date: NaiveDate,
        sex: Sex,
        farm_id: Uuid,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            ear_tag: ear_tag.into(),
            name: name.into(),
            breed: breed.into(),
            birth_date,
            sex,
            mother_id: None,
            father_id: None,
            farm_id,
            is_active: true,
            created_at: now,
            updated_at: now,
            weight_records: Vec::new(),
            veterinary_visits: Vec::new(),
        }
    }

    /// Replaces the provided, non-empty fields and refreshes `updated_at`.
    pub fn update_details(
        &mut self,
        name: Option<&str>,
        breed: Option<&str>,
        birth_date: Option<NaiveDate>,
    ) {
        if let Some(name) = name.filter(|n| !n.is_empty()) {
            self.name = name.to_string();
        }
        if let Some(breed) = breed.filter(|b| !b.is_empty()) {
            self.breed = breed.to_string();
        }
        if let Some(birth_date) = birth_date {
            self.birth_date = birth_date;
        }
        self.updated_at = Utc::now();
    }

    /// Soft-deletes the animal. A second call leaves the record untouched.
    pub fn deactivate(&mut self) {
        if self.is_active {
            self.is_active = false;
            self.updated_at = Utc::now();
        }
    }

    /// Whole calendar months between the birth date and `today`, ignoring the day of month.
    pub fn age_in_months_at(&self, today: NaiveDate) -> i32 {
        let years = today.year() - self.birth_date.year();
        let months = today.month() as i32 - self.birth_date.month() as i32;
        years * 12 + months
    }

    pub fn age_in_months(&self) -> i32 {
        self.age_in_months_at(Utc::now().date_naive())
    }

    /// The weight of the most recent record, or `None` if the animal was never weighed.
    /// On a timestamp tie the earliest-loaded record wins.
    pub fn current_weight(&self) -> Option<Decimal> {
        self.weight_records
            .iter()
            .rev()
            .max_by_key(|record| record.recorded_at)
            .map(|record| record.weight)
    }

    /// All recorded weights, oldest first.
    pub fn weight_history(&self) -> Vec<WeightPoint> {
        let mut records: Vec<&WeightRecord> = self.weight_records.iter().collect();
        records.sort_by_key(|record| record.recorded_at);
        records
            .into_iter()
            .map(|record| WeightPoint {
                date: record.recorded_at,
                weight: record.weight,
            })
            .collect()
    }

    pub fn last_veterinary_visit(&self) -> Option<&VeterinaryVisit> {
        // `max_by_key` keeps the last of equal keys, so walk backwards.
        self.veterinary_visits
            .iter()
            .rev()
            .max_by_key(|visit| visit.visit_date)
    }

    pub fn validate_at(&self, today: NaiveDate) -> Vec<String> {
        let mut errors = Vec::new();
        if self.ear_tag.trim().is_empty() {
            errors.push("El arete del animal es requerido".to_string());
        }
        if self.name.trim().is_empty() {
            errors.push("El nombre del animal es requerido".to_string());
        }
        if self.breed.trim().is_empty() {
            errors.push("La raza del animal es requerida".to_string());
        }
        if self.birth_date > today {
            errors.push("La fecha de nacimiento no puede ser futura".to_string());
        }
        errors
    }

    pub fn validate(&self) -> Vec<String> {
        self.validate_at(Utc::now().date_naive())
    }
}

/// Request body for registering an animal.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAnimal {
    #[serde(default)]
    pub ear_tag: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub breed: String,
    pub birth_date: NaiveDate,
    pub sex: Sex,
    pub mother_id: Option<Uuid>,
    pub father_id: Option<Uuid>,
    pub farm_id: Uuid,
}

impl NewAnimal {
    pub fn into_animal(self) -> Animal {
        let mut animal = Animal::new(
            self.ear_tag.trim(),
            self.name,
            self.breed,
            self.birth_date,
            self.sex,
            self.farm_id,
        );
        animal.mother_id = self.mother_id;
        animal.father_id = self.father_id;
        animal
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnimalUpdate {
    pub name: Option<String>,
    pub breed: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

/// The derived view of an animal served by the summary endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct AnimalSummary {
    pub id: Uuid,
    pub ear_tag: String,
    pub name: String,
    pub farm_id: Uuid,
    pub age_in_months: i32,
    pub current_weight: Option<Decimal>,
    pub weight_history: Vec<WeightPoint>,
    pub last_veterinary_visit: Option<VeterinaryVisit>,
}

impl AnimalSummary {
    pub fn from_animal(animal: &Animal, today: NaiveDate) -> Self {
        Self {
            id: animal.id,
            ear_tag: animal.ear_tag.clone(),
            name: animal.name.clone(),
            farm_id: animal.farm_id,
            age_in_months: animal.age_in_months_at(today),
            current_weight: animal.current_weight(),
            weight_history: animal.weight_history(),
            last_veterinary_visit: animal.last_veterinary_visit().cloned(),
        }
    }
}
