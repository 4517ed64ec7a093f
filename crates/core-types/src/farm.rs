use crate::animal::Animal;
use crate::user::User;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A farm and, when loaded, the animals and users that belong to it.
/// Represents a row of the `farms` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Farm {
    pub id: Uuid,
    pub name: String,
    /// Free text, or `"lat,lon"` when the farm was geolocated.
    pub location: String,
    pub owner_name: String,
    pub owner_email: Option<String>,
    pub owner_phone: Option<String>,
    /// Total area in hectares.
    pub total_area: Option<Decimal>,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub animals: Vec<Animal>,
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<User>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Farm {
    pub fn new(name: impl Into<String>, location: impl Into<String>, owner_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            location: location.into(),
            owner_name: owner_name.into(),
            owner_email: None,
            owner_phone: None,
            total_area: None,
            description: None,
            is_active: true,
            created_at: now,
            updated_at: now,
            animals: Vec::new(),
            users: Vec::new(),
        }
    }

    /// Replaces the provided, non-empty fields and refreshes `updated_at`.
    pub fn update_details(
        &mut self,
        name: Option<&str>,
        location: Option<&str>,
        owner_name: Option<&str>,
        description: Option<&str>,
    ) {
        if let Some(name) = name.filter(|v| !v.is_empty()) {
            self.name = name.to_string();
        }
        if let Some(location) = location.filter(|v| !v.is_empty()) {
            self.location = location.to_string();
        }
        if let Some(owner_name) = owner_name.filter(|v| !v.is_empty()) {
            self.owner_name = owner_name.to_string();
        }
        if let Some(description) = description.filter(|v| !v.is_empty()) {
            self.description = Some(description.to_string());
        }
        self.updated_at = Utc::now();
    }

    /// Applies a full update request: the detail fields through `update_details`,
    /// then the optional contact and area fields.
    pub fn apply_update(&mut self, update: &FarmUpdate) {
        self.update_details(
            update.name.as_deref(),
            update.location.as_deref(),
            update.owner_name.as_deref(),
            update.description.as_deref(),
        );
        if let Some(email) = &update.owner_email {
            self.owner_email = Some(email.clone());
        }
        if let Some(phone) = &update.owner_phone {
            self.owner_phone = Some(phone.clone());
        }
        if let Some(area) = update.total_area {
            self.total_area = Some(area);
        }
    }

    /// Soft-deletes the farm. A second call leaves the record untouched.
    pub fn deactivate(&mut self) {
        if self.is_active {
            self.is_active = false;
            self.updated_at = Utc::now();
        }
    }

    pub fn animal_count(&self) -> usize {
        self.animals.iter().filter(|animal| animal.is_active).count()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn active_animals(&self) -> Vec<&Animal> {
        self.animals.iter().filter(|animal| animal.is_active).collect()
    }

    pub fn add_animal(&mut self, animal: Animal) {
        self.animals.push(animal);
    }

    /// Removes the loaded animal with the given id. Returns whether one was found.
    pub fn remove_animal(&mut self, animal_id: Uuid) -> bool {
        match self.animals.iter().position(|animal| animal.id == animal_id) {
            Some(index) => {
                self.animals.remove(index);
                true
            }
            None => false,
        }
    }

    /// Parses the location as `"lat,lon"`. Any other shape yields `None`.
    pub fn location_coordinates(&self) -> Option<Coordinates> {
        let parts: Vec<&str> = self.location.split(',').map(str::trim).collect();
        if parts.len() != 2 {
            return None;
        }
        let latitude = parts[0].parse::<f64>().ok().filter(|v| v.is_finite())?;
        let longitude = parts[1].parse::<f64>().ok().filter(|v| v.is_finite())?;
        Some(Coordinates { latitude, longitude })
    }

    /// Returns every violated rule; an empty list means the farm is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push("El nombre de la finca es requerido".to_string());
        }
        if self.location.trim().is_empty() {
            errors.push("La ubicación de la finca es requerida".to_string());
        }
        if self.owner_name.trim().is_empty() {
            errors.push("El nombre del propietario es requerido".to_string());
        }
        if self.total_area.is_some_and(|area| area <= Decimal::ZERO) {
            errors.push("El área total debe ser mayor a 0".to_string());
        }
        errors
    }
}

/// Request body for creating a farm.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewFarm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub owner_name: String,
    pub owner_email: Option<String>,
    pub owner_phone: Option<String>,
    pub total_area: Option<Decimal>,
    pub description: Option<String>,
}

impl NewFarm {
    pub fn into_farm(self) -> Farm {
        let mut farm = Farm::new(self.name, self.location, self.owner_name);
        farm.owner_email = self.owner_email;
        farm.owner_phone = self.owner_phone;
        farm.total_area = self.total_area;
        farm.description = self.description;
        farm
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FarmUpdate {
    pub name: Option<String>,
    pub location: Option<String>,
    pub owner_name: Option<String>,
    pub owner_email: Option<String>,
    pub owner_phone: Option<String>,
    pub total_area: Option<Decimal>,
    pub description: Option<String>,
}

/// API shape of a farm: the stored row plus its computed aggregates.
#[derive(Debug, Clone, Serialize)]
pub struct FarmResponse {
    #[serde(flatten)]
    pub farm: Farm,
    pub animal_count: usize,
    pub user_count: usize,
    pub coordinates: Option<Coordinates>,
}

impl From<Farm> for FarmResponse {
    fn from(farm: Farm) -> Self {
        let animal_count = farm.animal_count();
        let user_count = farm.user_count();
        let coordinates = farm.location_coordinates();
        Self {
            farm: Farm {
                animals: Vec::new(),
                users: Vec::new(),
                ..farm
            },
            animal_count,
            user_count,
            coordinates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::Sex;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    const NAME_REQUIRED: &str = "El nombre de la finca es requerido";
    const LOCATION_REQUIRED: &str = "La ubicación de la finca es requerida";
    const OWNER_REQUIRED: &str = "El nombre del propietario es requerido";
    const AREA_POSITIVE: &str = "El área total debe ser mayor a 0";

    fn valid_farm() -> Farm {
        let mut farm = Farm::new("La Esperanza", "Montería, Córdoba", "Julián Pérez");
        farm.total_area = Some(dec!(120.5));
        farm
    }

    fn animal(farm_id: Uuid, tag: &str) -> Animal {
        Animal::new(tag, "Canela", "Holstein", NaiveDate::from_ymd_opt(2021, 2, 1).unwrap(), Sex::Female, farm_id)
    }

    #[test]
    fn valid_farm_has_no_errors() {
        assert!(valid_farm().validate().is_empty());

        let mut without_area = valid_farm();
        without_area.total_area = None;
        assert!(without_area.validate().is_empty());
    }

    #[test]
    fn each_rule_reports_only_its_own_message() {
        let cases: Vec<(Box<dyn Fn(&mut Farm)>, &str)> = vec![
            (Box::new(|f| f.name = "   ".to_string()), NAME_REQUIRED),
            (Box::new(|f| f.location = String::new()), LOCATION_REQUIRED),
            (Box::new(|f| f.owner_name = "\t".to_string()), OWNER_REQUIRED),
            (Box::new(|f| f.total_area = Some(dec!(0))), AREA_POSITIVE),
            (Box::new(|f| f.total_area = Some(dec!(-3.2))), AREA_POSITIVE),
        ];

        for (break_rule, expected) in cases {
            let mut farm = valid_farm();
            break_rule(&mut farm);
            assert_eq!(farm.validate(), vec![expected.to_string()]);
        }
    }

    #[test]
    fn all_violations_are_collected() {
        let mut farm = Farm::new("", "", "");
        farm.total_area = Some(dec!(-1));
        assert_eq!(
            farm.validate(),
            vec![NAME_REQUIRED, LOCATION_REQUIRED, OWNER_REQUIRED, AREA_POSITIVE]
        );
    }

    #[test]
    fn animal_count_ignores_inactive_animals() {
        let mut farm = valid_farm();
        assert_eq!(farm.animal_count(), 0);

        farm.add_animal(animal(farm.id, "A-1"));
        farm.add_animal(animal(farm.id, "A-2"));
        let mut sold = animal(farm.id, "A-3");
        sold.deactivate();
        farm.add_animal(sold);

        assert_eq!(farm.animal_count(), 2);
        assert_eq!(farm.active_animals().len(), 2);
        assert_eq!(farm.animals.len(), 3);
    }

    #[test]
    fn remove_animal_reports_whether_it_was_present() {
        let mut farm = valid_farm();
        let cow = animal(farm.id, "B-7");
        let cow_id = cow.id;
        farm.add_animal(cow);

        assert!(!farm.remove_animal(Uuid::new_v4()));
        assert!(farm.remove_animal(cow_id));
        assert!(farm.animals.is_empty());
        assert!(!farm.remove_animal(cow_id));
    }

    #[test]
    fn deactivate_twice_yields_same_state() {
        let mut farm = valid_farm();
        let created = farm.updated_at;
        farm.deactivate();
        assert!(!farm.is_active);
        assert!(farm.updated_at >= created);

        let snapshot = farm.clone();
        farm.deactivate();
        assert_eq!(farm, snapshot);
    }

    #[test]
    fn parses_lat_lon_locations() {
        let mut farm = valid_farm();
        assert_eq!(farm.location_coordinates(), None);

        farm.location = " 8.7479, -75.8814 ".to_string();
        assert_eq!(
            farm.location_coordinates(),
            Some(Coordinates { latitude: 8.7479, longitude: -75.8814 })
        );

        farm.location = "8.7,-75.8,12".to_string();
        assert_eq!(farm.location_coordinates(), None);
        farm.location = "north,south".to_string();
        assert_eq!(farm.location_coordinates(), None);
    }

    #[test]
    fn apply_update_keeps_fields_not_supplied() {
        let mut farm = valid_farm();
        farm.apply_update(&FarmUpdate {
            owner_name: Some("Marta Gómez".to_string()),
            description: Some("Doble propósito".to_string()),
            name: Some(String::new()),
            ..Default::default()
        });
        assert_eq!(farm.name, "La Esperanza");
        assert_eq!(farm.owner_name, "Marta Gómez");
        assert_eq!(farm.description.as_deref(), Some("Doble propósito"));
        assert_eq!(farm.total_area, Some(dec!(120.5)));
    }

    #[test]
    fn response_carries_aggregates_but_not_collections() {
        let mut farm = valid_farm();
        farm.location = "4.6,-74.1".to_string();
        farm.add_animal(animal(farm.id, "C-1"));

        let response = FarmResponse::from(farm);
        assert_eq!(response.animal_count, 1);
        assert!(response.coordinates.is_some());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["name"], "La Esperanza");
        assert_eq!(json["animal_count"], 1);
        assert!(json.get("animals").is_none());
    }
}
