use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Biological sex of an animal, stored as the `animal_sex` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "animal_sex", rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

/// The role an account holds. Stored as the `user_role` Postgres enum.
///
/// The identity provider's custom claim historically used the English
/// vocabulary (`producer`, `veterinarian`, `admin`) while the API uses the
/// Spanish one; `FromStr` accepts both, serialization always emits the
/// Spanish form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
pub enum UserRole {
    Productor,
    Veterinario,
    Administrador,
}

impl UserRole {
    pub const ALL: [UserRole; 3] = [
        UserRole::Productor,
        UserRole::Veterinario,
        UserRole::Administrador,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Productor => "PRODUCTOR",
            UserRole::Veterinario => "VETERINARIO",
            UserRole::Administrador => "ADMINISTRADOR",
        }
    }

    /// The value written to the identity provider's `custom:role` attribute.
    pub fn claim_value(&self) -> &'static str {
        match self {
            UserRole::Productor => "producer",
            UserRole::Veterinario => "veterinarian",
            UserRole::Administrador => "admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role: {}", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for UserRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PRODUCTOR" | "producer" => Ok(UserRole::Productor),
            "VETERINARIO" | "veterinarian" => Ok(UserRole::Veterinario),
            "ADMINISTRADOR" | "admin" => Ok(UserRole::Administrador),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_role_vocabularies() {
        assert_eq!("PRODUCTOR".parse::<UserRole>(), Ok(UserRole::Productor));
        assert_eq!("veterinarian".parse::<UserRole>(), Ok(UserRole::Veterinario));
        assert_eq!("admin".parse::<UserRole>(), Ok(UserRole::Administrador));
        assert!("GANADERO".parse::<UserRole>().is_err());
        assert!("productor".parse::<UserRole>().is_err());
    }

    #[test]
    fn role_serializes_in_spanish() {
        let json = serde_json::to_string(&UserRole::Veterinario).unwrap();
        assert_eq!(json, "\"VETERINARIO\"");
        for role in UserRole::ALL {
            assert_eq!(role.claim_value().parse::<UserRole>(), Ok(role));
        }
    }

    #[test]
    fn sex_is_lowercase_on_the_wire() {
        assert_eq!(serde_json::to_string(&Sex::Female).unwrap(), "\"female\"");
        let sex: Sex = serde_json::from_str("\"male\"").unwrap();
        assert_eq!(sex, Sex::Male);
    }
}
