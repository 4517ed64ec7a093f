use crate::enums::UserRole;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The identity of a signed-in account as decoded from the identity
/// provider's session token. Nothing outside the `identity` crate sees the
/// token format itself; everyone else works with this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// The identity provider's subject identifier.
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub farm_id: Option<Uuid>,
}

/// A row of the `users` table, kept in sync with the identity provider on login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub farm_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for SessionUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            farm_id: user.farm_id,
        }
    }
}
