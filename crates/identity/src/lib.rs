//! # BoviTrack Identity
//!
//! Sign-up, sign-in, session refresh and sign-out against the hosted user
//! pool, plus the client-side [`AuthContext`] that keeps track of the
//! current user.
//!
//! The rest of the application talks to [`IdentityProvider`] only. The
//! concrete [`CognitoClient`] speaks the Cognito Identity Provider JSON API;
//! tests swap in an in-memory provider.

use async_trait::async_trait;
use core_types::UserRole;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod claims;
pub mod cognito;
pub mod error;
pub mod session;

pub use claims::{TokenClaims, decode_claims, session_user_from_token};
pub use cognito::CognitoClient;
pub use error::IdentityError;
pub use session::{AuthContext, FileSessionStore, MemorySessionStore, SessionStore, StoredSession};

/// Everything needed to create an account at the provider.
#[derive(Clone, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: UserRole,
    pub farm_id: Option<Uuid>,
}

impl std::fmt::Debug for SignUpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignUpRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("farm_id", &self.farm_id)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignUpOutcome {
    /// The provider's subject identifier for the new account.
    pub user_sub: String,
    /// False while the account still awaits email confirmation.
    pub user_confirmed: bool,
}

/// The token set of an authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTokens {
    pub id_token: String,
    pub access_token: String,
    pub refresh_token: String,
    /// Lifetime of the id and access tokens, in seconds.
    pub expires_in: i64,
}

/// The generic interface to a hosted identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpOutcome, IdentityError>;

    /// Signs in with email and password.
    async fn authenticate(&self, email: &str, password: &str) -> Result<AuthTokens, IdentityError>;

    /// Exchanges a refresh token for fresh id and access tokens.
    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthTokens, IdentityError>;

    /// Invalidates every token issued to the session owning `access_token`.
    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError>;
}
