//! Decoding of the identity provider's id token into a [`SessionUser`].
//!
//! This is the only place that knows the token format and the custom claim
//! names. The signature is not verified here: tokens are only ever read
//! straight from the provider's HTTPS response.

use crate::error::IdentityError;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use core_types::{SessionUser, UserRole};
use serde::Deserialize;
use uuid::Uuid;

/// The claims of an id token that the application cares about.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "custom:role", default)]
    pub role: Option<String>,
    #[serde(rename = "custom:farmId", default)]
    pub farm_id: Option<String>,
    /// Expiry, seconds since the epoch.
    #[serde(default)]
    pub exp: Option<i64>,
}

/// Decodes the payload segment of a JWT without verifying it.
pub fn decode_claims(id_token: &str) -> Result<TokenClaims, IdentityError> {
    let mut segments = id_token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_)) => payload,
        _ => {
            return Err(IdentityError::InvalidToken(
                "expected three dot-separated segments".to_string(),
            ));
        }
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| IdentityError::InvalidToken(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| IdentityError::InvalidToken(e.to_string()))
}

impl TokenClaims {
    /// Converts the claims into the session user.
    ///
    /// The role claim may use either vocabulary. A farm id claim that is not
    /// a UUID is dropped.
    pub fn into_session_user(self) -> Result<SessionUser, IdentityError> {
        let role = self
            .role
            .as_deref()
            .ok_or_else(|| IdentityError::InvalidToken("missing custom:role claim".to_string()))?
            .parse::<UserRole>()
            .map_err(|e| IdentityError::InvalidToken(e.to_string()))?;

        let farm_id = self.farm_id.as_deref().and_then(|raw| {
            Uuid::parse_str(raw)
                .inspect_err(|_| tracing::warn!(farm_id = raw, "Ignoring non-UUID farm id claim"))
                .ok()
        });

        Ok(SessionUser {
            name: self.name.unwrap_or_else(|| self.email.clone()),
            id: self.sub,
            email: self.email,
            role,
            farm_id,
        })
    }
}

/// Shorthand for [`decode_claims`] followed by [`TokenClaims::into_session_user`].
pub fn session_user_from_token(id_token: &str) -> Result<SessionUser, IdentityError> {
    decode_claims(id_token)?.into_session_user()
}
