use thiserror::Error;

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Failed to build the identity provider request: {0}")]
    RequestBuild(#[from] reqwest::Error),

    #[error("The identity provider returned {code}: {message}")]
    Provider { code: String, message: String },

    /// Wrong credentials, expired refresh token or revoked access token.
    #[error("{0}")]
    NotAuthorized(String),

    #[error("{0}")]
    UserExists(String),

    #[error("Failed to deserialize the identity provider response: {0}")]
    Deserialization(String),

    #[error("Invalid id token: {0}")]
    InvalidToken(String),

    #[error("There is no active session")]
    NoSession,

    /// The pool asked for an extra step (new password, MFA, ...) this client does not handle.
    #[error("Authentication challenge required: {0}")]
    ChallengeRequired(String),

    #[error("The identity provider is not configured")]
    NotConfigured,

    #[error("Session storage failed: {0}")]
    Storage(String),
}

impl IdentityError {
    /// Maps a provider error type (e.g. `NotAuthorizedException`) to a variant.
    pub fn from_provider(code: &str, message: impl Into<String>) -> Self {
        // Types may arrive namespaced, e.g. `com.amazonaws...#NotAuthorizedException`.
        let code = code.rsplit('#').next().unwrap_or(code);
        let message = message.into();
        match code {
            "NotAuthorizedException" | "UserNotFoundException" | "UserNotConfirmedException" => {
                IdentityError::NotAuthorized(message)
            }
            "UsernameExistsException" | "AliasExistsException" => IdentityError::UserExists(message),
            _ => IdentityError::Provider {
                code: code.to_string(),
                message,
            },
        }
    }

    /// The message shown to people, without the error-type prefix.
    pub fn user_message(&self) -> String {
        match self {
            IdentityError::Provider { message, .. }
            | IdentityError::NotAuthorized(message)
            | IdentityError::UserExists(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_codes_map_to_variants() {
        assert!(matches!(
            IdentityError::from_provider("NotAuthorizedException", "Incorrect username or password."),
            IdentityError::NotAuthorized(_)
        ));
        assert!(matches!(
            IdentityError::from_provider(
                "com.amazonaws.cognito#UsernameExistsException",
                "User already exists"
            ),
            IdentityError::UserExists(_)
        ));
        match IdentityError::from_provider("InvalidPasswordException", "Password not long enough") {
            IdentityError::Provider { code, message } => {
                assert_eq!(code, "InvalidPasswordException");
                assert_eq!(message, "Password not long enough");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn user_message_drops_the_code() {
        let err = IdentityError::from_provider("NotAuthorizedException", "Incorrect username or password.");
        assert_eq!(err.user_message(), "Incorrect username or password.");
        assert_eq!(IdentityError::NoSession.user_message(), "There is no active session");
    }
}
