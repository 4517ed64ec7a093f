use crate::error::IdentityError;
use crate::{AuthTokens, IdentityProvider, SignUpOutcome, SignUpRequest};
use async_trait::async_trait;
use configuration::IdentitySettings;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService";
const AMZ_JSON: &str = "application/x-amz-json-1.1";

/// A client for the Cognito Identity Provider JSON API of one user pool app client.
#[derive(Clone)]
pub struct CognitoClient {
    client: reqwest::Client,
    endpoint: String,
    client_id: String,
    configured: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct AttributeType<'a> {
    name: &'a str,
    value: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SignUpBody<'a> {
    client_id: &'a str,
    username: &'a str,
    password: &'a str,
    user_attributes: Vec<AttributeType<'a>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SignUpResponse {
    user_sub: String,
    #[serde(default)]
    user_confirmed: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthBody<'a> {
    auth_flow: &'a str,
    client_id: &'a str,
    auth_parameters: HashMap<&'a str, &'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthResponse {
    authentication_result: Option<AuthenticationResult>,
    challenge_name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuthenticationResult {
    id_token: String,
    access_token: String,
    /// Absent on `REFRESH_TOKEN_AUTH`.
    refresh_token: Option<String>,
    expires_in: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct GlobalSignOutBody<'a> {
    access_token: &'a str,
}

#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(rename = "__type")]
    error_type: String,
    #[serde(alias = "Message", default)]
    message: String,
}

#[derive(Deserialize)]
struct Empty {}

impl CognitoClient {
    pub fn new(settings: &IdentitySettings) -> Result<Self, IdentityError> {
        let region = settings.region().unwrap_or_default();
        let endpoint = format!("https://cognito-idp.{region}.amazonaws.com/");
        Self::with_endpoint(settings, endpoint)
    }

    /// Builds a client against an explicit endpoint, e.g. a local emulator.
    pub fn with_endpoint(
        settings: &IdentitySettings,
        endpoint: impl Into<String>,
    ) -> Result<Self, IdentityError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(AMZ_JSON));

        Ok(Self {
            client: reqwest::Client::builder().default_headers(headers).build()?,
            endpoint: endpoint.into(),
            client_id: settings.client_id.clone(),
            configured: settings.is_configured(),
        })
    }

    async fn call<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        action: &str,
        body: &B,
    ) -> Result<T, IdentityError> {
        if !self.configured {
            return Err(IdentityError::NotConfigured);
        }

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-Amz-Target", format!("{TARGET_PREFIX}.{action}"))
            .json(body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            serde_json::from_str::<T>(&text)
                .map_err(|e| IdentityError::Deserialization(e.to_string()))
        } else {
            let api_error: ErrorResponse = serde_json::from_str(&text).map_err(|e| {
                IdentityError::Deserialization(format!(
                    "Failed to deserialize error response: {e}. Original text: {text}"
                ))
            })?;
            tracing::warn!(action, code = %api_error.error_type, status = %status, "Identity provider rejected the request");
            Err(IdentityError::from_provider(&api_error.error_type, api_error.message))
        }
    }

    async fn initiate_auth(
        &self,
        flow: &str,
        parameters: HashMap<&str, &str>,
    ) -> Result<AuthenticationResult, IdentityError> {
        let body = InitiateAuthBody {
            auth_flow: flow,
            client_id: &self.client_id,
            auth_parameters: parameters,
        };
        let response: InitiateAuthResponse = self.call("InitiateAuth", &body).await?;

        match (response.authentication_result, response.challenge_name) {
            (Some(result), _) => Ok(result),
            (None, Some(challenge)) => Err(IdentityError::ChallengeRequired(challenge)),
            (None, None) => Err(IdentityError::Deserialization(
                "InitiateAuth returned neither tokens nor a challenge".to_string(),
            )),
        }
    }
}

#[async_trait]
impl IdentityProvider for CognitoClient {
    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpOutcome, IdentityError> {
        let mut attributes = vec![
            AttributeType { name: "email", value: request.email.clone() },
            AttributeType { name: "name", value: request.name.clone() },
            AttributeType { name: "custom:role", value: request.role.claim_value().to_string() },
        ];
        if let Some(farm_id) = request.farm_id {
            attributes.push(AttributeType { name: "custom:farmId", value: farm_id.to_string() });
        }

        let body = SignUpBody {
            client_id: &self.client_id,
            username: &request.email,
            password: &request.password,
            user_attributes: attributes,
        };
        let response: SignUpResponse = self.call("SignUp", &body).await?;
        tracing::info!(user_sub = %response.user_sub, confirmed = response.user_confirmed, "Account registered");

        Ok(SignUpOutcome {
            user_sub: response.user_sub,
            user_confirmed: response.user_confirmed,
        })
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<AuthTokens, IdentityError> {
        let parameters = HashMap::from([("USERNAME", email), ("PASSWORD", password)]);
        let result = self.initiate_auth("USER_PASSWORD_AUTH", parameters).await?;

        let refresh_token = result.refresh_token.ok_or_else(|| {
            IdentityError::Deserialization("USER_PASSWORD_AUTH returned no refresh token".to_string())
        })?;
        Ok(AuthTokens {
            id_token: result.id_token,
            access_token: result.access_token,
            refresh_token,
            expires_in: result.expires_in,
        })
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthTokens, IdentityError> {
        let parameters = HashMap::from([("REFRESH_TOKEN", refresh_token)]);
        let result = self.initiate_auth("REFRESH_TOKEN_AUTH", parameters).await?;

        Ok(AuthTokens {
            id_token: result.id_token,
            access_token: result.access_token,
            refresh_token: result
                .refresh_token
                .unwrap_or_else(|| refresh_token.to_string()),
            expires_in: result.expires_in,
        })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError> {
        let _: Empty = self
            .call("GlobalSignOut", &GlobalSignOutBody { access_token })
            .await?;
        Ok(())
    }
}
