//! GoTrue-compatible identity platform over HTTP

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error, instrument};
use uuid::Uuid;

use crate::auth;
use crate::identity::{AuthUser, IdentityAdmin, IdentityError, IdentityProvider, NewIdentity, Principal};

/// HTTP client for the identity platform.
///
/// Built once with the anon key (non-privileged) and once with the service
/// role key (elevated). When a JWT secret is configured, bearer tokens are
/// verified locally instead of with a round trip to `/auth/v1/user`.
#[derive(Clone)]
pub struct GoTrueClient {
    http: Client,
    base: String,
    api_key: String,
    jwt_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: AuthUser,
}

impl GoTrueClient {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, IdentityError> {
        let parsed = url::Url::parse(base_url)
            .map_err(|e| IdentityError::Protocol(format!("invalid identity URL: {}", e)))?;
        Ok(Self {
            http: Client::new(),
            base: parsed.as_str().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            jwt_secret: None,
        })
    }

    pub fn with_jwt_secret(mut self, secret: Option<String>) -> Self {
        self.jwt_secret = secret.filter(|s| !s.is_empty());
        self
    }

    fn request(&self, method: Method, path: &str, bearer: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base, path))
            .header("apikey", &self.api_key)
            .bearer_auth(bearer)
    }

    /// Requests made with the service credential itself as bearer
    fn admin_request(&self, method: Method, path: &str) -> RequestBuilder {
        self.request(method, path, &self.api_key)
    }

    async fn json<T: DeserializeOwned>(response: Response) -> Result<T, IdentityError> {
        response.json::<T>().await.map_err(|e| {
            error!(error = %e, "Failed to parse identity response");
            IdentityError::Protocol(e.to_string())
        })
    }

    /// The platform's view of the token's identity; a deleted user is rejected
    /// here even while its token still verifies
    async fn fetch_user(&self, access_token: &str) -> Result<AuthUser, IdentityError> {
        let response = self
            .request(Method::GET, "/auth/v1/user", access_token)
            .send()
            .await?;
        match response.status() {
            s if s.is_success() => Self::json(response).await,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(IdentityError::InvalidToken),
            StatusCode::NOT_FOUND => Err(IdentityError::UserNotFound),
            _ => Err(Self::rejection(response).await),
        }
    }

    /// Turn a non-success response into `Rejected` with the platform's message
    async fn rejection(response: Response) -> IdentityError {
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        let message = ["msg", "error_description", "message", "error"]
            .iter()
            .find_map(|k| body.get(*k).and_then(Value::as_str))
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("identity request failed"))
            .to_string();
        error!(status = %status, message = %message, "Identity platform rejected request");
        IdentityError::Rejected {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl IdentityProvider for GoTrueClient {
    #[instrument(skip(self, password))]
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Principal, IdentityError> {
        let response = self
            .http
            .post(format!("{}/auth/v1/token?grant_type=password", self.base))
            .header("apikey", &self.api_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        match response.status() {
            s if s.is_success() => {
                let token: TokenResponse = Self::json(response).await?;
                Ok(Principal {
                    id: token.user.id,
                    email: token.user.email.unwrap_or_else(|| email.to_string()),
                    access_token: token.access_token,
                })
            }
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => Err(IdentityError::InvalidCredentials),
            _ => Err(Self::rejection(response).await),
        }
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, IdentityError> {
        if let Some(secret) = &self.jwt_secret {
            let claims = auth::verify_access_token(access_token, secret).map_err(|e| {
                debug!(error = %e, "Local token verification failed");
                IdentityError::InvalidToken
            })?;
            return Ok(AuthUser {
                id: claims.sub,
                email: claims.email,
            });
        }
        self.fetch_user(access_token).await
    }

    async fn confirm_user(&self, access_token: &str) -> Result<AuthUser, IdentityError> {
        self.fetch_user(access_token).await
    }

    async fn update_password(&self, access_token: &str, password: &str) -> Result<(), IdentityError> {
        let response = self
            .request(Method::PUT, "/auth/v1/user", access_token)
            .json(&json!({ "password": password }))
            .send()
            .await?;
        match response.status() {
            s if s.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED => Err(IdentityError::InvalidToken),
            _ => Err(Self::rejection(response).await),
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError> {
        let response = self
            .request(Method::POST, "/auth/v1/logout", access_token)
            .send()
            .await?;
        match response.status() {
            s if s.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED => Err(IdentityError::InvalidToken),
            _ => Err(Self::rejection(response).await),
        }
    }
}

#[async_trait]
impl IdentityAdmin for GoTrueClient {
    #[instrument(skip(self, new), fields(email = %new.email))]
    async fn create_user(&self, new: &NewIdentity) -> Result<AuthUser, IdentityError> {
        let response = self
            .admin_request(Method::POST, "/auth/v1/admin/users")
            .json(&json!({
                "email": new.email,
                "password": new.password,
                "email_confirm": true,
                "user_metadata": {
                    "full_name": new.full_name,
                    "role": new.role.as_str(),
                    "must_change_password": new.must_change_password,
                },
            }))
            .send()
            .await?;

        if response.status().is_success() {
            Self::json(response).await
        } else {
            Err(Self::rejection(response).await)
        }
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), IdentityError> {
        let response = self
            .admin_request(Method::DELETE, &format!("/auth/v1/admin/users/{}", id))
            .send()
            .await?;
        match response.status() {
            s if s.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(IdentityError::UserNotFound),
            _ => Err(Self::rejection(response).await),
        }
    }

    async fn generate_recovery_link(
        &self,
        email: &str,
        redirect_to: Option<&str>,
    ) -> Result<String, IdentityError> {
        let mut body = json!({ "type": "recovery", "email": email });
        if let Some(to) = redirect_to {
            body["redirect_to"] = json!(to);
        }

        let response = self
            .admin_request(Method::POST, "/auth/v1/admin/generate_link")
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let value: Value = Self::json(response).await?;
        action_link(&value)
            .map(str::to_string)
            .ok_or_else(|| IdentityError::Protocol("generate_link response has no action_link".into()))
    }
}

/// Newer platform versions return the link at the top level, older ones under `properties`
fn action_link(value: &Value) -> Option<&str> {
    value
        .get("action_link")
        .or_else(|| value.pointer("/properties/action_link"))
        .and_then(Value::as_str)
}
