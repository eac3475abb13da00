use async_trait::async_trait;
use reqwest::{Client as HttpClient, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::database::models::{Client, ClientFields, ClientPatch, Profile};
use crate::portal::PortalOverview;
use crate::services::{ResolveError, ResolveProfile};

#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("invalid API URL: {0}")]
    InvalidUrl(String),

    /// Non-success answer; `message` is the server's `{error}` text
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl ApiClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Typed HTTP client for the gateway functions and the self-service routes
#[derive(Clone)]
pub struct ApiClient {
    http: HttpClient,
    base: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiClientError> {
        let parsed =
            url::Url::parse(base_url).map_err(|e| ApiClientError::InvalidUrl(e.to_string()))?;
        Ok(Self {
            http: HttpClient::new(),
            base: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn request(&self, method: Method, path: &str, token: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base, path))
            .bearer_auth(token)
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, ApiClientError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body: Value = response.json().await.unwrap_or(Value::Null);
        let message = body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed"))
            .to_string();
        debug!(status = %status, message = %message, "API request failed");
        Err(ApiClientError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiClientError> {
        Ok(self.send(request).await?.json::<T>().await?)
    }

    /// POST a JSON body to `/functions/v1/{name}`
    pub async fn function<B, T>(&self, token: &str, name: &str, body: &B) -> Result<T, ApiClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self
            .request(Method::POST, &format!("/functions/v1/{}", name), token)
            .json(body);
        self.send_json(request).await
    }

    pub async fn me(&self, token: &str) -> Result<Profile, ApiClientError> {
        self.send_json(self.request(Method::GET, "/functions/v1/me", token))
            .await
    }

    pub async fn list_clients(&self, token: &str) -> Result<Vec<Client>, ApiClientError> {
        self.send_json(self.request(Method::GET, "/rest/v1/clients", token))
            .await
    }

    pub async fn create_client(&self, token: &str, fields: &ClientFields) -> Result<Client, ApiClientError> {
        let request = self.request(Method::POST, "/rest/v1/clients", token).json(fields);
        self.send_json(request).await
    }

    pub async fn update_client(
        &self,
        token: &str,
        id: Uuid,
        patch: &ClientPatch,
    ) -> Result<Client, ApiClientError> {
        let request = self
            .request(Method::PATCH, &format!("/rest/v1/clients/{}", id), token)
            .json(patch);
        self.send_json(request).await
    }

    pub async fn delete_client(&self, token: &str, id: Uuid) -> Result<(), ApiClientError> {
        self.send(self.request(Method::DELETE, &format!("/rest/v1/clients/{}", id), token))
            .await?;
        Ok(())
    }

    pub async fn change_password(&self, token: &str, password: &str) -> Result<(), ApiClientError> {
        let request = self
            .request(Method::POST, "/rest/v1/profile/password", token)
            .json(&serde_json::json!({ "password": password }));
        self.send(request).await?;
        Ok(())
    }

    pub async fn portal(&self, token: &str) -> Result<PortalOverview, ApiClientError> {
        self.send_json(self.request(Method::GET, "/rest/v1/portal", token))
            .await
    }
}

#[async_trait]
impl ResolveProfile for ApiClient {
    async fn resolve(&self, access_token: &str) -> Result<Profile, ResolveError> {
        self.me(access_token).await.map_err(|e| match e.status() {
            Some(s) if s == StatusCode::UNAUTHORIZED.as_u16() => ResolveError::Unauthenticated,
            Some(s) if s == StatusCode::NOT_FOUND.as_u16() => ResolveError::ProfileNotFound,
            Some(s) if s == StatusCode::FORBIDDEN.as_u16() => ResolveError::Inactive,
            _ => ResolveError::Upstream(e.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_base_url() {
        assert!(matches!(ApiClient::new("::"), Err(ApiClientError::InvalidUrl(_))));
        let client = ApiClient::new("http://localhost:3000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
    }
}
