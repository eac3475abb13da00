//! Authorize-then-run-privileged helper shared by every gateway function.
//!
//! Order of checks: bearer present (401), token valid (401), profile exists
//! and role allowed (403), profile active (403), then the body is parsed (400)
//! and exactly one privileged operation runs.

use axum::{
    body::Bytes,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use tracing::warn;
use uuid::Uuid;

use crate::database::models::Role;
use crate::error::ApiError;
use crate::middleware::auth::extract_bearer_token;
use crate::services::ResolveError;
use crate::state::AppState;

pub const CORS_HEADERS: [(&str, &str); 3] = [
    ("access-control-allow-origin", "*"),
    (
        "access-control-allow-headers",
        "authorization, x-client-info, apikey, content-type",
    ),
    ("access-control-allow-methods", "GET, POST, OPTIONS"),
];

/// Response mapper adding the fixed CORS headers to every gateway response
pub async fn apply_cors(mut response: Response) -> Response {
    let headers = response.headers_mut();
    for (name, value) in CORS_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }
    response
}

/// `OPTIONS` on any gateway function
pub async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Authorized caller of a gateway function
#[derive(Debug, Clone)]
pub struct Caller {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

pub async fn authorize(
    state: &AppState,
    headers: &HeaderMap,
    allow: &[Role],
) -> Result<Caller, ApiError> {
    let token = extract_bearer_token(headers).map_err(ApiError::unauthenticated)?;

    let profile = match state.resolver().lookup(&token).await {
        Ok(profile) => profile,
        Err(ResolveError::ProfileNotFound) => {
            warn!("Gateway caller has no profile");
            return Err(ApiError::forbidden("Acesso negado"));
        }
        Err(e) => return Err(e.into()),
    };

    if !allow.contains(&profile.role) {
        warn!(user_id = %profile.id, role = %profile.role, "Gateway caller role not allowed");
        return Err(ApiError::forbidden("Acesso negado"));
    }
    if !profile.active {
        warn!(user_id = %profile.id, "Inactive gateway caller");
        return Err(ApiError::inactive("User inactive"));
    }

    Ok(Caller {
        id: profile.id,
        email: profile.email,
        role: profile.role,
    })
}

/// Authorize against `allow`, then run `op` with the caller and the elevated handles
pub async fn run_privileged<F, Fut, T>(
    state: AppState,
    headers: &HeaderMap,
    allow: &[Role],
    op: F,
) -> Response
where
    F: FnOnce(Caller, AppState) -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
    T: Serialize,
{
    let caller = match authorize(&state, headers, allow).await {
        Ok(caller) => caller,
        Err(e) => return e.into_response(),
    };

    match op(caller, state).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Parse a JSON body after authorization; an empty body reads as `{}`
pub fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    let raw: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        body
    };
    serde_json::from_slice(raw).map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Body {
        #[serde(default)]
        email: Option<String>,
    }

    #[test]
    fn empty_body_reads_as_empty_object() {
        let parsed: Body = parse_body(&Bytes::new()).unwrap();
        assert!(parsed.email.is_none());
    }

    #[test]
    fn malformed_body_is_bad_request() {
        let err = parse_body::<Body>(&Bytes::from_static(b"{not json")).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn cors_headers_are_added() {
        let response = apply_cors(preflight().await.into_response()).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            HeaderValue::from_static("*")
        );
    }
}
