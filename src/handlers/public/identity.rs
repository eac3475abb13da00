// handlers/public/identity.rs - /auth/v1/* for the memory backend
//
// A GoTrue-compatible subset (password grant, user, logout) so the CLI and
// the GoTrue client work against a server without a hosted identity platform.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::identity::IdentityError;
use crate::middleware::{extract_bearer_token, parse_body};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GrantQuery {
    grant_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PasswordGrant {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
struct UserUpdate {
    #[serde(default)]
    password: Option<String>,
}

fn auth_error(status: StatusCode, error: &str, description: &str) -> Response {
    (
        status,
        Json(json!({ "error": error, "error_description": description })),
    )
        .into_response()
}

fn identity_error(err: IdentityError) -> Response {
    match err {
        IdentityError::InvalidToken | IdentityError::UserNotFound => {
            auth_error(StatusCode::UNAUTHORIZED, "invalid_token", "Invalid JWT")
        }
        IdentityError::InvalidCredentials => {
            auth_error(StatusCode::BAD_REQUEST, "invalid_grant", "Invalid login credentials")
        }
        IdentityError::Rejected { status, message } => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::UNPROCESSABLE_ENTITY),
            Json(json!({ "msg": message })),
        )
            .into_response(),
        other => {
            tracing::error!("Identity error: {}", other);
            auth_error(StatusCode::INTERNAL_SERVER_ERROR, "server_error", "Identity service error")
        }
    }
}

fn bearer(headers: &HeaderMap) -> Result<String, Response> {
    extract_bearer_token(headers)
        .map_err(|msg| auth_error(StatusCode::UNAUTHORIZED, "invalid_token", &msg))
}

/// POST /auth/v1/token?grant_type=password
pub async fn token(
    State(state): State<AppState>,
    Query(query): Query<GrantQuery>,
    body: Bytes,
) -> Response {
    if query.grant_type.as_deref() != Some("password") {
        return auth_error(
            StatusCode::BAD_REQUEST,
            "unsupported_grant_type",
            "Only the password grant is supported",
        );
    }
    let grant: PasswordGrant = match parse_body(&body) {
        Ok(grant) => grant,
        Err(e) => return e.into_response(),
    };

    match state
        .identity
        .sign_in_with_password(&grant.email, &grant.password)
        .await
    {
        Ok(principal) => Json(json!({
            "access_token": principal.access_token,
            "token_type": "bearer",
            "expires_in": state.config.security.jwt_expiry_hours * 3600,
            "user": { "id": principal.id, "email": principal.email },
        }))
        .into_response(),
        Err(e) => identity_error(e),
    }
}

/// GET /auth/v1/user
pub async fn get_user(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let token = match bearer(&headers) {
        Ok(token) => token,
        Err(response) => return response,
    };
    match state.identity.get_user(&token).await {
        Ok(user) => Json(user).into_response(),
        Err(e) => identity_error(e),
    }
}

/// PUT /auth/v1/user
pub async fn update_user(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let token = match bearer(&headers) {
        Ok(token) => token,
        Err(response) => return response,
    };
    let update: UserUpdate = match parse_body(&body) {
        Ok(update) => update,
        Err(e) => return e.into_response(),
    };
    let Some(password) = update.password else {
        return auth_error(StatusCode::UNPROCESSABLE_ENTITY, "validation_failed", "password is required");
    };

    if let Err(e) = state.identity.update_password(&token, &password).await {
        return identity_error(e);
    }
    match state.identity.get_user(&token).await {
        Ok(user) => Json(user).into_response(),
        Err(e) => identity_error(e),
    }
}

/// POST /auth/v1/logout
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let token = match bearer(&headers) {
        Ok(token) => token,
        Err(response) => return response,
    };
    match state.identity.sign_out(&token).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => identity_error(e),
    }
}
