// handlers/elevated/users/reset_password.rs - POST /functions/v1/admin-reset-user-password

use axum::{body::Bytes, extract::State, http::HeaderMap, response::Response};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::database::models::Role;
use crate::error::ApiError;
use crate::middleware::gateway::{parse_body, run_privileged};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct ResetPasswordRequest {
    #[serde(default)]
    email: Option<String>,
}

/// Generate a password recovery link for `email`.
///
/// Allowed: admin. Output: `{ "recoveryLink": "..." }`
pub async fn admin_reset_user_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    run_privileged(state, &headers, Role::ADMIN_ONLY, |caller, state| async move {
        let request: ResetPasswordRequest = parse_body(&body)?;
        let email = request
            .email
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| ApiError::bad_request("User email is required"))?;

        let link = state
            .identity_admin
            .generate_recovery_link(email.trim(), state.config.security.recovery_redirect_to.as_deref())
            .await?;

        info!(admin = %caller.id, "Generated password recovery link");
        Ok::<_, ApiError>(json!({ "recoveryLink": link }))
    })
    .await
}
