// handlers/elevated/users/force_password_change.rs - POST /functions/v1/admin-force-password-change

use axum::{body::Bytes, extract::State, http::HeaderMap, response::Response};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::database::models::{ProfilePatch, Role};
use crate::error::ApiError;
use crate::middleware::gateway::{parse_body, run_privileged};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ForcePasswordChangeRequest {
    #[serde(default)]
    user_id: Option<Uuid>,
}

/// Set `must_change_password` on the target profile. Allowed: admin.
pub async fn admin_force_password_change(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    run_privileged(state, &headers, Role::ADMIN_ONLY, |caller, state| async move {
        let request: ForcePasswordChangeRequest = parse_body(&body)?;
        let user_id = request
            .user_id
            .ok_or_else(|| ApiError::bad_request("userId is required"))?;

        let patch = ProfilePatch {
            must_change_password: Some(true),
            ..Default::default()
        };
        state
            .profiles
            .update(user_id, &patch)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;

        info!(admin = %caller.id, user_id = %user_id, "Forced password change");
        Ok::<_, ApiError>(json!({ "message": "User is now required to change password on next login." }))
    })
    .await
}
