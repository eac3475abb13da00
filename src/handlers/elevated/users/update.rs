// handlers/elevated/users/update.rs - POST /functions/v1/admin-update-user

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
struct UpdateUserRequest {
    #[serde(default)]
    user_id: Option<Uuid>,
    #[serde(default)]
    role: Option<Role>,
    #[serde(default)]
    active: Option<bool>,
}

/// Change a user's role and/or active flag.
///
/// Allowed: admin.
///
/// Expected Input:
/// ```json
/// { "userId": "uuid", "role": "assistant", "active": false }
/// ```
/// At least one of `role`/`active` must be present. Applying the same patch
/// twice succeeds both times.
pub async fn admin_update_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    run_privileged(state, &headers, Role::ADMIN_ONLY, |caller, state| async move {
        let request: UpdateUserRequest = parse_body(&body)?;
        let user_id = request
            .user_id
            .ok_or_else(|| ApiError::bad_request("userId is required"))?;

        let patch = ProfilePatch {
            role: request.role,
            active: request.active,
            must_change_password: None,
        };
        if patch.is_empty() {
            return Err(ApiError::bad_request(
                "Pelo menos um campo (role ou active) deve ser fornecido para atualização.",
            ));
        }

        state
            .profiles
            .update(user_id, &patch)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;

        info!(admin = %caller.id, user_id = %user_id, ?patch, "Updated user profile");
        Ok::<_, ApiError>(json!({ "message": "User updated successfully" }))
    })
    .await
}
