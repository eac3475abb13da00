// handlers/protected/password.rs - POST /rest/v1/profile/password

use axum::{body::Bytes, extract::State, response::Json, Extension};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::database::models::ProfilePatch;
use crate::error::ApiError;
use crate::middleware::{parse_body, CurrentUser};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct ChangePasswordRequest {
    #[serde(default)]
    password: Option<String>,
}

/// Change the caller's own password, then clear `must_change_password`.
///
/// The identity update happens with the caller's own token. When it succeeds
/// but the profile flag cannot be cleared the caller gets a 500 saying so.
pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let request: ChangePasswordRequest = parse_body(&body)?;
    let password = request
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::bad_request("password is required"))?;

    state.identity.update_password(&user.token, &password).await?;

    let patch = ProfilePatch {
        must_change_password: Some(false),
        ..Default::default()
    };
    match state.profiles.update(user.profile.id, &patch).await {
        Ok(Some(_)) => {
            info!(user_id = %user.profile.id, "Password changed");
            Ok(Json(json!({ "message": "Senha alterada com sucesso." })))
        }
        Ok(None) => {
            error!(user_id = %user.profile.id, "Profile vanished after password change");
            Err(ApiError::upstream("Senha alterada, mas falha ao atualizar perfil."))
        }
        Err(e) => {
            error!(error = %e, user_id = %user.profile.id, "Failed to clear must_change_password");
            Err(ApiError::upstream("Senha alterada, mas falha ao atualizar perfil."))
        }
    }
}
