// handlers/protected/me.rs - GET /functions/v1/me

use axum::{extract::State, http::HeaderMap, response::Json};

use crate::database::models::Profile;
use crate::error::ApiError;
use crate::middleware::extract_bearer_token;
use crate::services::ResolveProfile;
use crate::state::AppState;

/// Profile of the bearer token's owner.
///
/// 200 with the profile, 401 for a missing or invalid token, 404 when the
/// identity has no profile, 403 when the profile is inactive.
pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Profile>, ApiError> {
    let token = extract_bearer_token(&headers).map_err(ApiError::unauthenticated)?;
    let profile = state.resolver().resolve(&token).await?;
    Ok(Json(profile))
}
