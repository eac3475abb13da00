// handlers/protected/portal.rs - GET /rest/v1/portal

use axum::{extract::State, response::Json, Extension};
use chrono::Utc;

use crate::database::models::Role;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::portal::PortalOverview;
use crate::state::AppState;

/// Home data for a client account: the linked record, gestational age,
/// appointments and plan
pub async fn overview(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<PortalOverview>, ApiError> {
    if user.profile.role != Role::Client {
        return Err(ApiError::forbidden("Acesso negado"));
    }

    let client = state
        .clients
        .find_linked(user.profile.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Client record not found"))?;

    Ok(Json(PortalOverview::build(client, Utc::now().date_naive())))
}
