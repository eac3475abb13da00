// handlers/protected/clients.rs - /rest/v1/clients owner-scoped CRUD

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use tracing::info;
use uuid::Uuid;

use crate::database::models::{Client, ClientFields, ClientPatch, NewClient};
use crate::error::ApiError;
use crate::middleware::{parse_body, CurrentUser};
use crate::state::AppState;

const NOT_FOUND: &str = "Client not found";

/// GET /rest/v1/clients - caller's clients, newest first
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<Client>>, ApiError> {
    Ok(Json(state.clients.list_owned(user.profile.id).await?))
}

/// POST /rest/v1/clients
///
/// `full_name` and `phone` are required; `owner_id` is always the caller and
/// `status` defaults to `active`.
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    body: Bytes,
) -> Result<(StatusCode, Json<Client>), ApiError> {
    let fields: ClientFields = parse_body(&body)?;
    let missing = fields.missing_required();
    if !missing.is_empty() {
        return Err(ApiError::bad_request(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    let client = state
        .clients
        .insert(&NewClient {
            owner_id: user.profile.id,
            user_id: None,
            fields,
        })
        .await?;

    info!(owner = %user.profile.id, client_id = %client.id, "Created client");
    Ok((StatusCode::CREATED, Json(client)))
}

/// GET /rest/v1/clients/:id
pub async fn show(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Client>, ApiError> {
    state
        .clients
        .find_owned(user.profile.id, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))
}

/// PATCH /rest/v1/clients/:id - absent fields stay unchanged, `null` clears
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<Client>, ApiError> {
    let patch: ClientPatch = parse_body(&body)?;
    let cleared = patch.clears_required();
    if !cleared.is_empty() {
        return Err(ApiError::bad_request(format!(
            "Required fields cannot be empty: {}",
            cleared.join(", ")
        )));
    }

    state
        .clients
        .update_owned(user.profile.id, id, &patch)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))
}

/// DELETE /rest/v1/clients/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.clients.delete_owned(user.profile.id, id).await? {
        info!(owner = %user.profile.id, client_id = %id, "Deleted client");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(NOT_FOUND))
    }
}
