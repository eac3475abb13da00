// handlers/elevated/clients/list.rs - POST /functions/v1/admin-list-clients

use axum::{extract::State, http::HeaderMap, response::Response};

use crate::database::models::Role;
use crate::error::ApiError;
use crate::middleware::gateway::run_privileged;
use crate::state::AppState;

/// All clients joined with the linked profile's email (`""` when there is none).
///
/// Allowed: admin, assistant.
///
/// Output: `[{id, created_at, full_name, dpp, status, email}]`
pub async fn admin_list_clients(State(state): State<AppState>, headers: HeaderMap) -> Response {
    run_privileged(state, &headers, Role::STAFF, |_caller, state| async move {
        let rows = state.clients.list_with_email().await?;
        Ok::<_, ApiError>(rows)
    })
    .await
}
