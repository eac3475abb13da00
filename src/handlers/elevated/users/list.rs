// handlers/elevated/users/list.rs - POST /functions/v1/admin-list-users

use axum::{extract::State, http::HeaderMap, response::Response};

use crate::database::models::{Role, UserSummary};
use crate::error::ApiError;
use crate::middleware::gateway::run_privileged;
use crate::state::AppState;

/// Every profile, newest first.
///
/// Allowed: admin, assistant.
///
/// Output: `[{id, full_name, email, role, active, created_at}]`
pub async fn admin_list_users(State(state): State<AppState>, headers: HeaderMap) -> Response {
    run_privileged(state, &headers, Role::STAFF, |_caller, state| async move {
        let profiles = state.profiles.list().await?;
        Ok::<_, ApiError>(profiles.into_iter().map(UserSummary::from).collect::<Vec<_>>())
    })
    .await
}
