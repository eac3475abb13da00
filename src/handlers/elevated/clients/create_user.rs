// handlers/elevated/clients/create_user.rs - POST /functions/v1/admin-create-client-user

use axum::{body::Bytes, extract::State, http::HeaderMap, response::Response};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::database::models::{ClientFields, NewClient, Role};
use crate::error::ApiError;
use crate::identity::{IdentityError, NewIdentity};
use crate::middleware::gateway::{parse_body, run_privileged};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct CreateClientUserRequest {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    dpp: Option<String>,
}

fn required(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Create a portal account for a pregnant client, then the client record.
///
/// Allowed: admin, assistant.
///
/// Expected Input:
/// ```json
/// { "email": "...", "password": "...", "full_name": "...", "dpp": "2025-03-01" }
/// ```
///
/// The identity is created first (role `client`, must change password). If
/// the client insert fails the identity is deleted again before answering;
/// a failed rollback is reported as a 500 and not retried.
pub async fn admin_create_client_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    run_privileged(state, &headers, Role::STAFF, |caller, state| async move {
        let request: CreateClientUserRequest = parse_body(&body)?;
        let (Some(email), Some(password), Some(full_name), Some(dpp)) = (
            required(request.email),
            request.password.filter(|p| !p.is_empty()),
            required(request.full_name),
            required(request.dpp),
        ) else {
            return Err(ApiError::bad_request("Dados obrigatórios ausentes"));
        };
        let dpp = NaiveDate::parse_from_str(&dpp, "%Y-%m-%d")
            .map_err(|_| ApiError::bad_request("dpp must be a date in YYYY-MM-DD format"))?;

        let user = state
            .identity_admin
            .create_user(&NewIdentity {
                email: email.clone(),
                password,
                full_name: full_name.clone(),
                role: Role::Client,
                must_change_password: true,
            })
            .await
            .map_err(|e| match e {
                IdentityError::Rejected { message, .. } => ApiError::bad_request(message),
                other => ApiError::from(other),
            })?;

        let new_client = NewClient {
            owner_id: caller.id,
            user_id: Some(user.id),
            fields: ClientFields {
                full_name: Some(full_name),
                email: Some(email),
                dpp: Some(dpp),
                ..Default::default()
            },
        };

        if let Err(insert_err) = state.clients.insert(&new_client).await {
            error!(error = %insert_err, user_id = %user.id, "Client insert failed, rolling back identity");
            return match state.identity_admin.delete_user(user.id).await {
                Ok(()) => Err(ApiError::bad_request("Client record could not be created")),
                Err(rollback_err) => {
                    error!(error = %rollback_err, user_id = %user.id, "Identity rollback failed");
                    Err(ApiError::upstream(
                        "Client record could not be created and the user account could not be removed",
                    ))
                }
            };
        }

        info!(staff = %caller.id, user_id = %user.id, "Created client user");
        Ok::<_, ApiError>(json!({ "message": "Cliente criado com sucesso" }))
    })
    .await
}
