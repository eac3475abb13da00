// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::database::DatabaseError;
use crate::identity::IdentityError;
use crate::services::ResolveError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    Unauthenticated(String),

    // 403 Forbidden, profile deactivated
    Inactive(String),

    // 403 Forbidden, role outside the allow-list
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 500, identity platform or store failure
    Upstream(String),

    // 500 Internal Server Error
    Unknown(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Unauthenticated(_) => 401,
            ApiError::Inactive(_) => 403,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Upstream(_) => 500,
            ApiError::Unknown(_) => 500,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthenticated(msg)
            | ApiError::Inactive(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Upstream(msg)
            | ApiError::Unknown(msg) => msg,
        }
    }

    /// Get error code for logs
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthenticated(_) => "UNAUTHENTICATED",
            ApiError::Inactive(_) => "INACTIVE",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Upstream(_) => "UPSTREAM_FAILURE",
            ApiError::Unknown(_) => "UNKNOWN",
        }
    }

    /// Convert to JSON response body: `{"error": message}`
    pub fn to_json(&self) -> Value {
        json!({ "error": self.message() })
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        ApiError::Unauthenticated(message.into())
    }

    pub fn inactive(message: impl Into<String>) -> Self {
        ApiError::Inactive(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        ApiError::Upstream(message.into())
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        ApiError::Unknown(message.into())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => ApiError::not_found(msg),
            DatabaseError::Constraint(msg) => {
                tracing::error!("Constraint violation: {}", msg);
                ApiError::bad_request("Request violates a data constraint")
            }
            other => {
                // Don't expose internal SQL errors to clients
                tracing::error!("Database error: {}", other);
                ApiError::upstream("Database error occurred")
            }
        }
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidToken | IdentityError::InvalidCredentials => {
                ApiError::unauthenticated("Invalid JWT")
            }
            IdentityError::UserNotFound => ApiError::not_found("User not found"),
            IdentityError::Rejected { message, .. } => ApiError::bad_request(message),
            other => {
                tracing::error!("Identity platform error: {}", other);
                ApiError::upstream("Identity service error")
            }
        }
    }
}

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::Unauthenticated => ApiError::unauthenticated("Invalid JWT"),
            ResolveError::ProfileNotFound => ApiError::not_found("Profile not found"),
            ResolveError::Inactive => ApiError::inactive("User inactive"),
            ResolveError::Store(e) => e.into(),
            ResolveError::Upstream(msg) => {
                tracing::error!("Profile resolution failed upstream: {}", msg);
                ApiError::upstream("Identity service error")
            }
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_is_error_object() {
        let err = ApiError::forbidden("Acesso negado");
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.to_json(), json!({ "error": "Acesso negado" }));
    }

    #[test]
    fn store_errors_hide_sql_text() {
        let err: ApiError = DatabaseError::QueryError("syntax error at or near SELECT".into()).into();
        assert_eq!(err.status_code(), 500);
        assert!(!err.message().contains("SELECT"));
    }

    #[test]
    fn resolver_errors_map_to_status() {
        assert_eq!(ApiError::from(ResolveError::Unauthenticated).status_code(), 401);
        assert_eq!(ApiError::from(ResolveError::ProfileNotFound).status_code(), 404);
        assert_eq!(ApiError::from(ResolveError::Inactive).status_code(), 403);
    }
}
