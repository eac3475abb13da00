//! Identity platform seam.
//!
//! [`IdentityProvider`] is the non-privileged capability (sign-in, token
//! verification, self-service password change). [`IdentityAdmin`] needs the
//! elevated service credential and is only reached after the gateway has
//! authorized the caller.

pub mod gotrue;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::Role;

pub use gotrue::GoTrueClient;
pub use memory::MemoryIdentity;

/// Verified identity behind a bearer token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// Signed-in principal: identity plus its opaque bearer token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
    pub access_token: String,
}

/// Identity to create through the admin capability; the metadata drives
/// profile provisioning
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
    pub must_change_password: bool,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("invalid or expired token")]
    InvalidToken,

    #[error("invalid login credentials")]
    InvalidCredentials,

    #[error("user not found")]
    UserNotFound,

    /// The platform refused the request (duplicate email, weak password, ...)
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("unexpected identity response: {0}")]
    Protocol(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in_with_password(&self, email: &str, password: &str)
        -> Result<Principal, IdentityError>;

    /// Verify a bearer token and return the identity it belongs to
    async fn get_user(&self, access_token: &str) -> Result<AuthUser, IdentityError>;

    /// Like `get_user`, but always asks the platform whether the identity
    /// still exists, even when tokens are otherwise checked locally
    async fn confirm_user(&self, access_token: &str) -> Result<AuthUser, IdentityError> {
        self.get_user(access_token).await
    }

    async fn update_password(&self, access_token: &str, password: &str) -> Result<(), IdentityError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError>;
}

#[async_trait]
pub trait IdentityAdmin: Send + Sync {
    async fn create_user(&self, new: &NewIdentity) -> Result<AuthUser, IdentityError>;

    async fn delete_user(&self, id: Uuid) -> Result<(), IdentityError>;

    /// Password recovery action link for `email`
    async fn generate_recovery_link(
        &self,
        email: &str,
        redirect_to: Option<&str>,
    ) -> Result<String, IdentityError>;
}
