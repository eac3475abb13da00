use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};

use crate::database::models::Profile;
use crate::database::{DatabaseError, ProfileStore};
use crate::identity::{IdentityError, IdentityProvider};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("missing or invalid bearer token")]
    Unauthenticated,

    #[error("profile not found")]
    ProfileNotFound,

    #[error("user inactive")]
    Inactive,

    #[error("profile store error: {0}")]
    Store(#[from] DatabaseError),

    #[error("identity platform error: {0}")]
    Upstream(String),
}

/// Bearer token to active profile.
///
/// Implemented server side by [`ProfileResolver`] and client side by the API
/// client, which asks the `me` function.
#[async_trait]
pub trait ResolveProfile: Send + Sync {
    async fn resolve(&self, access_token: &str) -> Result<Profile, ResolveError>;
}

/// Verifies the token with the non-privileged identity capability, then reads
/// the profile with the elevated store
#[derive(Clone)]
pub struct ProfileResolver {
    identity: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileStore>,
}

impl ProfileResolver {
    pub fn new(identity: Arc<dyn IdentityProvider>, profiles: Arc<dyn ProfileStore>) -> Self {
        Self { identity, profiles }
    }

    /// Like [`ResolveProfile::resolve`] but keeps inactive profiles, so the
    /// gateway can decide how to answer them
    pub async fn lookup(&self, access_token: &str) -> Result<Profile, ResolveError> {
        if access_token.trim().is_empty() {
            return Err(ResolveError::Unauthenticated);
        }

        let user = self
            .identity
            .get_user(access_token)
            .await
            .map_err(token_rejected)?;

        if let Some(profile) = self.profiles.find(user.id).await? {
            return Ok(profile);
        }

        // Profiles go away with their identity, so a verified token without
        // one may belong to a deleted user
        self.identity
            .confirm_user(access_token)
            .await
            .map_err(token_rejected)?;
        Err(ResolveError::ProfileNotFound)
    }
}

fn token_rejected(e: IdentityError) -> ResolveError {
    match e {
        IdentityError::InvalidToken | IdentityError::UserNotFound | IdentityError::InvalidCredentials => {
            debug!(error = %e, "Bearer token rejected");
            ResolveError::Unauthenticated
        }
        other => {
            error!(error = %other, "Identity platform failure while verifying token");
            ResolveError::Upstream(other.to_string())
        }
    }
}

#[async_trait]
impl ResolveProfile for ProfileResolver {
    async fn resolve(&self, access_token: &str) -> Result<Profile, ResolveError> {
        let profile = self.lookup(access_token).await?;
        if !profile.active {
            return Err(ResolveError::Inactive);
        }
        Ok(profile)
    }
}
