//! Sign-in flow: identity sign-in, profile resolution, landing route.

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::client::api::{ApiClient, ApiClientError};
use crate::client::guard::{landing_for, Route};
use crate::client::services::ServiceError;
use crate::client::session::{AuthEvent, AuthEvents, Session, SessionController, SessionStore};
use crate::identity::{IdentityProvider, Principal};
use crate::services::ResolveError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SignInError {
    #[error("Conta de usuário inativa.")]
    Inactive,

    #[error("Perfil não encontrado.")]
    ProfileNotFound,

    #[error("E-mail ou senha inválidos.")]
    InvalidCredentials,
}

impl From<&ResolveError> for SignInError {
    fn from(err: &ResolveError) -> Self {
        match err {
            ResolveError::Inactive => SignInError::Inactive,
            ResolveError::ProfileNotFound => SignInError::ProfileNotFound,
            _ => SignInError::InvalidCredentials,
        }
    }
}

/// Owns the session lifecycle of one front-end.
///
/// Every identity change is emitted on [`AuthEvents`] and applied by the
/// [`SessionController`], which is the only writer of the [`SessionStore`].
pub struct AuthService {
    identity: Arc<dyn IdentityProvider>,
    api: ApiClient,
    controller: SessionController,
    store: SessionStore,
    events: AuthEvents,
}

impl AuthService {
    pub fn new(identity: Arc<dyn IdentityProvider>, api: ApiClient) -> Self {
        let (store, controller) = SessionStore::new(Arc::new(api.clone()));
        Self {
            identity,
            api,
            controller,
            store,
            events: AuthEvents::default(),
        }
    }

    pub fn store(&self) -> SessionStore {
        self.store.clone()
    }

    pub fn events(&self) -> &AuthEvents {
        &self.events
    }

    async fn publish(&self, event: AuthEvent) -> Result<Option<Session>, ResolveError> {
        self.events.emit(event.clone());
        self.controller.apply(&event).await
    }

    /// Revoke the token (best effort) and clear the session
    async fn force_sign_out(&self, access_token: &str) {
        if let Err(e) = self.identity.sign_out(access_token).await {
            debug!(error = %e, "token revocation failed");
        }
        // SignedOut never resolves a profile, so this cannot fail
        let _ = self.publish(AuthEvent::SignedOut).await;
    }

    /// Sign in and return the route to land on
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Route, SignInError> {
        let principal = self
            .identity
            .sign_in_with_password(email, password)
            .await
            .map_err(|e| {
                warn!(error = %e, "sign-in rejected");
                SignInError::InvalidCredentials
            })?;
        let access_token = principal.access_token.clone();

        match self.publish(AuthEvent::SignedIn(principal)).await {
            Ok(Some(session)) => {
                info!(user_id = %session.profile.id, role = %session.profile.role, "signed in");
                Ok(landing_for(&session.profile))
            }
            Ok(None) => Err(SignInError::InvalidCredentials),
            Err(e) => {
                warn!(error = %e, "profile check failed after sign-in");
                self.force_sign_out(&access_token).await;
                Err(SignInError::from(&e))
            }
        }
    }

    pub async fn sign_out(&self) {
        match self.store.access_token() {
            Some(token) => self.force_sign_out(&token).await,
            None => {
                let _ = self.publish(AuthEvent::SignedOut).await;
            }
        }
    }

    /// Cold start: rehydrate a persisted principal, if any
    pub async fn restore(&self, principal: Option<Principal>) -> Option<Session> {
        let token = principal.as_ref().map(|p| p.access_token.clone());
        match self.publish(AuthEvent::InitialSession(principal)).await {
            Ok(session) => session,
            Err(e) => {
                debug!(error = %e, "stored session is no longer valid");
                if let (ResolveError::Inactive | ResolveError::ProfileNotFound, Some(token)) = (&e, token) {
                    self.force_sign_out(&token).await;
                }
                None
            }
        }
    }

    /// Change the signed-in user's password, refresh the profile and return
    /// where to go next
    pub async fn change_password(&self, password: &str) -> Result<Route, ServiceError> {
        let session = self
            .store
            .snapshot()
            .session()
            .cloned()
            .ok_or(ServiceError::NotAuthenticated)?;

        self.api
            .change_password(&session.principal.access_token, password)
            .await
            .map_err(|e| match e {
                ApiClientError::Status { status: 401, .. } => ServiceError::NotAuthenticated,
                ApiClientError::Status { message, .. } => ServiceError::Rejected(message),
                other => {
                    warn!(error = %other, "password change failed");
                    ServiceError::Rejected("Não foi possível alterar a senha.".to_string())
                }
            })?;

        let token = session.principal.access_token.clone();
        match self.publish(AuthEvent::TokenRefreshed(session.principal)).await {
            Ok(Some(session)) => Ok(landing_for(&session.profile)),
            _ => {
                self.force_sign_out(&token).await;
                Err(ServiceError::NotAuthenticated)
            }
        }
    }
}
