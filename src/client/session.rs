//! Session Store and identity-change events.
//!
//! [`SessionStore`] is a cheap, cloneable read handle over a `watch` channel.
//! Only the [`SessionController`] holds the sending half, and it changes the
//! state only in response to an [`AuthEvent`].

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::database::models::{Profile, Role};
use crate::identity::Principal;
use crate::services::{ResolveError, ResolveProfile};

/// Signed-in principal plus its resolved profile
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub principal: Principal,
    pub profile: Profile,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Cold start, the stored session has not been checked yet
    Loading,
    Unauthenticated,
    Authenticated(Session),
}

impl SessionState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.session().map(|s| s.profile.role)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }
}

/// Read side of the session cache
#[derive(Clone)]
pub struct SessionStore {
    rx: watch::Receiver<SessionState>,
}

impl SessionStore {
    /// A store starting in `Loading`, and the controller that owns its writes
    pub fn new(resolver: Arc<dyn ResolveProfile>) -> (Self, SessionController) {
        let (tx, rx) = watch::channel(SessionState::Loading);
        (Self { rx }, SessionController { tx, resolver })
    }

    pub fn snapshot(&self) -> SessionState {
        self.rx.borrow().clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.rx
            .borrow()
            .session()
            .map(|s| s.principal.access_token.clone())
    }

    pub fn profile(&self) -> Option<Profile> {
        self.rx.borrow().session().map(|s| s.profile.clone())
    }

    /// Wait until the store has left `Loading`
    pub async fn settled(&self) -> SessionState {
        let mut rx = self.rx.clone();
        let settled = match rx.wait_for(|state| !state.is_loading()).await {
            Ok(state) => state.clone(),
            // Controller gone while still loading: nobody can sign in any more
            Err(_) => SessionState::Unauthenticated,
        };
        settled
    }

    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.rx.clone()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    /// Result of cold-start rehydration
    InitialSession(Option<Principal>),
    SignedIn(Principal),
    SignedOut,
    TokenRefreshed(Principal),
}

/// Receives identity-change events for as long as its [`Subscription`] lives
#[async_trait]
pub trait AuthObserver: Send + Sync {
    async fn on_event(&self, event: AuthEvent);
}

/// Broadcasts identity-change events to subscribers
#[derive(Clone)]
pub struct AuthEvents {
    tx: broadcast::Sender<AuthEvent>,
}

impl Default for AuthEvents {
    fn default() -> Self {
        Self::new(16)
    }
}

impl AuthEvents {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn emit(&self, event: AuthEvent) {
        debug!(?event, "auth event");
        // No subscribers is fine
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Forward every event to `observer` until the returned guard is dropped
    pub fn observe(&self, observer: Arc<dyn AuthObserver>) -> Subscription {
        let mut rx = self.tx.subscribe();
        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => observer.on_event(event).await,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("auth observer lagged, skipped {} events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        Subscription { handle }
    }
}

/// Unsubscribes on drop
#[must_use = "dropping the subscription unsubscribes immediately"]
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// The identity-change handler: sole writer of the [`SessionStore`]
pub struct SessionController {
    tx: watch::Sender<SessionState>,
    resolver: Arc<dyn ResolveProfile>,
}

impl SessionController {
    /// Apply one identity change. Returns the resolved session, if any.
    ///
    /// Resolution failures leave the store `Unauthenticated`; callers decide
    /// whether the token must also be revoked.
    pub async fn apply(&self, event: &AuthEvent) -> Result<Option<Session>, ResolveError> {
        let principal = match event {
            AuthEvent::SignedIn(p) | AuthEvent::TokenRefreshed(p) | AuthEvent::InitialSession(Some(p)) => {
                p.clone()
            }
            AuthEvent::SignedOut | AuthEvent::InitialSession(None) => {
                self.tx.send_replace(SessionState::Unauthenticated);
                return Ok(None);
            }
        };

        match self.resolver.resolve(&principal.access_token).await {
            Ok(profile) => {
                let session = Session { principal, profile };
                self.tx
                    .send_replace(SessionState::Authenticated(session.clone()));
                Ok(Some(session))
            }
            Err(e) => {
                debug!(error = %e, "profile resolution failed, clearing session");
                self.tx.send_replace(SessionState::Unauthenticated);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    struct FixedResolver(Result<Profile, ()>);

    #[async_trait]
    impl ResolveProfile for FixedResolver {
        async fn resolve(&self, _token: &str) -> Result<Profile, ResolveError> {
            self.0.clone().map_err(|_| ResolveError::Inactive)
        }
    }

    fn profile() -> Profile {
        Profile {
            id: Uuid::new_v4(),
            full_name: None,
            email: "a@example.com".to_string(),
            role: Role::Admin,
            active: true,
            must_change_password: false,
            created_at: Utc::now(),
        }
    }

    fn principal() -> Principal {
        Principal {
            id: Uuid::new_v4(),
            email: "a@example.com".to_string(),
            access_token: "token".to_string(),
        }
    }

    #[tokio::test]
    async fn starts_loading_and_settles_on_first_event() {
        let (store, controller) = SessionStore::new(Arc::new(FixedResolver(Ok(profile()))));
        assert!(store.snapshot().is_loading());

        let waiter = {
            let store = store.clone();
            tokio::spawn(async move { store.settled().await })
        };
        controller
            .apply(&AuthEvent::InitialSession(Some(principal())))
            .await
            .unwrap();

        let settled = waiter.await.unwrap();
        assert_eq!(settled.role(), Some(Role::Admin));
        assert_eq!(store.access_token().as_deref(), Some("token"));
    }

    #[tokio::test]
    async fn failed_resolution_clears_session() {
        let (store, controller) = SessionStore::new(Arc::new(FixedResolver(Err(()))));
        let result = controller.apply(&AuthEvent::SignedIn(principal())).await;
        assert!(matches!(result, Err(ResolveError::Inactive)));
        assert_eq!(store.snapshot(), SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn sign_out_clears_session() {
        let (store, controller) = SessionStore::new(Arc::new(FixedResolver(Ok(profile()))));
        controller.apply(&AuthEvent::SignedIn(principal())).await.unwrap();
        controller.apply(&AuthEvent::SignedOut).await.unwrap();
        assert!(store.access_token().is_none());
    }

    #[tokio::test]
    async fn settled_without_controller_is_unauthenticated() {
        let (store, controller) = SessionStore::new(Arc::new(FixedResolver(Ok(profile()))));
        drop(controller);
        assert_eq!(store.settled().await, SessionState::Unauthenticated);
    }
}
