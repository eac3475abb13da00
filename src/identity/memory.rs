//! Process-local identity platform for development and tests.
//!
//! Issues real HS256 access tokens and provisions a profile row in the paired
//! [`MemoryStore`] whenever an identity is created, the way the database
//! trigger does for the hosted platform.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::{self, Claims};
use crate::database::models::Profile;
use crate::database::MemoryStore;
use crate::identity::{AuthUser, IdentityAdmin, IdentityError, IdentityProvider, NewIdentity, Principal};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone)]
struct StoredUser {
    id: Uuid,
    email: String,
    password: String,
}

pub struct MemoryIdentity {
    secret: String,
    expiry_hours: u64,
    users: RwLock<HashMap<String, StoredUser>>,
    /// Signed-out tokens and their expiry, kept only until they would lapse anyway
    revoked: RwLock<HashMap<String, i64>>,
    store: Arc<MemoryStore>,
    fail_deletes: AtomicBool,
}

impl MemoryIdentity {
    pub fn new(secret: impl Into<String>, store: Arc<MemoryStore>) -> Self {
        Self {
            secret: secret.into(),
            expiry_hours: 24,
            users: RwLock::new(HashMap::new()),
            revoked: RwLock::new(HashMap::new()),
            store,
            fail_deletes: AtomicBool::new(false),
        }
    }

    pub fn with_expiry_hours(mut self, hours: u64) -> Self {
        self.expiry_hours = hours;
        self
    }

    /// Make every following `delete_user` fail, to exercise failed rollbacks
    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub async fn user_exists(&self, email: &str) -> bool {
        self.users.read().await.contains_key(&normalize(email))
    }

    fn validate_password(password: &str) -> Result<(), IdentityError> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(IdentityError::Rejected {
                status: 422,
                message: format!("Password should be at least {} characters", MIN_PASSWORD_LEN),
            });
        }
        Ok(())
    }

    async fn verify(&self, access_token: &str) -> Result<Claims, IdentityError> {
        if self.revoked.read().await.contains_key(access_token) {
            return Err(IdentityError::InvalidToken);
        }
        auth::verify_access_token(access_token, &self.secret).map_err(|e| {
            debug!(error = %e, "Rejected bearer token");
            IdentityError::InvalidToken
        })
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Principal, IdentityError> {
        let user = self
            .users
            .read()
            .await
            .get(&normalize(email))
            .filter(|u| u.password == password)
            .cloned()
            .ok_or(IdentityError::InvalidCredentials)?;

        let claims = Claims::new(user.id, &user.email, self.expiry_hours);
        let access_token = auth::issue_access_token(&claims, &self.secret)
            .map_err(|e| IdentityError::Protocol(e.to_string()))?;

        Ok(Principal {
            id: user.id,
            email: user.email,
            access_token,
        })
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, IdentityError> {
        let claims = self.verify(access_token).await?;
        let users = self.users.read().await;
        users
            .values()
            .find(|u| u.id == claims.sub)
            .map(|u| AuthUser {
                id: u.id,
                email: Some(u.email.clone()),
            })
            .ok_or(IdentityError::UserNotFound)
    }

    async fn update_password(&self, access_token: &str, password: &str) -> Result<(), IdentityError> {
        let claims = self.verify(access_token).await?;
        Self::validate_password(password)?;

        let mut users = self.users.write().await;
        let user = users
            .values_mut()
            .find(|u| u.id == claims.sub)
            .ok_or(IdentityError::UserNotFound)?;
        user.password = password.to_string();
        Ok(())
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError> {
        let claims = self.verify(access_token).await?;
        let now = Utc::now().timestamp();
        let mut revoked = self.revoked.write().await;
        revoked.retain(|_, exp| *exp > now);
        revoked.insert(access_token.to_string(), claims.exp);
        Ok(())
    }
}

#[async_trait]
impl IdentityAdmin for MemoryIdentity {
    async fn create_user(&self, new: &NewIdentity) -> Result<AuthUser, IdentityError> {
        Self::validate_password(&new.password)?;
        let key = normalize(&new.email);

        let user = {
            let mut users = self.users.write().await;
            if users.contains_key(&key) {
                return Err(IdentityError::Rejected {
                    status: 422,
                    message: "A user with this email address has already been registered".to_string(),
                });
            }
            let user = StoredUser {
                id: Uuid::new_v4(),
                email: new.email.trim().to_string(),
                password: new.password.clone(),
            };
            users.insert(key, user.clone());
            user
        };

        let profile = Profile {
            id: user.id,
            full_name: Some(new.full_name.clone()),
            email: user.email.clone(),
            role: new.role,
            active: true,
            must_change_password: new.must_change_password,
            created_at: Utc::now(),
        };
        self.store
            .insert_profile(profile)
            .await
            .map_err(|e| IdentityError::Protocol(e.to_string()))?;

        info!(user_id = %user.id, role = %new.role, "Created identity");
        Ok(AuthUser {
            id: user.id,
            email: Some(user.email),
        })
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), IdentityError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(IdentityError::Rejected {
                status: 500,
                message: "Database error deleting user".to_string(),
            });
        }

        let removed = {
            let mut users = self.users.write().await;
            let before = users.len();
            users.retain(|_, u| u.id != id);
            users.len() != before
        };
        if !removed {
            return Err(IdentityError::UserNotFound);
        }

        self.store.remove_profile(id).await;
        info!(user_id = %id, "Deleted identity");
        Ok(())
    }

    async fn generate_recovery_link(
        &self,
        email: &str,
        redirect_to: Option<&str>,
    ) -> Result<String, IdentityError> {
        if !self.user_exists(email).await {
            return Err(IdentityError::UserNotFound);
        }
        let mut link = format!(
            "http://localhost/auth/v1/verify?token={}&type=recovery",
            Uuid::new_v4().simple()
        );
        if let Some(to) = redirect_to {
            link.push_str("&redirect_to=");
            link.push_str(to);
        }
        Ok(link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Role;
    use crate::database::ProfileStore;

    fn identity() -> (MemoryIdentity, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (MemoryIdentity::new("test-secret", store.clone()), store)
    }

    fn new_identity(email: &str, password: &str) -> NewIdentity {
        NewIdentity {
            email: email.to_string(),
            password: password.to_string(),
            full_name: "Maria".to_string(),
            role: Role::Client,
            must_change_password: true,
        }
    }

    #[tokio::test]
    async fn create_user_provisions_profile() {
        let (identity, store) = identity();
        let user = identity.create_user(&new_identity("maria@example.com", "secret1")).await.unwrap();

        let profile = store.find(user.id).await.unwrap().unwrap();
        assert_eq!(profile.role, Role::Client);
        assert!(profile.must_change_password);

        identity.delete_user(user.id).await.unwrap();
        assert!(store.find(user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sign_out_forgets_lapsed_revocations() {
        let (identity, _) = identity();
        identity.create_user(&new_identity("out@example.com", "secret1")).await.unwrap();
        let principal = identity.sign_in_with_password("out@example.com", "secret1").await.unwrap();

        identity
            .revoked
            .write()
            .await
            .insert("lapsed-token".to_string(), Utc::now().timestamp() - 10);
        identity.sign_out(&principal.access_token).await.unwrap();

        let revoked = identity.revoked.read().await;
        assert_eq!(revoked.len(), 1);
        assert!(revoked.contains_key(&principal.access_token));
        drop(revoked);
        assert!(matches!(
            identity.get_user(&principal.access_token).await,
            Err(IdentityError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn duplicate_email_and_short_password_are_rejected() {
        let (identity, _) = identity();
        identity.create_user(&new_identity("a@example.com", "secret1")).await.unwrap();

        let dup = identity.create_user(&new_identity("A@example.com", "secret1")).await;
        assert!(matches!(dup, Err(IdentityError::Rejected { status: 422, .. })));

        let short = identity.create_user(&new_identity("b@example.com", "123")).await;
        assert!(matches!(short, Err(IdentityError::Rejected { status: 422, .. })));
    }

    #[tokio::test]
    async fn signed_out_token_stops_working() {
        let (identity, _) = identity();
        identity.create_user(&new_identity("c@example.com", "secret1")).await.unwrap();

        assert!(matches!(
            identity.sign_in_with_password("c@example.com", "wrong").await,
            Err(IdentityError::InvalidCredentials)
        ));

        let principal = identity.sign_in_with_password("c@example.com", "secret1").await.unwrap();
        assert_eq!(identity.get_user(&principal.access_token).await.unwrap().id, principal.id);

        identity.sign_out(&principal.access_token).await.unwrap();
        assert!(matches!(
            identity.get_user(&principal.access_token).await,
            Err(IdentityError::InvalidToken)
        ));
    }
}
