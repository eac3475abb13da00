use anyhow::{anyhow, Context};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{AppConfig, Backend};
use crate::database::models::{ProfilePatch, Role};
use crate::database::{
    ClientStore, DatabaseManager, MemoryStore, PgClientStore, PgProfileStore, ProfileStore,
};
use crate::identity::{
    GoTrueClient, IdentityAdmin, IdentityError, IdentityProvider, MemoryIdentity, NewIdentity,
};
use crate::services::ProfileResolver;

/// Shared handles for every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// Non-privileged identity capability (token verification, password change)
    pub identity: Arc<dyn IdentityProvider>,
    /// Elevated identity capability; reach it only through the gateway
    pub identity_admin: Arc<dyn IdentityAdmin>,
    pub profiles: Arc<dyn ProfileStore>,
    pub clients: Arc<dyn ClientStore>,
    pub database: Option<DatabaseManager>,
}

impl AppState {
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        match config.backend {
            Backend::Postgres => Self::postgres(config).await,
            Backend::Memory => {
                let secret = config
                    .platform
                    .jwt_secret
                    .clone()
                    .ok_or_else(|| anyhow!("memory backend requires SUPABASE_JWT_SECRET"))?;
                let backend = MemoryBackend::new(&secret, config.security.jwt_expiry_hours);
                if let (Some(email), Some(password)) =
                    (&config.seed.admin_email, &config.seed.admin_password)
                {
                    backend
                        .seed_user(email, password, "Administrador", Role::Admin)
                        .await
                        .context("failed to seed admin user")?;
                    info!("Seeded admin user {}", email);
                }
                Ok(backend.state(config))
            }
        }
    }

    async fn postgres(config: AppConfig) -> anyhow::Result<Self> {
        let database = DatabaseManager::connect(&config.database).await?;

        let url = config
            .platform
            .url
            .as_deref()
            .ok_or_else(|| anyhow!("SUPABASE_URL is required for the postgres backend"))?;
        let anon_key = config
            .platform
            .anon_key
            .clone()
            .ok_or_else(|| anyhow!("SUPABASE_ANON_KEY is required for the postgres backend"))?;
        let service_key = config
            .platform
            .service_role_key
            .clone()
            .ok_or_else(|| anyhow!("SUPABASE_SERVICE_ROLE_KEY is required for the postgres backend"))?;
        if config.platform.jwt_secret.is_none() {
            warn!("SUPABASE_JWT_SECRET not set, tokens will be verified remotely");
        }

        let identity = GoTrueClient::new(url, anon_key)?.with_jwt_secret(config.platform.jwt_secret.clone());
        let identity_admin = GoTrueClient::new(url, service_key)?;
        let pool = database.pool().clone();

        Ok(Self {
            config: Arc::new(config),
            identity: Arc::new(identity),
            identity_admin: Arc::new(identity_admin),
            profiles: Arc::new(PgProfileStore::new(pool.clone())),
            clients: Arc::new(PgClientStore::new(pool)),
            database: Some(database),
        })
    }

    pub fn resolver(&self) -> ProfileResolver {
        ProfileResolver::new(self.identity.clone(), self.profiles.clone())
    }
}

/// Identity and store living in this process
#[derive(Clone)]
pub struct MemoryBackend {
    pub identity: Arc<MemoryIdentity>,
    pub store: Arc<MemoryStore>,
}

impl MemoryBackend {
    pub fn new(secret: &str, expiry_hours: u64) -> Self {
        let store = Arc::new(MemoryStore::new());
        let identity =
            Arc::new(MemoryIdentity::new(secret, store.clone()).with_expiry_hours(expiry_hours));
        Self { identity, store }
    }

    /// Create an identity (and its profile) that may sign in right away
    pub async fn seed_user(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        role: Role,
    ) -> Result<uuid::Uuid, IdentityError> {
        let user = self
            .identity
            .create_user(&NewIdentity {
                email: email.to_string(),
                password: password.to_string(),
                full_name: full_name.to_string(),
                role,
                must_change_password: false,
            })
            .await?;
        Ok(user.id)
    }

    pub async fn deactivate(&self, id: uuid::Uuid) -> bool {
        let patch = ProfilePatch {
            active: Some(false),
            ..Default::default()
        };
        matches!(self.store.update(id, &patch).await, Ok(Some(_)))
    }

    pub fn state(&self, config: AppConfig) -> AppState {
        AppState {
            config: Arc::new(config),
            identity: self.identity.clone(),
            identity_admin: self.identity.clone(),
            profiles: self.store.clone(),
            clients: self.store.clone(),
            database: None,
        }
    }
}
