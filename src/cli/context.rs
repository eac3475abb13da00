//! Per-invocation wiring: configured clients plus the restored session.

use std::sync::Arc;
use tracing::debug;

use crate::cli::config::{self, CliConfig, StoredSession};
use crate::client::{navigate, ApiClient, AuthService, Navigation, Route, SessionStore};
use crate::identity::GoTrueClient;

pub struct Context {
    pub config: CliConfig,
    pub api: ApiClient,
    pub auth: AuthService,
}

impl Context {
    pub fn load() -> anyhow::Result<Self> {
        let config = config::load_cli_config()?;
        let api = ApiClient::new(&config.api_url)?;
        let identity = GoTrueClient::new(config.identity_url(), config.anon_key.clone())?;
        let auth = AuthService::new(Arc::new(identity), api.clone());
        Ok(Self { config, api, auth })
    }

    pub fn store(&self) -> SessionStore {
        self.auth.store()
    }

    /// Rehydrate the persisted principal. A session the server no longer
    /// honours is forgotten.
    pub async fn restore(&self) -> anyhow::Result<()> {
        let stored = config::load_session()?;
        let had_session = stored.is_some();
        let restored = self.auth.restore(stored.map(|s| s.principal)).await;
        if had_session && restored.is_none() {
            debug!("stored session rejected, clearing it");
            config::clear_session()?;
        }
        Ok(())
    }

    /// Restore the session and pass the Route Guard for `route`
    pub async fn enter(&self, route: Route) -> anyhow::Result<()> {
        self.restore().await?;
        match navigate(&route, &self.store()).await {
            Navigation::Enter => Ok(()),
            Navigation::Redirect(to) if to == Route::LOGIN => {
                anyhow::bail!("Acesso a {} requer login com um perfil autorizado (doula auth login)", route.path)
            }
            Navigation::Redirect(to) => anyhow::bail!("Acesso a {} redirecionado para {}", route.path, to.path),
            Navigation::Pending => anyhow::bail!("Sessão ainda carregando"),
        }
    }

    /// Persist whatever the store holds after a sign-in or password change
    pub fn persist(&self) -> anyhow::Result<()> {
        match self.store().snapshot().session() {
            Some(session) => config::save_session(&StoredSession::new(session.principal.clone())),
            None => config::clear_session(),
        }
    }
}
