#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{Days, Utc};
use reqwest::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

use papo_doula_api::app::app;
use papo_doula_api::client::{ApiClient, AuthService};
use papo_doula_api::config::AppConfig;
use papo_doula_api::database::models::{ClientFields, NewClient, Role};
use papo_doula_api::database::ClientStore;
use papo_doula_api::identity::GoTrueClient;
use papo_doula_api::state::{AppState, MemoryBackend};

pub const PASSWORD: &str = "segredo123";

/// A seeded account and the token it signed in with
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub token: String,
}

pub struct TestApp {
    pub base_url: String,
    pub backend: MemoryBackend,
    pub http: reqwest::Client,
    pub admin: TestUser,
    pub assistant: TestUser,
    pub client: TestUser,
    /// Signed in before the profile was deactivated
    pub inactive: TestUser,
    /// Client record linked to `client`, owned by `assistant`
    pub client_record: Uuid,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST a gateway function with an optional bearer token
    pub async fn function(&self, name: &str, token: Option<&str>, body: Value) -> Result<reqwest::Response> {
        let mut request = self.http.post(self.url(&format!("/functions/v1/{}", name))).json(&body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        Ok(request.send().await?)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<String> {
        sign_in(&self.http, &self.base_url, email, password).await
    }

    /// Client-side stack pointed at this server
    pub fn auth_service(&self) -> Result<AuthService> {
        let api = ApiClient::new(&self.base_url)?;
        let identity = GoTrueClient::new(&self.base_url, "")?;
        Ok(AuthService::new(Arc::new(identity), api))
    }

    pub fn api(&self) -> Result<ApiClient> {
        Ok(ApiClient::new(&self.base_url)?)
    }

    /// A second server sharing this store that verifies tokens locally with
    /// the signing secret and uses this server as its identity platform
    pub async fn spawn_locally_verifying(&self) -> Result<String> {
        let config = AppConfig::development();
        let identity = GoTrueClient::new(&self.base_url, "anon")?
            .with_jwt_secret(config.platform.jwt_secret.clone());
        let state = AppState {
            config: Arc::new(config),
            identity: Arc::new(identity),
            identity_admin: self.backend.identity.clone(),
            profiles: self.backend.store.clone(),
            clients: self.backend.store.clone(),
            database: None,
        };
        serve(app(state), &self.http).await
    }
}

async fn serve(router: axum::Router, http: &reqwest::Client) -> Result<String> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    let base_url = format!("http://127.0.0.1:{}", port);
    wait_ready(http, &base_url, Duration::from_secs(5)).await?;
    Ok(base_url)
}

async fn sign_in(http: &reqwest::Client, base_url: &str, email: &str, password: &str) -> Result<String> {
    let response = http
        .post(format!("{}/auth/v1/token?grant_type=password", base_url))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await?;
    anyhow::ensure!(response.status() == StatusCode::OK, "sign-in failed for {}", email);
    let body: Value = response.json().await?;
    body["access_token"]
        .as_str()
        .map(str::to_string)
        .context("token response without access_token")
}

async fn seed(app: &MemoryBackend, http: &reqwest::Client, base_url: &str, email: &str, name: &str, role: Role) -> Result<TestUser> {
    let id = app.seed_user(email, PASSWORD, name, role).await?;
    let token = sign_in(http, base_url, email, PASSWORD).await?;
    Ok(TestUser { id, email: email.to_string(), token })
}

async fn wait_ready(http: &reqwest::Client, base_url: &str, timeout: Duration) -> Result<()> {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if let Ok(resp) = http.get(format!("{}/health", base_url)).send().await {
            if resp.status() == StatusCode::OK {
                return Ok(());
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    anyhow::bail!("server did not become ready on {} within {:?}", base_url, timeout)
}

/// Start an in-memory server on a free port with a seeded practice
pub async fn spawn_app() -> Result<TestApp> {
    let config = AppConfig::development();
    let secret = config.platform.jwt_secret.clone().context("development config has a secret")?;
    let backend = MemoryBackend::new(&secret, 24);
    let http = reqwest::Client::new();
    let base_url = serve(app(backend.state(config)), &http).await?;

    let admin = seed(&backend, &http, &base_url, "admin@papodedoula.com", "Ana Admin", Role::Admin).await?;
    let assistant = seed(&backend, &http, &base_url, "assistente@papodedoula.com", "Bia Assistente", Role::Assistant).await?;
    let client = seed(&backend, &http, &base_url, "joana@example.com", "Joana Souza", Role::Client).await?;
    let inactive = seed(&backend, &http, &base_url, "inativa@papodedoula.com", "Carla Inativa", Role::Assistant).await?;
    anyhow::ensure!(backend.deactivate(inactive.id).await, "failed to deactivate seeded user");

    let dpp = Utc::now().date_naive() + Days::new(100);
    let record = backend
        .store
        .insert(&NewClient {
            owner_id: assistant.id,
            user_id: Some(client.id),
            fields: ClientFields {
                full_name: Some("Joana Souza".to_string()),
                email: Some(client.email.clone()),
                phone: Some("(11) 98888-7777".to_string()),
                dpp: Some(dpp),
                ..Default::default()
            },
        })
        .await?;

    Ok(TestApp {
        base_url,
        backend,
        http,
        admin,
        assistant,
        client,
        inactive,
        client_record: record.id,
    })
}
