//! Typed CRUD services behind the CLI views.
//!
//! Failures never expose raw server or store text: the cause is logged and
//! the caller gets the operation's fixed message.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

use crate::client::api::{ApiClient, ApiClientError};
use crate::client::form::{ClientForm, FormError};
use crate::client::session::SessionStore;
use crate::database::models::{Client, ClientPatch, ClientSummary, Role, UserSummary};
use crate::portal::{mock_appointments, DashboardSummary, PortalOverview};

pub const LIST_CLIENTS_FAILED: &str = "Não foi possível buscar os clientes.";
pub const CREATE_CLIENT_FAILED: &str = "Não foi possível cadastrar o cliente.";
pub const UPDATE_CLIENT_FAILED: &str = "Não foi possível atualizar os dados do cliente.";
pub const DELETE_CLIENT_FAILED: &str = "Não foi possível deletar o cliente.";
pub const ADMIN_LIST_CLIENTS_FAILED: &str = "Não foi possível buscar a lista de gestantes.";
pub const ADMIN_CREATE_CLIENT_FAILED: &str = "Falha ao criar nova gestante.";
pub const LIST_USERS_FAILED: &str = "Não foi possível buscar a lista de usuários.";
pub const UPDATE_USER_FAILED: &str = "Falha ao atualizar o usuário.";
pub const RESET_PASSWORD_FAILED: &str = "Falha ao gerar link de recuperação de senha.";
pub const FORCE_PASSWORD_CHANGE_FAILED: &str = "Falha ao forçar a troca de senha do usuário.";
pub const PORTAL_FAILED: &str = "Não foi possível carregar os dados do portal.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// Fixed user-facing message for a failed operation
    #[error("{0}")]
    Failed(&'static str),

    #[error("Sessão expirada. Faça login novamente.")]
    NotAuthenticated,

    #[error(transparent)]
    Invalid(#[from] FormError),

    /// Message the server chose for the user (password change)
    #[error("{0}")]
    Rejected(String),
}

fn token(session: &SessionStore) -> Result<String, ServiceError> {
    session.access_token().ok_or(ServiceError::NotAuthenticated)
}

/// Log the real cause, hand back the fixed message
fn failed(message: &'static str) -> impl FnOnce(ApiClientError) -> ServiceError {
    move |e| {
        error!(error = %e, "{}", message);
        ServiceError::Failed(message)
    }
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    message: String,
}

/// Owner-scoped client records of the signed-in staff member
#[derive(Clone)]
pub struct ClientsService {
    api: ApiClient,
    session: SessionStore,
}

impl ClientsService {
    pub fn new(api: ApiClient, session: SessionStore) -> Self {
        Self { api, session }
    }

    pub async fn list(&self) -> Result<Vec<Client>, ServiceError> {
        let token = token(&self.session)?;
        self.api
            .list_clients(&token)
            .await
            .map_err(failed(LIST_CLIENTS_FAILED))
    }

    pub async fn create(&self, form: &ClientForm) -> Result<Client, ServiceError> {
        let fields = form.sanitize_new()?;
        let token = token(&self.session)?;
        self.api
            .create_client(&token, &fields)
            .await
            .map_err(failed(CREATE_CLIENT_FAILED))
    }

    /// Save the edit form: fields left empty are cleared
    pub async fn update(&self, id: Uuid, form: &ClientForm) -> Result<Client, ServiceError> {
        let patch = form.sanitize_edit()?;
        self.patch(id, &patch).await
    }

    /// Change only the fields `patch` carries
    pub async fn patch(&self, id: Uuid, patch: &ClientPatch) -> Result<Client, ServiceError> {
        let token = token(&self.session)?;
        self.api
            .update_client(&token, id, patch)
            .await
            .map_err(failed(UPDATE_CLIENT_FAILED))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let token = token(&self.session)?;
        self.api
            .delete_client(&token, id)
            .await
            .map_err(failed(DELETE_CLIENT_FAILED))
    }
}

/// Input of the admin client-plus-account creation
#[derive(Debug, Clone)]
pub struct NewClientUser {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub dpp: NaiveDate,
}

/// Practice-wide client operations through the gateway
#[derive(Clone)]
pub struct AdminClientsService {
    api: ApiClient,
    session: SessionStore,
}

impl AdminClientsService {
    pub fn new(api: ApiClient, session: SessionStore) -> Self {
        Self { api, session }
    }

    pub async fn list(&self) -> Result<Vec<ClientSummary>, ServiceError> {
        let token = token(&self.session)?;
        self.api
            .function(&token, "admin-list-clients", &json!({}))
            .await
            .map_err(failed(ADMIN_LIST_CLIENTS_FAILED))
    }

    /// Staff dashboard figures on `today`, over every client's schedule
    pub async fn dashboard(&self, today: NaiveDate) -> Result<DashboardSummary, ServiceError> {
        let clients = self.list().await?;
        let appointments: Vec<_> = clients
            .iter()
            .flat_map(|c| mock_appointments(Some(c.id), today))
            .collect();
        Ok(DashboardSummary::build(&clients, &appointments, today))
    }

    pub async fn create_client_user(&self, new: &NewClientUser) -> Result<String, ServiceError> {
        let token = token(&self.session)?;
        let body = json!({
            "email": new.email,
            "password": new.password,
            "full_name": new.full_name,
            "dpp": new.dpp.format("%Y-%m-%d").to_string(),
        });
        let response: MessageResponse = self
            .api
            .function(&token, "admin-create-client-user", &body)
            .await
            .map_err(failed(ADMIN_CREATE_CLIENT_FAILED))?;
        Ok(response.message)
    }
}

/// Staff and account management through the gateway
#[derive(Clone)]
pub struct UsersService {
    api: ApiClient,
    session: SessionStore,
}

impl UsersService {
    pub fn new(api: ApiClient, session: SessionStore) -> Self {
        Self { api, session }
    }

    pub async fn list(&self) -> Result<Vec<UserSummary>, ServiceError> {
        let token = token(&self.session)?;
        self.api
            .function(&token, "admin-list-users", &json!({}))
            .await
            .map_err(failed(LIST_USERS_FAILED))
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        role: Option<Role>,
        active: Option<bool>,
    ) -> Result<String, ServiceError> {
        let token = token(&self.session)?;
        let mut body = json!({ "userId": user_id });
        if let Some(role) = role {
            body["role"] = json!(role);
        }
        if let Some(active) = active {
            body["active"] = json!(active);
        }
        let response: MessageResponse = self
            .api
            .function(&token, "admin-update-user", &body)
            .await
            .map_err(failed(UPDATE_USER_FAILED))?;
        Ok(response.message)
    }

    /// Returns the recovery link
    pub async fn reset_password(&self, email: &str) -> Result<String, ServiceError> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct RecoveryResponse {
            recovery_link: String,
        }

        let token = token(&self.session)?;
        let response: RecoveryResponse = self
            .api
            .function(&token, "admin-reset-user-password", &json!({ "email": email }))
            .await
            .map_err(failed(RESET_PASSWORD_FAILED))?;
        Ok(response.recovery_link)
    }

    pub async fn force_password_change(&self, user_id: Uuid) -> Result<String, ServiceError> {
        let token = token(&self.session)?;
        let response: MessageResponse = self
            .api
            .function(&token, "admin-force-password-change", &json!({ "userId": user_id }))
            .await
            .map_err(failed(FORCE_PASSWORD_CHANGE_FAILED))?;
        Ok(response.message)
    }
}

/// Client portal data
#[derive(Clone)]
pub struct PortalService {
    api: ApiClient,
    session: SessionStore,
}

impl PortalService {
    pub fn new(api: ApiClient, session: SessionStore) -> Self {
        Self { api, session }
    }

    pub async fn overview(&self) -> Result<PortalOverview, ServiceError> {
        let token = token(&self.session)?;
        self.api
            .portal(&token)
            .await
            .map_err(failed(PORTAL_FAILED))
    }
}
