use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    Client, ClientFields, ClientPatch, ClientSummary, NewClient, Profile, ProfilePatch,
};
use crate::database::store::{ClientStore, ProfileStore};

/// Process-local profiles and clients, used by the memory backend and tests.
///
/// Rows are kept in insertion order; listings return them newest first.
#[derive(Default)]
pub struct MemoryStore {
    profiles: RwLock<Vec<Profile>>,
    clients: RwLock<Vec<Client>>,
    fail_client_inserts: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provisioning hook: the identity backend calls this when it creates a user
    pub async fn insert_profile(&self, profile: Profile) -> Result<(), DatabaseError> {
        let mut profiles = self.profiles.write().await;
        if profiles.iter().any(|p| p.id == profile.id) {
            return Err(DatabaseError::Constraint(format!(
                "profile {} already exists",
                profile.id
            )));
        }
        profiles.push(profile);
        Ok(())
    }

    /// Cascade from identity deletion
    pub async fn remove_profile(&self, id: Uuid) -> bool {
        let mut profiles = self.profiles.write().await;
        let before = profiles.len();
        profiles.retain(|p| p.id != id);
        profiles.len() != before
    }

    /// Make every following client insert fail with a constraint error
    pub fn set_fail_client_inserts(&self, fail: bool) {
        self.fail_client_inserts.store(fail, Ordering::SeqCst);
    }

    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn find(&self, id: Uuid) -> Result<Option<Profile>, DatabaseError> {
        Ok(self.profiles.read().await.iter().find(|p| p.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<Profile>, DatabaseError> {
        let mut rows: Vec<Profile> = self.profiles.read().await.iter().rev().cloned().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn update(&self, id: Uuid, patch: &ProfilePatch) -> Result<Option<Profile>, DatabaseError> {
        let mut profiles = self.profiles.write().await;
        Ok(profiles.iter_mut().find(|p| p.id == id).map(|profile| {
            patch.apply(profile);
            profile.clone()
        }))
    }
}

#[async_trait]
impl ClientStore for MemoryStore {
    async fn list_with_email(&self) -> Result<Vec<ClientSummary>, DatabaseError> {
        let profiles = self.profiles.read().await;
        let clients = self.clients.read().await;
        Ok(clients
            .iter()
            .rev()
            .map(|c| ClientSummary {
                id: c.id,
                created_at: c.created_at,
                full_name: c.full_name.clone(),
                dpp: c.dpp,
                status: c.status.clone(),
                email: c
                    .user_id
                    .and_then(|uid| profiles.iter().find(|p| p.id == uid))
                    .map(|p| p.email.clone())
                    .unwrap_or_default(),
            })
            .collect())
    }

    async fn list_owned(&self, owner: Uuid) -> Result<Vec<Client>, DatabaseError> {
        let clients = self.clients.read().await;
        Ok(clients
            .iter()
            .rev()
            .filter(|c| c.owner_id == Some(owner))
            .cloned()
            .collect())
    }

    async fn find_owned(&self, owner: Uuid, id: Uuid) -> Result<Option<Client>, DatabaseError> {
        let clients = self.clients.read().await;
        Ok(clients
            .iter()
            .find(|c| c.id == id && c.owner_id == Some(owner))
            .cloned())
    }

    async fn find_linked(&self, user_id: Uuid) -> Result<Option<Client>, DatabaseError> {
        let clients = self.clients.read().await;
        Ok(clients
            .iter()
            .rev()
            .find(|c| c.user_id == Some(user_id))
            .cloned())
    }

    async fn insert(&self, new: &NewClient) -> Result<Client, DatabaseError> {
        if self.fail_client_inserts.load(Ordering::SeqCst) {
            return Err(DatabaseError::Constraint("clients insert rejected".to_string()));
        }
        let full_name = new
            .fields
            .full_name
            .clone()
            .ok_or_else(|| DatabaseError::Constraint("full_name is required".to_string()))?;

        let mut client = Client {
            id: Uuid::new_v4(),
            owner_id: Some(new.owner_id),
            user_id: new.user_id,
            full_name,
            email: None,
            phone: None,
            cpf: None,
            cep: None,
            street: None,
            number: None,
            neighborhood: None,
            city: None,
            state: None,
            companion_name: None,
            companion_phone: None,
            situation: None,
            dpp: None,
            baby_names: None,
            plan: None,
            amount: None,
            payment_method: None,
            payment_type: None,
            notes: None,
            status: new.status().to_string(),
            created_at: Utc::now(),
        };
        new.fields.apply(&mut client);

        self.clients.write().await.push(client.clone());
        Ok(client)
    }

    async fn update_owned(
        &self,
        owner: Uuid,
        id: Uuid,
        patch: &ClientPatch,
    ) -> Result<Option<Client>, DatabaseError> {
        let mut clients = self.clients.write().await;
        Ok(clients
            .iter_mut()
            .find(|c| c.id == id && c.owner_id == Some(owner))
            .map(|client| {
                patch.apply(client);
                client.clone()
            }))
    }

    async fn delete_owned(&self, owner: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
        let mut clients = self.clients.write().await;
        let before = clients.len();
        clients.retain(|c| !(c.id == id && c.owner_id == Some(owner)));
        Ok(clients.len() != before)
    }
}
