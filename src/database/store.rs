use async_trait::async_trait;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Client, ClientPatch, ClientSummary, NewClient, Profile, ProfilePatch};

/// Access to the `profiles` table.
///
/// Implementations run with elevated credentials; callers are expected to have
/// authorized the request before touching the store.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find(&self, id: Uuid) -> Result<Option<Profile>, DatabaseError>;

    /// All profiles, newest first
    async fn list(&self) -> Result<Vec<Profile>, DatabaseError>;

    /// Returns the updated profile, or `None` if no row has this id
    async fn update(&self, id: Uuid, patch: &ProfilePatch) -> Result<Option<Profile>, DatabaseError>;
}

/// Access to the `clients` table.
///
/// The `*_owned` operations emulate row-level restriction: they only see rows
/// whose `owner_id` equals the given owner.
#[async_trait]
pub trait ClientStore: Send + Sync {
    /// Every client joined with its linked profile's email ("" when unlinked)
    async fn list_with_email(&self) -> Result<Vec<ClientSummary>, DatabaseError>;

    async fn list_owned(&self, owner: Uuid) -> Result<Vec<Client>, DatabaseError>;

    async fn find_owned(&self, owner: Uuid, id: Uuid) -> Result<Option<Client>, DatabaseError>;

    /// The client record linked to a portal account
    async fn find_linked(&self, user_id: Uuid) -> Result<Option<Client>, DatabaseError>;

    async fn insert(&self, new: &NewClient) -> Result<Client, DatabaseError>;

    /// `None` when the caller owns no such row
    async fn update_owned(
        &self,
        owner: Uuid,
        id: Uuid,
        patch: &ClientPatch,
    ) -> Result<Option<Client>, DatabaseError>;

    /// `true` when a row was removed
    async fn delete_owned(&self, owner: Uuid, id: Uuid) -> Result<bool, DatabaseError>;
}
