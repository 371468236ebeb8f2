use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use shared::{NewProfileRequest, UpdateProfileRequest, User};
use std::sync::Arc;

use super::connection::{MemoryStore, ProfileRow};
use crate::storage::traits::ProfileStore;

/// In-memory profile repository
#[derive(Clone)]
pub struct ProfileRepository {
    store: Arc<MemoryStore>,
}

impl ProfileRepository {
    pub(crate) fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ProfileStore for ProfileRepository {
    async fn get_profile(&self, user_id: &str) -> Result<Option<User>> {
        self.store.ensure_online()?;
        let profiles = self
            .store
            .profiles
            .read()
            .map_err(|_| anyhow!("profile store lock poisoned"))?;
        Ok(profiles.get(user_id).map(|row| row.user.clone()))
    }

    async fn create_profile(&self, request: &NewProfileRequest) -> Result<User> {
        self.store.ensure_online()?;
        let mut profiles = self
            .store
            .profiles
            .write()
            .map_err(|_| anyhow!("profile store lock poisoned"))?;

        // Duplicate creation returns the existing row unchanged
        if let Some(existing) = profiles.get(&request.id) {
            debug!("profile already exists for {}, returning stored row", request.id);
            return Ok(existing.user.clone());
        }

        let now = Utc::now().to_rfc3339();
        let user = User {
            id: request.id.clone(),
            name: request.name.clone(),
            email: request.email.clone(),
            avatar: request.avatar.clone(),
        };
        profiles.insert(
            request.id.clone(),
            ProfileRow {
                user: user.clone(),
                created_at: now.clone(),
                updated_at: now,
            },
        );
        Ok(user)
    }

    async fn update_profile(&self, user_id: &str, request: &UpdateProfileRequest) -> Result<User> {
        self.store.ensure_online()?;
        let mut profiles = self
            .store
            .profiles
            .write()
            .map_err(|_| anyhow!("profile store lock poisoned"))?;

        let row = profiles
            .get_mut(user_id)
            .ok_or_else(|| anyhow!("profile not found: {}", user_id))?;

        if let Some(ref name) = request.name {
            row.user.name = name.clone();
        }
        if let Some(ref avatar) = request.avatar {
            row.user.avatar = Some(avatar.clone());
        }
        row.updated_at = Utc::now().to_rfc3339();

        Ok(row.user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryConnection;
    use crate::storage::traits::Connection;

    fn sample_request() -> NewProfileRequest {
        NewProfileRequest {
            id: "user-1".to_string(),
            email: "amy@example.com".to_string(),
            name: "Amy".to_string(),
            avatar: None,
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let connection = MemoryConnection::new();
        let repo = connection.create_profile_repository();

        let created = repo.create_profile(&sample_request()).await.unwrap();
        assert_eq!(created.name, "Amy");

        let fetched = repo.get_profile("user-1").await.unwrap();
        assert_eq!(fetched, Some(created));
    }

    #[tokio::test]
    async fn duplicate_create_returns_existing_row() {
        let connection = MemoryConnection::new();
        let repo = connection.create_profile_repository();

        repo.create_profile(&sample_request()).await.unwrap();

        let mut second = sample_request();
        second.name = "Somebody Else".to_string();
        let result = repo.create_profile(&second).await.unwrap();
        assert_eq!(result.name, "Amy");
    }

    #[tokio::test]
    async fn update_merges_partial_fields() {
        let connection = MemoryConnection::new();
        let repo = connection.create_profile_repository();
        repo.create_profile(&sample_request()).await.unwrap();

        let update = UpdateProfileRequest {
            name: Some("Amy Lee".to_string()),
            avatar: None,
        };
        let updated = repo.update_profile("user-1", &update).await.unwrap();
        assert_eq!(updated.name, "Amy Lee");
        assert_eq!(updated.email, "amy@example.com");
    }

    #[tokio::test]
    async fn offline_store_fails_without_mutating() {
        let connection = MemoryConnection::new();
        let repo = connection.create_profile_repository();

        connection.set_offline(true);
        assert!(repo.create_profile(&sample_request()).await.is_err());

        connection.set_offline(false);
        assert_eq!(repo.get_profile("user-1").await.unwrap(), None);
    }
}
