//! In-process user store for development runs and tests.

use anyhow::anyhow;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use super::{NewUser, PublicProfile, StoreError, UserRecord, UserStore, UserUpdate};

/// Mutex-guarded map with the same duplicate-email semantics as the unique
/// index in Postgres: the uniqueness check and the write happen under one
/// lock, so concurrent creates for the same email resolve to exactly one
/// winner.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<Uuid, UserRecord>>,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, UserRecord>>, StoreError> {
        self.users
            .lock()
            .map_err(|_| StoreError::Backend(anyhow!("user store lock poisoned")))
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let mut users = self.lock()?;
        if users.values().any(|existing| existing.email == user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        let record = UserRecord {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            avatar: None,
        };
        users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let users = self.lock()?;
        Ok(users.values().find(|user| user.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        let users = self.lock()?;
        Ok(users.get(&id).cloned())
    }

    async fn update(&self, id: Uuid, update: UserUpdate) -> Result<UserRecord, StoreError> {
        let mut users = self.lock()?;
        if let Some(email) = &update.email {
            if users
                .values()
                .any(|other| other.id != id && &other.email == email)
            {
                return Err(StoreError::DuplicateEmail);
            }
        }
        let record = users.get_mut(&id).ok_or(StoreError::NotFound)?;
        if let Some(name) = update.name {
            record.name = name;
        }
        if let Some(email) = update.email {
            record.email = email;
        }
        if let Some(password_hash) = update.password_hash {
            record.password_hash = password_hash;
        }
        if let Some(avatar) = update.avatar {
            record.avatar = Some(avatar);
        }
        Ok(record.clone())
    }

    async fn list_all(&self) -> Result<Vec<PublicProfile>, StoreError> {
        let users = self.lock()?;
        let mut profiles: Vec<PublicProfile> =
            users.values().cloned().map(PublicProfile::from).collect();
        profiles.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(profiles)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str, email: &str) -> NewUser {
        NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: format!("$argon2id$fake-hash-for-{name}"),
        }
    }

    #[tokio::test]
    async fn create_rejects_duplicate_email() {
        let store = MemoryUserStore::new();
        store.create(new_user("Ada", "ada@x.com")).await.unwrap();

        let result = store.create(new_user("Bob", "ada@x.com")).await;
        assert!(matches!(result, Err(StoreError::DuplicateEmail)));
    }

    #[tokio::test]
    async fn find_by_email_and_id_round_trip() {
        let store = MemoryUserStore::new();
        let created = store.create(new_user("Ada", "ada@x.com")).await.unwrap();

        let by_email = store.find_by_email("ada@x.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);

        let by_id = store.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "ada@x.com");

        assert!(store.find_by_email("nobody@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_applies_only_provided_fields() {
        let store = MemoryUserStore::new();
        let created = store.create(new_user("Ada", "ada@x.com")).await.unwrap();

        let updated = store
            .update(
                created.id,
                UserUpdate {
                    avatar: Some("ada123.png".to_string()),
                    ..UserUpdate::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Ada");
        assert_eq!(updated.email, "ada@x.com");
        assert_eq!(updated.password_hash, created.password_hash);
        assert_eq!(updated.avatar.as_deref(), Some("ada123.png"));
    }

    #[tokio::test]
    async fn update_rejects_email_taken_by_other_record() {
        let store = MemoryUserStore::new();
        store.create(new_user("Ada", "ada@x.com")).await.unwrap();
        let bob = store.create(new_user("Bob", "bob@x.com")).await.unwrap();

        let result = store
            .update(
                bob.id,
                UserUpdate {
                    email: Some("ada@x.com".to_string()),
                    ..UserUpdate::default()
                },
            )
            .await;
        assert!(matches!(result, Err(StoreError::DuplicateEmail)));

        // Keeping your own email is not a conflict.
        let kept = store
            .update(
                bob.id,
                UserUpdate {
                    email: Some("bob@x.com".to_string()),
                    ..UserUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(kept.email, "bob@x.com");
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let store = MemoryUserStore::new();
        let result = store.update(Uuid::new_v4(), UserUpdate::default()).await;
        assert!(matches!(result, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn list_all_returns_profiles_without_hashes() {
        let store = MemoryUserStore::new();
        store.create(new_user("Bob", "bob@x.com")).await.unwrap();
        store.create(new_user("Ada", "ada@x.com")).await.unwrap();

        let profiles = store.list_all().await.unwrap();
        assert_eq!(profiles.len(), 2);
        // PublicProfile has no password field at all; assert the ordering too.
        assert_eq!(profiles[0].name, "Ada");
        assert_eq!(profiles[1].name, "Bob");
    }
}
