use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::registry::Entity;
use super::{StoreError, StoreInfo, UserFilter, UserStore};
use crate::auth::repo_types::{NewUser, UserRecord};

/// In-process store. Records are kept in insertion order; email uniqueness
/// is checked under the same lock as the insert.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<UserRecord>>,
}

impl MemoryUserStore {
    fn users(&self) -> MutexGuard<'_, Vec<UserRecord>> {
        self.users.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.users().len()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find(&self, filter: &UserFilter, limit: i64) -> Result<Vec<UserRecord>, StoreError> {
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(self
            .users()
            .iter()
            .filter(|u| filter.matches(u))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn insert(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let mut users = self.users();
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict);
        }
        let mut id = Uuid::new_v4();
        while users.iter().any(|u| u.id == id) {
            id = Uuid::new_v4();
        }
        let record = UserRecord {
            id,
            name: user.name,
            email: user.email,
            role: user.role,
            password_hash: user.password_hash,
            avatar_url: user.avatar_url,
            is_active: user.is_active,
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(record.clone());
        Ok(record)
    }

    async fn probe(&self) -> Result<StoreInfo, StoreError> {
        Ok(StoreInfo {
            name: Some("memory".into()),
            collections: Entity::ALL.iter().map(|e| e.location().to_string()).collect(),
        })
    }
}
