//! Credential store: persistence of [`UserRecord`]s behind the [`UserStore`] port.

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::dto::Role;
use crate::auth::repo_types::{NewUser, UserRecord};

pub mod memory;
pub mod postgres;
pub mod registry;

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;

/// Equality filter over user fields. Unset fields are not constrained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

impl UserFilter {
    pub fn by_email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Self::default()
        }
    }

    pub fn matches(&self, user: &UserRecord) -> bool {
        self.email.as_ref().map_or(true, |e| *e == user.email)
            && self.name.as_ref().map_or(true, |n| *n == user.name)
            && self.role.map_or(true, |r| r == user.role)
            && self.is_active.map_or(true, |a| a == user.is_active)
    }
}

/// What the store reports about itself for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreInfo {
    pub name: Option<String>,
    pub collections: Vec<String>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store call timed out")]
    Timeout,
    #[error("record conflicts with an existing one")]
    Conflict,
    #[error("store is not configured")]
    NotConfigured,
    #[error("store query failed: {0}")]
    Query(String),
    #[error("stored record is malformed: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// True when the store could not be reached at all, as opposed to
    /// answering with an error.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Timeout)
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Up to `limit` records matching `filter`, in store-native order.
    async fn find(&self, filter: &UserFilter, limit: i64) -> Result<Vec<UserRecord>, StoreError>;

    /// Persist a new user; the store assigns `id` and `created_at`.
    async fn insert(&self, user: NewUser) -> Result<UserRecord, StoreError>;

    async fn probe(&self) -> Result<StoreInfo, StoreError>;

    async fn close(&self) {}
}

/// Stand-in used when the Postgres backend is selected without a `DATABASE_URL`.
#[derive(Debug, Clone, Default)]
pub struct UnconfiguredStore;

#[async_trait]
impl UserStore for UnconfiguredStore {
    async fn find(&self, _filter: &UserFilter, _limit: i64) -> Result<Vec<UserRecord>, StoreError> {
        Err(StoreError::Unavailable("DATABASE_URL is not set".into()))
    }

    async fn insert(&self, _user: NewUser) -> Result<UserRecord, StoreError> {
        Err(StoreError::Unavailable("DATABASE_URL is not set".into()))
    }

    async fn probe(&self) -> Result<StoreInfo, StoreError> {
        Err(StoreError::NotConfigured)
    }
}

/// Answers lookups with nothing and fails every write as unreachable.
#[cfg(test)]
pub(crate) struct WriteUnavailableStore;

#[cfg(test)]
#[async_trait]
impl UserStore for WriteUnavailableStore {
    async fn find(&self, _filter: &UserFilter, _limit: i64) -> Result<Vec<UserRecord>, StoreError> {
        Ok(Vec::new())
    }

    async fn insert(&self, _user: NewUser) -> Result<UserRecord, StoreError> {
        Err(StoreError::Unavailable("connection reset".into()))
    }

    async fn probe(&self) -> Result<StoreInfo, StoreError> {
        Err(StoreError::Unavailable("connection reset".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn record(email: &str, role: Role) -> UserRecord {
        UserRecord {
            id: Uuid::new_v4(),
            name: "Ada".into(),
            email: email.into(),
            role,
            password_hash: "$argon2id$fake".into(),
            avatar_url: None,
            is_active: true,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = UserFilter::default();
        assert!(filter.matches(&record("a@example.com", Role::Hirer)));
        assert!(filter.matches(&record("b@example.com", Role::JobSeeker)));
    }

    #[test]
    fn filter_fields_are_conjunctive() {
        let filter = UserFilter {
            role: Some(Role::Hirer),
            ..UserFilter::by_email("a@example.com")
        };
        assert!(filter.matches(&record("a@example.com", Role::Hirer)));
        assert!(!filter.matches(&record("a@example.com", Role::JobSeeker)));
        assert!(!filter.matches(&record("b@example.com", Role::Hirer)));
    }

    #[tokio::test]
    async fn unconfigured_store_is_unreachable() {
        let store = UnconfiguredStore;
        let err = store
            .find(&UserFilter::by_email("a@example.com"), 1)
            .await
            .unwrap_err();
        assert!(err.is_unreachable());
        assert!(matches!(store.probe().await, Err(StoreError::NotConfigured)));
    }
}
