use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::dto::{PublicUser, Role};
use crate::store::StoreError;

/// User record as held by the credential store.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserRecord {
    pub id: Uuid,                   // assigned by the store
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing)]
    pub password_hash: String,      // Argon2 PHC string, never exposed in JSON
    pub avatar_url: Option<String>,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
}

impl UserRecord {
    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Fields supplied by the caller on insert.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub password_hash: String,
    pub avatar_url: Option<String>,
    pub is_active: bool,
}

/// Raw `auth_users` row; `role` is stored as text.
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub password_hash: String,
    pub avatar_url: Option<String>,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = StoreError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let role = r
            .role
            .parse::<Role>()
            .map_err(|_| StoreError::Corrupt(format!("user {} has role {:?}", r.id, r.role)))?;
        Ok(Self {
            id: r.id,
            name: r.name,
            email: r.email,
            role,
            password_hash: r.password_hash,
            avatar_url: r.avatar_url,
            is_active: r.is_active,
            created_at: r.created_at,
        })
    }
}
