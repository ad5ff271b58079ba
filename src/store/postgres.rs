use std::{future::Future, time::Duration};

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder};
use tracing::{debug, info};

use super::registry::{is_plain_identifier, Entity};
use super::{StoreError, StoreInfo, UserFilter, UserStore};
use crate::auth::repo_types::{NewUser, UserRecord, UserRow};

const COLUMNS: &str = "id, name, email, role, password_hash, avatar_url, is_active, created_at";
const UNIQUE_VIOLATION: &str = "23505";
const MAX_LISTED_TABLES: i64 = 10;

/// Postgres-backed credential store.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
    table: &'static str,
    timeout: Duration,
}

impl PgUserStore {
    pub fn new(pool: PgPool, timeout: Duration) -> anyhow::Result<Self> {
        let table = Entity::AuthUser.location();
        anyhow::ensure!(is_plain_identifier(table), "invalid table name {table:?}");
        debug!(entity = %Entity::AuthUser, table, "user store location");
        Ok(Self { pool, table, timeout })
    }

    /// Pool is created without connecting; the first query opens it.
    pub fn connect_lazy(url: &str, max_connections: u32, timeout: Duration) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(timeout)
            .connect_lazy(url)
            .context("parse DATABASE_URL")?;
        Self::new(pool, timeout)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(res) => res.map_err(classify),
            Err(_) => Err(StoreError::Timeout),
        }
    }
}

fn classify(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            StoreError::Conflict
        }
        sqlx::Error::PoolTimedOut => StoreError::Timeout,
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Configuration(_) => StoreError::Unavailable(e.to_string()),
        _ => StoreError::Query(e.to_string()),
    }
}

fn find_query<'a>(table: &str, filter: &UserFilter, limit: i64) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM {table}"));
    let mut sep = " WHERE ";
    if let Some(email) = &filter.email {
        qb.push(sep).push("email = ").push_bind(email.clone());
        sep = " AND ";
    }
    if let Some(name) = &filter.name {
        qb.push(sep).push("name = ").push_bind(name.clone());
        sep = " AND ";
    }
    if let Some(role) = filter.role {
        qb.push(sep).push("role = ").push_bind(role.as_str());
        sep = " AND ";
    }
    if let Some(active) = filter.is_active {
        qb.push(sep).push("is_active = ").push_bind(active);
    }
    qb.push(" LIMIT ").push_bind(limit.max(0));
    qb
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find(&self, filter: &UserFilter, limit: i64) -> Result<Vec<UserRecord>, StoreError> {
        let mut qb = find_query(self.table, filter, limit);
        let rows = self
            .bounded(qb.build_query_as::<UserRow>().fetch_all(&self.pool))
            .await?;
        debug!(matched = rows.len(), "find users");
        rows.into_iter().map(UserRecord::try_from).collect()
    }

    async fn insert(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO {} (name, email, role, password_hash, avatar_url, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {COLUMNS}
            "#,
            self.table
        );
        let row = self
            .bounded(
                sqlx::query_as::<_, UserRow>(&sql)
                    .bind(&user.name)
                    .bind(&user.email)
                    .bind(user.role.as_str())
                    .bind(&user.password_hash)
                    .bind(&user.avatar_url)
                    .bind(user.is_active)
                    .fetch_one(&self.pool),
            )
            .await?;
        UserRecord::try_from(row)
    }

    async fn probe(&self) -> Result<StoreInfo, StoreError> {
        let name: String = self
            .bounded(sqlx::query_scalar::<_, String>("SELECT current_database()::text").fetch_one(&self.pool))
            .await?;
        let collections: Vec<String> = self
            .bounded(
                sqlx::query_scalar::<_, String>(
                    r#"
                    SELECT table_name::text
                    FROM information_schema.tables
                    WHERE table_schema = current_schema()
                    ORDER BY table_name
                    LIMIT $1
                    "#,
                )
                .bind(MAX_LISTED_TABLES)
                .fetch_all(&self.pool),
            )
            .await?;
        Ok(StoreInfo {
            name: Some(name),
            collections,
        })
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("database pool closed");
    }
}
