use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{AppConfig, StoreBackend};
use crate::store::{MemoryUserStore, PgUserStore, UnconfiguredStore, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Build the state from the environment. Returns the Postgres store
    /// separately so `main` can run migrations against its pool.
    pub async fn init() -> anyhow::Result<(Self, Option<PgUserStore>)> {
        let config = Arc::new(AppConfig::from_env()?);

        let (users, pg): (Arc<dyn UserStore>, Option<PgUserStore>) = match config.store {
            StoreBackend::Memory => {
                warn!("using in-memory user store; data is lost on restart");
                (Arc::new(MemoryUserStore::default()), None)
            }
            StoreBackend::Postgres => match config.database.url.as_deref() {
                Some(url) => {
                    let pg = PgUserStore::connect_lazy(
                        url,
                        config.database.max_connections,
                        config.database.timeout,
                    )?;
                    info!(max_connections = config.database.max_connections, "postgres user store ready");
                    (Arc::new(pg.clone()), Some(pg))
                }
                None => {
                    warn!("DATABASE_URL not set; signup and login will report storage unavailable");
                    (Arc::new(UnconfiguredStore), None)
                }
            },
        };

        Ok((Self { users, config }, pg))
    }

    #[cfg(test)]
    pub fn from_parts(users: Arc<dyn UserStore>, config: Arc<AppConfig>) -> Self {
        Self { users, config }
    }

    /// State over a fresh in-memory store.
    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::config::DatabaseConfig;
        use std::time::Duration;

        let config = Arc::new(AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            store: StoreBackend::Memory,
            database: DatabaseConfig {
                url: None,
                name: None,
                max_connections: 1,
                timeout: Duration::from_secs(1),
            },
        });
        Self::from_parts(Arc::new(MemoryUserStore::default()), config)
    }
}
