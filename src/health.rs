//! Liveness message and the database diagnostic behind `GET /test`.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{instrument, warn};

use crate::state::AppState;
use crate::store::StoreError;

const MAX_COLLECTIONS: usize = 10;
const MAX_DETAIL_CHARS: usize = 120;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Connected,
    Degraded,
    Unavailable,
    NotConfigured,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Connected,
    NotConnected,
}

#[derive(Debug, Serialize)]
pub struct DatabaseHealth {
    pub status: HealthStatus,
    pub detail: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Diagnostics {
    pub backend: &'static str,
    pub database: DatabaseHealth,
    pub database_url_set: bool,
    pub database_name_set: bool,
    pub database_name: Option<String>,
    pub connection_status: ConnectionStatus,
    pub collections: Vec<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/test", get(diagnostics))
}

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Auth API running" }))
}

fn short(e: &StoreError) -> String {
    e.to_string().chars().take(MAX_DETAIL_CHARS).collect()
}

/// Never fails; store errors are reported in the body.
#[instrument(skip(state))]
pub async fn diagnostics(State(state): State<AppState>) -> Json<Diagnostics> {
    let db_cfg = &state.config.database;
    let mut report = Diagnostics {
        backend: "running",
        database: DatabaseHealth {
            status: HealthStatus::NotConfigured,
            detail: None,
        },
        database_url_set: db_cfg.url.is_some(),
        database_name_set: db_cfg.name.is_some(),
        database_name: db_cfg.name.clone(),
        connection_status: ConnectionStatus::NotConnected,
        collections: Vec::new(),
    };

    match state.users.probe().await {
        Ok(info) => {
            report.database.status = HealthStatus::Connected;
            report.connection_status = ConnectionStatus::Connected;
            report.database_name = report.database_name.or(info.name);
            report.collections = info.collections.into_iter().take(MAX_COLLECTIONS).collect();
        }
        Err(StoreError::NotConfigured) => {}
        Err(e) if e.is_unreachable() => {
            warn!(error = %e, "diagnostic probe could not reach store");
            report.database.status = HealthStatus::Unavailable;
            report.database.detail = Some(short(&e));
        }
        Err(e) => {
            warn!(error = %e, "diagnostic probe failed");
            report.database.status = HealthStatus::Degraded;
            report.connection_status = ConnectionStatus::Connected;
            report.database.detail = Some(short(&e));
        }
    }

    Json(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::UnconfiguredStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn memory_store_reports_connected() {
        let Json(report) = diagnostics(State(AppState::fake())).await;
        assert_eq!(report.database.status, HealthStatus::Connected);
        assert_eq!(report.connection_status, ConnectionStatus::Connected);
        assert_eq!(report.database_name.as_deref(), Some("memory"));
        assert_eq!(report.collections, vec!["auth_users".to_string()]);
        assert!(!report.database_url_set);
    }

    #[tokio::test]
    async fn unconfigured_store_reports_not_configured() {
        let fake = AppState::fake();
        let state = AppState::from_parts(Arc::new(UnconfiguredStore), fake.config);
        let Json(report) = diagnostics(State(state)).await;
        assert_eq!(report.database.status, HealthStatus::NotConfigured);
        assert_eq!(report.connection_status, ConnectionStatus::NotConnected);
        assert!(report.collections.is_empty());
        assert!(report.database.detail.is_none());
    }

    #[test]
    fn detail_is_truncated() {
        let e = StoreError::Query("x".repeat(500));
        assert_eq!(short(&e).chars().count(), MAX_DETAIL_CHARS);
    }

    #[test]
    fn statuses_serialize_snake_case() {
        assert_eq!(serde_json::to_value(HealthStatus::NotConfigured).unwrap(), "not_configured");
        assert_eq!(serde_json::to_value(ConnectionStatus::NotConnected).unwrap(), "not_connected");
    }
}
