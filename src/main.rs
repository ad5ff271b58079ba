mod app;
mod auth;
mod config;
mod errors;
mod health;
mod state;
mod store;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "jobboard_auth=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let (app_state, pg) = AppState::init().await?;
    tokio::task::spawn_blocking(auth::password::warm_up).await?;

    if let Some(pg) = &pg {
        if let Err(e) = sqlx::migrate!("./migrations").run(pg.pool()).await {
            tracing::warn!(error = %e, "migration failed; continuing, see GET /test");
        }
    }

    let addr = app_state.config.bind_addr();
    let users = app_state.users.clone();
    let result = app::serve(app::build_app(app_state), &addr).await;

    users.close().await;
    result
}
