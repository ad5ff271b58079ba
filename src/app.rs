use axum::Router;
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::{auth, health};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod http_tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::auth::repo_types::{NewUser, UserRecord};
    use crate::store::{StoreError, StoreInfo, UserFilter, UserStore};

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let req = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(b) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn ada() -> Value {
        json!({
            "name": "Ada",
            "email": "ada@example.com",
            "password": "secret123",
            "role": "job_seeker"
        })
    }

    /// Fails the test if any request reaches the store.
    struct UntouchableStore;

    #[async_trait]
    impl UserStore for UntouchableStore {
        async fn find(&self, _f: &UserFilter, _l: i64) -> Result<Vec<UserRecord>, StoreError> {
            panic!("store must not be queried")
        }
        async fn insert(&self, _u: NewUser) -> Result<UserRecord, StoreError> {
            panic!("store must not be written")
        }
        async fn probe(&self) -> Result<StoreInfo, StoreError> {
            panic!("store must not be probed")
        }
    }

    #[tokio::test]
    async fn root_reports_running() {
        let app = build_app(AppState::fake());
        let (status, body) = call(&app, Method::GET, "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Auth API running");
    }

    #[tokio::test]
    async fn diagnostics_always_ok() {
        let app = build_app(AppState::fake());
        let (status, body) = call(&app, Method::GET, "/test", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["backend"], "running");
        assert_eq!(body["database"]["status"], "connected");
        assert!(body["collections"].as_array().unwrap().len() <= 10);
    }

    #[tokio::test]
    async fn signup_then_login_scenario() {
        let app = build_app(AppState::fake());

        let (status, created) = call(&app, Method::POST, "/auth/signup", Some(ada())).await;
        assert_eq!(status, StatusCode::OK);
        assert!(!created["id"].as_str().unwrap().is_empty());
        assert_eq!(created["name"], "Ada");
        assert_eq!(created["email"], "ada@example.com");
        assert_eq!(created["role"], "job_seeker");
        assert!(created.get("password_hash").is_none());

        let login = json!({ "email": "ada@example.com", "password": "secret123" });
        let (status, logged_in) = call(&app, Method::POST, "/auth/login", Some(login)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(logged_in, created);

        let wrong = json!({ "email": "ada@example.com", "password": "wrong" });
        let (status, body) = call(&app, Method::POST, "/auth/login", Some(wrong)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], "Invalid credentials");
    }

    #[tokio::test]
    async fn unknown_email_looks_like_wrong_password() {
        let app = build_app(AppState::fake());
        call(&app, Method::POST, "/auth/signup", Some(ada())).await;

        let wrong = json!({ "email": "ada@example.com", "password": "nope" });
        let unknown = json!({ "email": "ghost@example.com", "password": "secret123" });
        let a = call(&app, Method::POST, "/auth/login", Some(wrong)).await;
        let b = call(&app, Method::POST, "/auth/login", Some(unknown)).await;
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn duplicate_signup_is_400() {
        let app = build_app(AppState::fake());
        let (first, _) = call(&app, Method::POST, "/auth/signup", Some(ada())).await;
        assert_eq!(first, StatusCode::OK);

        let (status, body) = call(&app, Method::POST, "/auth/signup", Some(ada())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Email already registered");
    }

    #[tokio::test]
    async fn invalid_role_is_rejected_before_the_store() {
        let state = AppState::from_parts(Arc::new(UntouchableStore), AppState::fake().config);
        let app = build_app(state);

        let mut body = ada();
        body["role"] = json!("admin");
        let (status, res) = call(&app, Method::POST, "/auth/signup", Some(body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(res["detail"][0]["field"], "role");
    }

    #[tokio::test]
    async fn malformed_bodies_are_422() {
        let app = build_app(AppState::fake());

        let (status, res) = call(
            &app,
            Method::POST,
            "/auth/signup",
            Some(json!({ "name": "Ada", "email": "not-an-email", "role": "hirer" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let fields: Vec<&str> = res["detail"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, vec!["email", "password"]);

        let (status, res) = call(
            &app,
            Method::POST,
            "/auth/login",
            Some(json!({ "email": 42, "password": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(res["detail"][0]["field"], "body");
    }

    #[tokio::test]
    async fn unconfigured_database_fails_auth_with_503() {
        let state = AppState::from_parts(
            Arc::new(crate::store::UnconfiguredStore),
            AppState::fake().config,
        );
        let app = build_app(state);
        let (status, body) = call(&app, Method::POST, "/auth/signup", Some(ada())).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["detail"], "Storage unavailable");

        let (status, body) = call(&app, Method::GET, "/test", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["database"]["status"], "not_configured");
    }

    #[tokio::test]
    async fn signup_insert_failure_is_503() {
        let state = AppState::from_parts(
            Arc::new(crate::store::WriteUnavailableStore),
            AppState::fake().config,
        );
        let app = build_app(state);
        let (status, body) = call(&app, Method::POST, "/auth/signup", Some(ada())).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["detail"], "Storage unavailable");
    }

    #[tokio::test]
    async fn padded_name_is_returned_unchanged() {
        let app = build_app(AppState::fake());
        let mut body = ada();
        body["name"] = json!(" Ada ");
        let (status, created) = call(&app, Method::POST, "/auth/signup", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["name"], " Ada ");
    }

    #[tokio::test]
    async fn empty_password_login_is_401() {
        let app = build_app(AppState::fake());
        call(&app, Method::POST, "/auth/signup", Some(ada())).await;

        let login = json!({ "email": "ada@example.com", "password": "" });
        let (status, body) = call(&app, Method::POST, "/auth/login", Some(login)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], "Invalid credentials");
    }
}
