use axum::{extract::State, routing::post, Json, Router};
use tracing::instrument;

use crate::{
    auth::{
        dto::{LoginBody, PublicUser, SignupBody},
        extractors::ValidatedJson,
        services::CredentialService,
    },
    errors::AuthError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
}

#[instrument(skip(service, payload))]
pub async fn signup(
    State(service): State<CredentialService>,
    ValidatedJson(payload): ValidatedJson<SignupBody>,
) -> Result<Json<PublicUser>, AuthError> {
    let user = service
        .register(&payload.name, &payload.email, &payload.password, payload.role)
        .await?;
    Ok(Json(user))
}

#[instrument(skip(service, payload))]
pub async fn login(
    State(service): State<CredentialService>,
    ValidatedJson(payload): ValidatedJson<LoginBody>,
) -> Result<Json<PublicUser>, AuthError> {
    let user = service.authenticate(&payload.email, &payload.password).await?;
    Ok(Json(user))
}
