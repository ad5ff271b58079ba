use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::extractors::FieldError;

/// Failures surfaced by the auth endpoints.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("request validation failed")]
    ValidationFailed(Vec<FieldError>),
    #[error("Email already registered")]
    EmailAlreadyRegistered,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Storage unavailable")]
    StorageUnavailable,
    #[error("Internal server error")]
    Internal,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AuthError::EmailAlreadyRegistered => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AuthError::ValidationFailed(errors) => json!({ "detail": errors }),
            other => json!({ "detail": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(res: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn invalid_credentials_maps_to_401_with_fixed_message() {
        let res = AuthError::InvalidCredentials.into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(res).await["detail"], "Invalid credentials");
    }

    #[tokio::test]
    async fn duplicate_email_maps_to_400() {
        let res = AuthError::EmailAlreadyRegistered.into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(res).await["detail"], "Email already registered");
    }

    #[tokio::test]
    async fn validation_failure_lists_fields() {
        let res = AuthError::ValidationFailed(vec![FieldError::new("role", "bad role")]).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(res).await;
        assert_eq!(body["detail"][0]["field"], "role");
        assert_eq!(body["detail"][0]["message"], "bad role");
    }

    #[test]
    fn storage_failure_is_a_server_error() {
        assert!(AuthError::StorageUnavailable.status().is_server_error());
        assert!(AuthError::Internal.status().is_server_error());
    }
}
