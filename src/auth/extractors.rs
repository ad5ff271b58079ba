use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::errors::AuthError;

/// One failing request field.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Shape check turning a raw request body into a typed request.
pub trait Validate {
    type Output;

    fn validate(self) -> Result<Self::Output, Vec<FieldError>>;
}

/// JSON body that has been deserialized as `B` and passed [`Validate`].
/// Any failure is rejected with 422 before the handler runs.
pub struct ValidatedJson<B: Validate>(pub B::Output);

#[async_trait]
impl<S, B> FromRequest<S> for ValidatedJson<B>
where
    S: Send + Sync,
    B: Validate + DeserializeOwned + Send,
{
    type Rejection = AuthError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<B>::from_request(req, state).await.map_err(|rejection| {
            debug!(error = %rejection.body_text(), "unreadable json body");
            AuthError::ValidationFailed(vec![FieldError::new("body", rejection.body_text())])
        })?;

        body.validate().map(ValidatedJson).map_err(|errors| {
            debug!(fields = ?errors.iter().map(|e| &e.field).collect::<Vec<_>>(), "request validation failed");
            AuthError::ValidationFailed(errors)
        })
    }
}
