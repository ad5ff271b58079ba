use std::sync::Arc;

use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, error, info, warn};

use crate::auth::dto::{PublicUser, Role};
use crate::auth::password::{hash_password, verify_dummy, verify_password};
use crate::auth::repo_types::NewUser;
use crate::errors::AuthError;
use crate::state::AppState;
use crate::store::{StoreError, UserFilter, UserStore};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Trim and lowercase the domain; the local part is kept as given.
pub(crate) fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

fn storage_failure(op: &'static str) -> impl FnOnce(StoreError) -> AuthError {
    move |e| {
        error!(error = %e, op, "credential store call failed");
        AuthError::StorageUnavailable
    }
}

/// Signup and login logic over the shared credential store.
#[derive(Clone)]
pub struct CredentialService {
    store: Arc<dyn UserStore>,
}

impl FromRef<AppState> for CredentialService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.users.clone())
    }
}

impl CredentialService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<PublicUser, AuthError> {
        let existing = self
            .store
            .find(&UserFilter::by_email(email), 1)
            .await
            .map_err(storage_failure("find"))?;
        if !existing.is_empty() {
            warn!(email, "email already registered");
            return Err(AuthError::EmailAlreadyRegistered);
        }

        let plain = password.to_owned();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&plain))
            .await
            .map_err(|e| {
                error!(error = %e, "hashing task failed");
                AuthError::Internal
            })?
            .map_err(|e| {
                error!(error = %e, "hash_password failed");
                AuthError::Internal
            })?;

        let user = match self
            .store
            .insert(NewUser {
                name: name.to_owned(),
                email: email.to_owned(),
                role,
                password_hash,
                avatar_url: None,
                is_active: true,
            })
            .await
        {
            Ok(u) => u,
            Err(StoreError::Conflict) => {
                warn!(email, "email registered concurrently");
                return Err(AuthError::EmailAlreadyRegistered);
            }
            Err(e) => return Err(storage_failure("insert")(e)),
        };

        info!(user_id = %user.id, email = %user.email, role = %user.role, "user registered");
        Ok(user.public())
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> Result<PublicUser, AuthError> {
        let found = self
            .store
            .find(&UserFilter::by_email(email), 1)
            .await
            .map_err(storage_failure("find"))?
            .into_iter()
            .next();

        let plain = password.to_owned();
        let (user, ok) = tokio::task::spawn_blocking(move || match found {
            Some(user) => {
                let ok = verify_password(&plain, &user.password_hash).unwrap_or_else(|e| {
                    error!(error = %e, user_id = %user.id, "stored hash unreadable");
                    false
                });
                (Some(user), ok)
            }
            None => (None, verify_dummy(&plain)),
        })
        .await
        .map_err(|e| {
            error!(error = %e, "verify task failed");
            AuthError::Internal
        })?;

        match user {
            Some(user) if ok => {
                info!(user_id = %user.id, email = %user.email, "user logged in");
                Ok(user.public())
            }
            Some(user) => {
                warn!(email, user_id = %user.id, "login invalid password");
                Err(AuthError::InvalidCredentials)
            }
            None => {
                debug!(email, "login unknown email");
                Err(AuthError::InvalidCredentials)
            }
        }
    }
}
