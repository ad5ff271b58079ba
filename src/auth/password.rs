use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("argon2 hashing failed: {0}")]
    Hash(String),
    #[error("stored password hash is not a valid PHC string: {0}")]
    MalformedHash(String),
}

lazy_static! {
    /// Verified against when the email is unknown, so both login failure
    /// paths pay for one Argon2 run.
    static ref DUMMY_HASH: Option<String> = hash_password("jobboard-auth-dummy").ok();
}

fn hasher() -> Argon2<'static> {
    Argon2::default()
}

/// Build the dummy hash now instead of on the first unknown-email login.
pub fn warm_up() {
    lazy_static::initialize(&DUMMY_HASH);
    debug!(ready = DUMMY_HASH.is_some(), "dummy password hash prepared");
}

/// Argon2id with a fresh random salt, as a PHC string.
pub fn hash_password(plain: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    hasher()
        .hash_password(plain.as_bytes(), &salt)
        .map(|phc| phc.to_string())
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            PasswordError::Hash(e.to_string())
        })
}

/// `Ok(false)` on mismatch; `Err` only when `stored` cannot be parsed.
pub fn verify_password(plain: &str, stored: &str) -> Result<bool, PasswordError> {
    let phc = PasswordHash::new(stored).map_err(|e| PasswordError::MalformedHash(e.to_string()))?;
    Ok(hasher().verify_password(plain.as_bytes(), &phc).is_ok())
}

/// Burn the same work as a real verification. Always false.
pub fn verify_dummy(plain: &str) -> bool {
    if let Some(stored) = DUMMY_HASH.as_deref() {
        let _ = verify_password(plain, stored);
    }
    false
}
