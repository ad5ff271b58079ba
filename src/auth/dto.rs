use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::extractors::{FieldError, Validate};
use crate::auth::services::{is_valid_email, normalize_email};

/// Account type chosen at signup.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    JobSeeker,
    Hirer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::JobSeeker => "job_seeker",
            Role::Hirer => "hirer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "job_seeker" => Ok(Role::JobSeeker),
            "hirer" => Ok(Role::Hirer),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Signup body as received; checked by [`Validate`] before use.
#[derive(Debug, Deserialize)]
pub struct SignupBody {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// Login body as received.
#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

fn required(field: &'static str, value: Option<String>, errors: &mut Vec<FieldError>) -> Option<String> {
    match value {
        Some(v) => Some(v),
        None => {
            errors.push(FieldError::new(field, "field required"));
            None
        }
    }
}

fn checked_email(value: Option<String>, errors: &mut Vec<FieldError>) -> Option<String> {
    let email = normalize_email(&required("email", value, errors)?);
    if is_valid_email(&email) {
        Some(email)
    } else {
        errors.push(FieldError::new("email", "value is not a valid email address"));
        None
    }
}

impl Validate for SignupBody {
    type Output = SignupRequest;

    fn validate(self) -> Result<SignupRequest, Vec<FieldError>> {
        let mut errors = Vec::new();

        let name = required("name", self.name, &mut errors).and_then(|n| {
            if n.trim().is_empty() {
                errors.push(FieldError::new("name", "name must not be empty"));
                None
            } else {
                Some(n)
            }
        });
        let email = checked_email(self.email, &mut errors);
        let password = required("password", self.password, &mut errors);
        let role = required("role", self.role, &mut errors).and_then(|r| match r.parse::<Role>() {
            Ok(role) => Some(role),
            Err(UnknownRole(value)) => {
                errors.push(FieldError::new(
                    "role",
                    format!("unexpected value {value:?}; permitted: 'job_seeker', 'hirer'"),
                ));
                None
            }
        });

        match (name, email, password, role) {
            (Some(name), Some(email), Some(password), Some(role)) if errors.is_empty() => {
                Ok(SignupRequest { name, email, password, role })
            }
            _ => Err(errors),
        }
    }
}

impl Validate for LoginBody {
    type Output = LoginRequest;

    fn validate(self) -> Result<LoginRequest, Vec<FieldError>> {
        let mut errors = Vec::new();
        let email = checked_email(self.email, &mut errors);
        let password = required("password", self.password, &mut errors);
        match (email, password) {
            (Some(email), Some(password)) if errors.is_empty() => Ok(LoginRequest { email, password }),
            _ => Err(errors),
        }
    }
}
