use serde::Serialize;
use utoipa::ToSchema;

use super::password::{hash_password, verify_password};

/// An authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Principal {
    #[schema(example = "admin")]
    pub username: String,
    #[schema(example = "admin")]
    pub role: String,
}

/// Decides whether a username/password pair identifies someone.
///
/// Login only sees this trait, so a user table can replace the single static
/// entry without touching the handler.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, username: &str, password: &str) -> Option<Principal>;
}

/// One configured account. The password is kept only as an argon2 hash.
pub struct StaticCredentials {
    username: String,
    password_hash: String,
    role: String,
}

impl StaticCredentials {
    pub fn new(
        username: impl Into<String>,
        password: &str,
        role: impl Into<String>,
    ) -> Result<Self, argon2::password_hash::Error> {
        Ok(Self {
            username: username.into(),
            password_hash: hash_password(password)?,
            role: role.into(),
        })
    }

    pub fn admin(username: impl Into<String>, password: &str) -> Result<Self, argon2::password_hash::Error> {
        Self::new(username, password, "admin")
    }
}

impl CredentialVerifier for StaticCredentials {
    fn verify(&self, username: &str, password: &str) -> Option<Principal> {
        // hash is checked even for an unknown username to keep timing uniform
        let password_ok = verify_password(password, &self.password_hash);
        (username == self.username && password_ok).then(|| Principal {
            username: self.username.clone(),
            role: self.role.clone(),
        })
    }
}
