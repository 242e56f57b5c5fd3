use crate::error::{CommerceError, Result};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MIN_PASSWORD_LEN: usize = 8;

/// A registered customer account. The password is only ever held as an
/// Argon2id PHC string.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Member {
    id: String,
    email: String,
    name: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Member {
    pub fn new(email: impl Into<String>, name: impl Into<String>, password: &str) -> Result<Self> {
        let email = email.into();
        let name = name.into();
        if email.trim().is_empty() || !email.contains('@') {
            return Err(CommerceError::InvalidEmail);
        }
        if name.trim().is_empty() {
            return Err(CommerceError::InvalidName);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(CommerceError::InvalidPassword);
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            email,
            name,
            password_hash: hash_password(password)?,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn rename(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CommerceError::InvalidName);
        }
        self.name = name;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn verify_password(&self, password: &str) -> bool {
        PasswordHash::new(&self.password_hash)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| CommerceError::PasswordHash)
}
