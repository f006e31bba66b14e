//! Admin credential verification.
//!
//! Exactly one `CredentialVerifier` backs the login endpoint, chosen by
//! `ADMIN_AUTH` at startup. Both implementations compare passwords through
//! Argon2id PHC hashes.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use async_trait::async_trait;
use std::sync::{Arc, LazyLock};

use crate::{
    auth::{AuthError, Identity},
    config::{AppConfig, AuthMode},
    error::ApiError,
    models::Admin,
    repository::{Collection, StoreState},
};

pub const ADMIN_ROLE: &str = "admin";

/// Hash checked against when the email is unknown, so a miss costs the same
/// Argon2 pass as a wrong password.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("raynk-labs-unknown-admin").ok());

/// Hash a plaintext password using Argon2id with a random salt (PHC string).
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Verify a plaintext password against a stored PHC hash.
///
/// A malformed stored hash is an error, not a mismatch.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|e| AuthError::Hashing(e.to_string()))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Hashing(e.to_string())),
    }
}

/// CredentialVerifier
///
/// Resolves an email/password pair to the identity a session is issued for.
/// `Ok(None)` means unknown email or wrong password; the caller answers both
/// with the same 401.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, email: &str, password: &str) -> Result<Option<Identity>, ApiError>;
}

pub type CredentialsState = Arc<dyn CredentialVerifier>;

/// DatabaseCredentials
///
/// Looks admins up in the `admins` collection by email.
pub struct DatabaseCredentials {
    admins: Collection<Admin>,
}

impl DatabaseCredentials {
    pub fn new(store: StoreState) -> Self {
        Self {
            admins: Collection::new(store),
        }
    }
}

#[async_trait]
impl CredentialVerifier for DatabaseCredentials {
    async fn verify(&self, email: &str, password: &str) -> Result<Option<Identity>, ApiError> {
        let email = email.trim().to_lowercase();
        let Some(admin) = self.admins.find_one("email", &email).await? else {
            if let Some(hash) = DUMMY_HASH.as_deref() {
                verify_password(password, hash)?;
            }
            return Ok(None);
        };
        if !verify_password(password, &admin.data.password_hash)? {
            return Ok(None);
        }
        Ok(Some(Identity {
            admin_id: Some(admin.id),
            email: admin.data.email,
            role: admin.data.role,
        }))
    }
}

/// StaticCredentials
///
/// A single admin configured through the environment. The password is hashed
/// once at construction and never kept in plain text.
pub struct StaticCredentials {
    email: String,
    password_hash: String,
}

impl StaticCredentials {
    pub fn new(email: &str, password: &str) -> Result<Self, AuthError> {
        Ok(Self {
            email: email.trim().to_string(),
            password_hash: hash_password(password)?,
        })
    }
}

#[async_trait]
impl CredentialVerifier for StaticCredentials {
    async fn verify(&self, email: &str, password: &str) -> Result<Option<Identity>, ApiError> {
        // Hash check first, regardless of the email.
        let password_ok = verify_password(password, &self.password_hash)?;
        if !password_ok || !email.trim().eq_ignore_ascii_case(&self.email) {
            return Ok(None);
        }
        Ok(Some(Identity {
            admin_id: None,
            email: self.email.clone(),
            role: ADMIN_ROLE.to_string(),
        }))
    }
}

/// build_verifier
///
/// Constructs the verifier selected by `config.auth_mode`.
pub fn build_verifier(config: &AppConfig, store: StoreState) -> Result<CredentialsState, AuthError> {
    match config.auth_mode {
        AuthMode::Database => Ok(Arc::new(DatabaseCredentials::new(store))),
        AuthMode::Static => {
            let email = config.admin_email.as_deref().unwrap_or_default();
            let password = config.admin_password.as_deref().unwrap_or_default();
            Ok(Arc::new(StaticCredentials::new(email, password)?))
        }
    }
}

/// seed_admin
///
/// Creates the configured admin in database mode when no admin with that
/// email exists yet. Returns whether a record was created.
pub async fn seed_admin(config: &AppConfig, store: StoreState) -> Result<bool, ApiError> {
    if config.auth_mode != AuthMode::Database {
        return Ok(false);
    }
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        return Ok(false);
    };

    let admins: Collection<Admin> = Collection::new(store);
    let email = email.trim().to_lowercase();
    if admins.find_one("email", &email).await?.is_some() {
        return Ok(false);
    }

    let admin = Admin {
        email,
        password_hash: hash_password(password)?,
        role: ADMIN_ROLE.to_string(),
    };
    admins.insert(admin, true).await?;
    Ok(true)
}
