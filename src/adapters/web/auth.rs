//! Authentication backend for axum-login.
//!
//! Accounts live behind [`UserPort`]; passwords are argon2 PHC strings.

use std::sync::Arc;

use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use axum_login::{AuthUser, AuthnBackend, UserId};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use crate::domain::error::JournalError;
use crate::domain::user::User;
use crate::ports::user_port::UserPort;

use super::run_blocking;

/// The identity carried by a logged-in session.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub id: String,
    pub username: String,
    /// The password hash string as bytes, used by axum-login to validate sessions.
    pw_hash_bytes: Vec<u8>,
}

impl From<User> for SessionUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            pw_hash_bytes: user.password_hash.into_bytes(),
        }
    }
}

impl AuthUser for SessionUser {
    type Id = String;

    fn id(&self) -> String {
        self.id.clone()
    }

    fn session_auth_hash(&self) -> &[u8] {
        &self.pw_hash_bytes
    }
}

/// Login credentials submitted to `POST /login`.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Public view of the current user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserView {
    pub id: String,
    pub username: String,
}

impl From<&SessionUser> for UserView {
    fn from(user: &SessionUser) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
        }
    }
}

#[derive(Clone)]
pub struct Backend {
    users: Arc<dyn UserPort + Send + Sync>,
}

impl Backend {
    pub fn new(users: Arc<dyn UserPort + Send + Sync>) -> Self {
        Self { users }
    }
}

impl AuthnBackend for Backend {
    type User = SessionUser;
    type Credentials = Credentials;
    type Error = JournalError;

    async fn authenticate(
        &self,
        creds: Self::Credentials,
    ) -> Result<Option<Self::User>, Self::Error> {
        let users = Arc::clone(&self.users);
        run_blocking(move || {
            let Some(user) = users.find_by_username(&creds.username)? else {
                return Ok(None);
            };

            if verify_password(&creds.password, &user.password_hash) {
                Ok(Some(SessionUser::from(user)))
            } else {
                Ok(None)
            }
        })
        .await
    }

    async fn get_user(
        &self,
        user_id: &UserId<Self>,
    ) -> Result<Option<Self::User>, Self::Error> {
        let users = Arc::clone(&self.users);
        let user_id = user_id.clone();
        run_blocking(move || Ok(users.find_by_id(&user_id)?.map(SessionUser::from))).await
    }
}

pub fn hash_password(password: &str) -> Result<String, JournalError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default());
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| JournalError::PasswordHash {
            reason: e.to_string(),
        })
}

/// A malformed stored hash never verifies.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}
