use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::{
    Router,
    routing::{delete, post, put},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use log::warn;
use rand_core::OsRng;
use serde::{Deserialize, Serialize};

use crate::{integration, state::AppState, user};

mod handler;
pub mod middleware;
pub mod service;

type Result<T> = std::result::Result<T, Error>;
pub type Service = Arc<dyn service::AuthService + Send + Sync>;

const DEFAULT_TTL: Duration = Duration::from_secs(4 * 60 * 60);
const MIN_PASSWORD_LEN: usize = 6;

/// Routes reachable without a token.
pub fn public<S>(s: AppState) -> Router<S> {
    Router::new()
        .route("/register", post(handler::api::register))
        .route("/login", post(handler::api::login))
        .with_state(s)
}

pub fn protected<S>(s: AppState) -> Router<S> {
    Router::new()
        .route("/logout", post(handler::api::logout))
        .route("/settings/password", put(handler::api::change_password))
        .route("/settings/account", delete(handler::api::delete_account))
        .with_state(s)
}

#[derive(Clone)]
pub struct Config {
    secret: String,
    ttl: Duration,
}

impl Config {
    pub fn new(secret: impl Into<String>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    pub fn env() -> integration::Result<Self> {
        let secret = env::var("JWT_SECRET")?;
        let ttl = match env::var("TOKEN_TTL") {
            Ok(ttl) => Duration::from_secs(ttl.parse::<u64>()?),
            Err(_) => DEFAULT_TTL,
        };

        Ok(Self::new(secret, ttl))
    }

    pub fn issue(&self, sub: user::Id, username: &str) -> Result<String> {
        let exp = chrono::Utc::now().timestamp() + self.ttl.as_secs() as i64;
        let claims = Claims {
            sub,
            username: username.to_owned(),
            exp,
        };

        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;

        Ok(token)
    }

    /// Checks signature and expiry, yielding the claims.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| {
            warn!("Rejected token: {e}");
            Error::Unauthorized
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        warn!("JWT_SECRET is not set, tokens will not survive a restart");
        Self::new(uuid::Uuid::new_v4().to_string(), DEFAULT_TTL)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("secret", &"***")
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Claims {
    pub sub: user::Id,
    pub username: String,
    pub exp: i64,
}

/// At least six characters with an uppercase letter, a lowercase letter
/// and a digit; no whitespace.
pub fn check_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::WeakPassword(
            "Password must be at least 6 characters long",
        ));
    }
    if password.chars().any(char::is_whitespace) {
        return Err(Error::WeakPassword("Password must not contain spaces"));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase())
        || !password.chars().any(|c| c.is_ascii_lowercase())
        || !password.chars().any(|c| c.is_ascii_digit())
    {
        return Err(Error::WeakPassword(
            "Password must contain an uppercase letter, a lowercase letter and a number",
        ));
    }

    Ok(())
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| Error::Hashing(e.to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| Error::Hashing(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("unauthorized to access the resource")]
    Unauthorized,
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Current password is incorrect")]
    WrongPassword,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("{0}")]
    WeakPassword(&'static str),
    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    _User(#[from] user::Error),
    #[error(transparent)]
    _Jwt(#[from] jsonwebtoken::errors::Error),
}
