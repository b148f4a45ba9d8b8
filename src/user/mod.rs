use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::{chat, state::AppState};

use repository::UserRepository;
use service::UserService;

mod handler;
pub mod model;
pub mod repository;
pub mod service;

type Result<T> = std::result::Result<T, Error>;
pub type Repository = Arc<dyn UserRepository + Send + Sync>;
pub type Service = Arc<dyn UserService + Send + Sync>;

integer_id!(Id);

const MAX_USERNAME_LEN: usize = 50;
const MAX_BIO_LEN: usize = 100;

pub fn api<S>(s: AppState) -> Router<S> {
    Router::new()
        .route("/users", get(handler::api::find_all))
        .route("/users/me", get(handler::api::find_me))
        .route("/users/{id}/profile", get(handler::api::profile))
        .route("/settings", get(handler::api::settings))
        .route("/settings/bio", put(handler::api::update_bio))
        .route("/settings/username", put(handler::api::update_username))
        .route(
            "/settings/avatar",
            post(handler::api::upload_avatar).delete(handler::api::delete_avatar),
        )
        .with_state(s)
}

/// Login handle: non-empty, no whitespace, at most 50 characters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Username(String);

impl Username {
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty()
            || s.chars().any(char::is_whitespace)
            || s.chars().count() > MAX_USERNAME_LEN
        {
            return Err(Error::InvalidUsername);
        }

        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bio(String);

impl Bio {
    pub fn parse(s: &str) -> Result<Self> {
        let len = s.chars().count();
        if len == 0 || len > MAX_BIO_LEN {
            return Err(Error::InvalidBio);
        }

        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("user not found: {0}")]
    NotFound(Id),
    #[error("Username already exists")]
    UsernameTaken,
    #[error("username must be 1 to 50 characters without spaces")]
    InvalidUsername,
    #[error("bio must be between 1 and 100 characters")]
    InvalidBio,

    #[error(transparent)]
    _Chat(Box<chat::Error>),
    #[error(transparent)]
    _R2d2(#[from] r2d2::Error),
    #[error(transparent)]
    _Diesel(#[from] diesel::result::Error),
}

impl From<chat::Error> for Error {
    fn from(e: chat::Error) -> Self {
        Self::_Chat(Box::new(e))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn should_parse_username() {
        assert_eq!(Username::parse("valera").unwrap().as_str(), "valera");
        assert!(Username::parse(&"a".repeat(MAX_USERNAME_LEN)).is_ok());
    }

    #[test]
    fn should_reject_username_with_whitespace() {
        for s in ["", "va lera", " valera", "valera\t", "\n"] {
            assert!(
                matches!(Username::parse(s), Err(Error::InvalidUsername)),
                "{s:?} should be rejected"
            );
        }
    }

    #[test]
    fn should_reject_long_username() {
        let long = "a".repeat(MAX_USERNAME_LEN + 1);
        assert!(matches!(Username::parse(&long), Err(Error::InvalidUsername)));
    }

    #[test]
    fn should_bound_bio() {
        assert!(Bio::parse("Out hiking").is_ok());
        assert!(Bio::parse(&"ü".repeat(MAX_BIO_LEN)).is_ok());
        assert!(matches!(Bio::parse(""), Err(Error::InvalidBio)));
        assert!(matches!(
            Bio::parse(&"x".repeat(MAX_BIO_LEN + 1)),
            Err(Error::InvalidBio)
        ));
    }
}
