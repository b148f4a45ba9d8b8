use std::sync::Arc;

use axum::{Router, routing::get};

use crate::{chat, receipt, state::AppState};

use repository::MessageRepository;
use service::MessageService;

mod handler;
pub mod model;
pub mod repository;
pub mod service;

type Result<T> = std::result::Result<T, Error>;
pub type Repository = Arc<dyn MessageRepository + Send + Sync>;
pub type Service = Arc<dyn MessageService + Send + Sync>;

integer_id!(Id);

pub fn api<S>(s: AppState) -> Router<S> {
    Router::new()
        .route(
            "/chats/{id}/messages",
            get(handler::api::transcript).post(handler::api::post),
        )
        .with_state(s)
}

/// Body of a message: plain text or the stored path of an uploaded image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Image(String),
}

impl Content {
    pub fn text(s: &str) -> Result<Self> {
        if s.trim().is_empty() {
            return Err(Error::Empty);
        }
        Ok(Self::Text(s.to_owned()))
    }

    pub fn image(path: impl Into<String>) -> Self {
        Self::Image(path.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(s) | Self::Image(s) => s,
        }
    }

    pub const fn is_image(&self) -> bool {
        matches!(self, Self::Image(_))
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("chat not found: {0}")]
    ChatNotFound(chat::Id),
    #[error("message is empty")]
    Empty,

    #[error(transparent)]
    _Chat(#[from] chat::Error),
    #[error(transparent)]
    _Receipt(#[from] receipt::Error),
    #[error(transparent)]
    _R2d2(#[from] r2d2::Error),
    #[error(transparent)]
    _Diesel(#[from] diesel::result::Error),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn should_reject_blank_text() {
        assert!(matches!(Content::text(""), Err(Error::Empty)));
        assert!(matches!(Content::text(" \n\t"), Err(Error::Empty)));
    }

    #[test]
    fn should_keep_text_verbatim() {
        let c = Content::text("  hi there ").unwrap();
        assert_eq!(c.as_str(), "  hi there ");
        assert!(!c.is_image());
    }

    #[test]
    fn should_mark_image() {
        let c = Content::image("/uploads/cat.png");
        assert_eq!(c.as_str(), "/uploads/cat.png");
        assert!(c.is_image());
    }
}
