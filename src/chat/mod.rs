use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::{state::AppState, user};

use repository::ChatRepository;
use service::ChatService;

mod handler;
pub mod model;
pub mod repository;
pub mod service;

type Result<T> = std::result::Result<T, Error>;
pub type Repository = Arc<dyn ChatRepository + Send + Sync>;
pub type Service = Arc<dyn ChatService + Send + Sync>;

integer_id!(Id);

pub const DEFAULT_DESCRIPTION: &str = "Add a Description...";
const MAX_TEXT_LEN: usize = 100;

pub fn api<S>(s: AppState) -> Router<S> {
    Router::new()
        .route("/chats/direct", post(handler::api::start_direct))
        .route("/chats/group", post(handler::api::start_group))
        .route("/chats/{id}", get(handler::api::header))
        .route("/chats/{id}/profile", get(handler::api::group_profile))
        .route("/chats/{id}/favourite", put(handler::api::favourite))
        .route("/chats/{id}/title", put(handler::api::update_title))
        .route("/chats/{id}/description", put(handler::api::update_description))
        .route(
            "/chats/{id}/avatar",
            post(handler::api::upload_avatar).delete(handler::api::delete_avatar),
        )
        .route("/chats/{id}/members", post(handler::api::add_members))
        .route(
            "/chats/{id}/members/{user_id}",
            delete(handler::api::remove_member),
        )
        .route("/chats/{id}/leave", post(handler::api::leave))
        .route("/users/{id}/favourite", put(handler::api::favourite_user))
        .route("/users/{id}/friend", delete(handler::api::remove_friend))
        .with_state(s)
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("chat not found: {0}")]
    NotFound(Id),
    #[error("not a member of chat {0}")]
    NotMember(Id),
    #[error("chat {0} is not a group chat")]
    NotGroup(Id),
    #[error("cannot start a chat with yourself")]
    SelfChat,
    #[error("selected user does not exist: {0}")]
    NonExistingUser(user::Id),
    #[error("group chat with these members already exists")]
    AlreadyExists,
    #[error("not enough members: {0}")]
    NotEnoughMembers(usize),
    #[error("no new members to add")]
    NoNewMembers,
    #[error("user {0} is not a member of this chat")]
    MemberNotFound(user::Id),
    #[error("no direct chat with user {0}")]
    NoDirectChat(user::Id),
    #[error("title must be between 1 and 100 characters")]
    InvalidTitle,
    #[error("description must be between 1 and 100 characters")]
    InvalidDescription,
    #[error("direct chat {0} has no other member")]
    Integrity(Id),
    #[error("gave up after {0} conflicting attempts")]
    Contention(usize),

    #[error(transparent)]
    _User(#[from] user::Error),
    #[error(transparent)]
    _R2d2(#[from] r2d2::Error),
    #[error(transparent)]
    _Diesel(#[from] diesel::result::Error),
}

/// Trims and bounds a group title or description.
fn bounded_text(s: &str, err: Error) -> Result<&str> {
    let s = s.trim();
    let len = s.chars().count();
    if len == 0 || len > MAX_TEXT_LEN {
        return Err(err);
    }
    Ok(s)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn should_accept_bounded_text() {
        assert_eq!(bounded_text("  Weekend  ", Error::InvalidTitle).unwrap(), "Weekend");
        let max = "ä".repeat(MAX_TEXT_LEN);
        assert!(bounded_text(&max, Error::InvalidTitle).is_ok());
    }

    #[test]
    fn should_reject_empty_or_long_text() {
        assert!(matches!(
            bounded_text("   ", Error::InvalidTitle),
            Err(Error::InvalidTitle)
        ));
        let long = "a".repeat(MAX_TEXT_LEN + 1);
        assert!(matches!(
            bounded_text(&long, Error::InvalidDescription),
            Err(Error::InvalidDescription)
        ));
    }
}
