use std::sync::Arc;

use axum::{Router, routing::get};

use crate::{chat, state::AppState};

use repository::ContactRepository;
use service::ContactService;

mod handler;
pub mod model;
pub mod repository;
pub mod service;

type Result<T> = std::result::Result<T, Error>;
pub type Repository = Arc<dyn ContactRepository + Send + Sync>;
pub type Service = Arc<dyn ContactService + Send + Sync>;

pub fn api<S>(s: AppState) -> Router<S> {
    Router::new()
        .route("/contacts", get(handler::api::find_all))
        .with_state(s)
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("data integrity violation: direct chat {0} has no other member")]
    Integrity(chat::Id),

    #[error(transparent)]
    _Chat(#[from] chat::Error),
    #[error(transparent)]
    _R2d2(#[from] r2d2::Error),
    #[error(transparent)]
    _Diesel(#[from] diesel::result::Error),
}
