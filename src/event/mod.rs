use axum::Router;
use axum::routing::get;

use crate::state::AppState;
use crate::{auth, user};

mod handler;
mod model;

type Result<T> = std::result::Result<T, Error>;

pub fn ws<S>(s: AppState) -> Router<S> {
    Router::new()
        .route("/ws", get(handler::ws))
        .with_state(s)
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    _Auth(#[from] auth::Error),
    #[error(transparent)]
    _User(#[from] user::Error),
}
