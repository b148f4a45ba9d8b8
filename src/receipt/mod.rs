//! Ledger of which user has seen which message.
//!
//! A receipt is written at most once per `(message, user)` pair and is never
//! updated afterwards, so the first `read_at` wins.

use std::sync::Arc;

use repository::ReceiptRepository;

pub mod model;
pub mod repository;

type Result<T> = std::result::Result<T, Error>;
pub type Repository = Arc<dyn ReceiptRepository + Send + Sync>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    _R2d2(#[from] r2d2::Error),
    #[error(transparent)]
    _Diesel(#[from] diesel::result::Error),
}
