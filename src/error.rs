use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum BooksError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("session not found")]
    SessionNotFound,
}

pub type Result<T> = std::result::Result<T, BooksError>;
