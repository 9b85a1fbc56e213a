//! Error type for `footfall-store-sqlite`.

use footfall_core::store::{DUPLICATE_KEY_CODE, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] footfall_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("timestamp out of range: {0}")]
  Timestamp(i64),

  #[error("visit index out of range: {0}")]
  VisitIndex(i64),

  /// An interaction with this identity is already stored.
  #[error("duplicate key: interaction {0} already exists")]
  DuplicateKey(uuid::Uuid),
}

impl StoreError for Error {
  fn code(&self) -> Option<i32> {
    match self {
      Self::DuplicateKey(_) => Some(DUPLICATE_KEY_CODE),
      Self::Database(tokio_rusqlite::Error::Rusqlite(
        rusqlite::Error::SqliteFailure(e, _),
      )) => Some(e.extended_code),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
