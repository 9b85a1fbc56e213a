//! Error types for `footfall-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A subtype was requested that has no discriminator registered for it.
  #[error("no discriminator registered for interaction type {0:?}")]
  UnregisteredType(&'static str),

  #[error("payload error: {0}")]
  Payload(#[from] serde_json::Error),
}

impl Error {
  /// Whether this error stems from missing setup rather than from data.
  pub fn is_configuration(&self) -> bool {
    matches!(self, Self::UnregisteredType(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
