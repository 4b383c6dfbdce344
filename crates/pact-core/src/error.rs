//! Error types for `pact-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("a contract needs at least one party")]
  NoParties,

  #[error("party listed more than once: {0:?}")]
  DuplicateParty(String),

  #[error("contract {0:?} already has a persisted snapshot")]
  AlreadyExists(String),

  #[error("persisted snapshot for contract {id:?} is corrupt: {source}")]
  CorruptSnapshot {
    id:     String,
    #[source]
    source: serde_json::Error,
  },

  #[error("reminder for {party:?} {days} days from now is out of range")]
  ReminderOutOfRange { party: String, days: i64 },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend-specific storage error.
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
