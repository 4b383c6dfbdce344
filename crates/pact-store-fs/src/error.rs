//! Error type for `pact-store-fs`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The id cannot be mapped to a file inside the store directory.
  #[error("invalid contract id for file storage: {0:?}")]
  InvalidId(String),

  #[error("i/o error on {path:?}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
