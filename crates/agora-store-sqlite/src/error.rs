//! Error type for `agora-store-sqlite`.

use agora_core::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored row violates an invariant the schema cannot express.
  #[error("corrupt row: {0}")]
  Corrupt(String),

  /// The UNIQUE constraint on `(user_id, post_id)` or `(user_id, comment_id)`
  /// rejected an insert.
  #[error("a vote by this user on this target already exists")]
  DuplicateVote,

  #[error("username already taken: {0}")]
  UsernameTaken(String),
}

impl StoreError for Error {
  fn is_conflict(&self) -> bool { matches!(self, Self::DuplicateVote) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
