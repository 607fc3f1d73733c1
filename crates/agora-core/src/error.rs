//! Error types for `agora-core`.

use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum Error {
  /// A vote value other than `-1`, `0` or `1`, as submitted (missing values
  /// render as `missing`). Raised before any store access.
  #[error("invalid vote value {0}: value must be -1, 0 or 1")]
  InvalidVoteValue(String),

  #[error("post not found: {identifier}/{slug}")]
  PostNotFound { identifier: String, slug: String },

  #[error("comment not found: {0}")]
  CommentNotFound(String),

  /// Retraction (value 0) of a vote that was never cast.
  #[error("vote not found")]
  VoteNotFound,

  /// A vote write lost a race against a concurrent write for the same
  /// (voter, target) pair, and the retry lost again.
  #[error("concurrent vote conflict")]
  ConcurrentVoteConflict,

  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Classify a backend error, keeping uniqueness races distinguishable from
  /// every other storage failure.
  pub fn from_store<E: StoreError>(e: E) -> Self {
    if e.is_conflict() {
      Self::ConcurrentVoteConflict
    } else {
      Self::Storage(Box::new(e))
    }
  }

  /// `true` for the errors raised when the voted post or comment is missing.
  pub fn is_target_not_found(&self) -> bool {
    matches!(self, Self::PostNotFound { .. } | Self::CommentNotFound(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
