//! The vote state machine.
//!
//! | existing | requested | effect                        |
//! |----------|-----------|-------------------------------|
//! | none     | 0         | [`Error::VoteNotFound`]       |
//! | none     | ±1        | insert                        |
//! | some     | 0         | delete                        |
//! | some     | other ±1  | update in place               |
//! | some     | same ±1   | nothing                       |

use std::sync::Arc;

use uuid::Uuid;

use crate::{
  Error, Result,
  store::VoteStore,
  vote::{Direction, NewVote, Vote, VoteTarget},
};

/// Attempts made before a [`Error::ConcurrentVoteConflict`] is surfaced.
const MAX_ATTEMPTS: usize = 2;

/// What a reconciliation did to the vote row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
  Created(Vote),
  Updated(Vote),
  /// Carries the row as it was before deletion.
  Deleted(Vote),
  /// The requested direction matched the stored one.
  Unchanged(Vote),
}

impl Outcome {
  /// The vote row left in storage, or `None` after a deletion.
  pub fn current(&self) -> Option<&Vote> {
    match self {
      Self::Created(v) | Self::Updated(v) | Self::Unchanged(v) => Some(v),
      Self::Deleted(_) => None,
    }
  }
}

/// The result of [`VoteReconciler::reconcile`]: the outcome and the target
/// whose content tree the caller should re-fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
  pub voter:   Uuid,
  pub target:  VoteTarget,
  pub outcome: Outcome,
}

/// Reconciles vote requests against a [`VoteStore`].
pub struct VoteReconciler<V> {
  votes: Arc<V>,
}

impl<V> Clone for VoteReconciler<V> {
  fn clone(&self) -> Self { Self { votes: Arc::clone(&self.votes) } }
}

impl<V: VoteStore> VoteReconciler<V> {
  pub fn new(votes: Arc<V>) -> Self { Self { votes } }

  /// Validate `value` and reconcile it against the stored vote of `voter` on
  /// `target`.
  ///
  /// Values outside `{-1, 0, 1}` fail with [`Error::InvalidVoteValue`]
  /// without touching the store.
  pub async fn reconcile(
    &self,
    voter: Uuid,
    target: VoteTarget,
    value: i64,
  ) -> Result<Reconciliation> {
    let requested = Direction::parse_requested(value)?;
    self.apply(voter, target, requested).await
  }

  /// Reconcile an already-validated request; `None` retracts.
  ///
  /// A lost race against a concurrent request for the same pair is retried
  /// from a fresh read once before [`Error::ConcurrentVoteConflict`] is
  /// returned.
  pub async fn apply(
    &self,
    voter: Uuid,
    target: VoteTarget,
    requested: Option<Direction>,
  ) -> Result<Reconciliation> {
    let mut attempt = 1;
    loop {
      match self.attempt(voter, target, requested).await {
        Err(Error::ConcurrentVoteConflict) if attempt < MAX_ATTEMPTS => {
          tracing::debug!(%voter, ?target, attempt, "vote write conflicted, retrying");
          attempt += 1;
        }
        Ok(outcome) => {
          tracing::debug!(%voter, ?target, ?outcome, "vote reconciled");
          return Ok(Reconciliation { voter, target, outcome });
        }
        Err(e) => return Err(e),
      }
    }
  }

  async fn attempt(
    &self,
    voter: Uuid,
    target: VoteTarget,
    requested: Option<Direction>,
  ) -> Result<Outcome> {
    let existing = self
      .votes
      .find_vote(voter, target)
      .await
      .map_err(Error::from_store)?;

    match (existing, requested) {
      // NOTE: retracting a vote that was never cast is an error, while
      // retracting an existing one succeeds. Clients see this as a 404.
      (None, None) => Err(Error::VoteNotFound),

      (None, Some(direction)) => {
        let vote = self
          .votes
          .insert_vote(NewVote { user_id: voter, target, direction })
          .await
          .map_err(Error::from_store)?;
        Ok(Outcome::Created(vote))
      }

      (Some(vote), None) => {
        let deleted = self
          .votes
          .delete_vote(vote.vote_id)
          .await
          .map_err(Error::from_store)?;
        if !deleted {
          return Err(Error::ConcurrentVoteConflict);
        }
        Ok(Outcome::Deleted(vote))
      }

      (Some(vote), Some(direction)) if vote.direction == direction => {
        Ok(Outcome::Unchanged(vote))
      }

      (Some(mut vote), Some(direction)) => {
        let updated = self
          .votes
          .update_vote(vote.vote_id, direction)
          .await
          .map_err(Error::from_store)?;
        if !updated {
          return Err(Error::ConcurrentVoteConflict);
        }
        vote.direction = direction;
        Ok(Outcome::Updated(vote))
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::memory::{MemoryStore, SpyStore};

  fn post_target() -> VoteTarget { VoteTarget::Post(Uuid::new_v4()) }

  fn reconciler(store: &Arc<MemoryStore>) -> VoteReconciler<MemoryStore> {
    VoteReconciler::new(Arc::clone(store))
  }

  #[tokio::test]
  async fn first_vote_creates_row() {
    let store = Arc::new(MemoryStore::default());
    let voter = Uuid::new_v4();
    let target = post_target();

    let r = reconciler(&store).reconcile(voter, target, 1).await.unwrap();
    assert!(matches!(r.outcome, Outcome::Created(ref v) if v.direction == Direction::Up));
    assert_eq!(store.votes_on(target).len(), 1);
  }

  #[tokio::test]
  async fn repeating_a_vote_is_a_no_op() {
    let store = Arc::new(MemoryStore::default());
    let rec = reconciler(&store);
    let voter = Uuid::new_v4();
    let target = post_target();

    rec.reconcile(voter, target, -1).await.unwrap();
    let second = rec.reconcile(voter, target, -1).await.unwrap();

    assert!(matches!(second.outcome, Outcome::Unchanged(_)));
    let votes = store.votes_on(target);
    assert_eq!(votes.len(), 1);
    assert_eq!(votes[0].direction, Direction::Down);
  }

  #[tokio::test]
  async fn toggle_round_trip() {
    let store = Arc::new(MemoryStore::default());
    let rec = reconciler(&store);
    let voter = Uuid::new_v4();
    let target = post_target();

    rec.reconcile(voter, target, 1).await.unwrap();
    let retract = rec.reconcile(voter, target, 0).await.unwrap();
    assert!(matches!(retract.outcome, Outcome::Deleted(_)));
    assert!(retract.outcome.current().is_none());
    assert!(store.votes_on(target).is_empty());

    let again = rec.reconcile(voter, target, 0).await;
    assert!(matches!(again, Err(Error::VoteNotFound)));
  }

  #[tokio::test]
  async fn changing_direction_updates_in_place() {
    let store = Arc::new(MemoryStore::default());
    let rec = reconciler(&store);
    let voter = Uuid::new_v4();
    let target = VoteTarget::Comment(Uuid::new_v4());

    let created = rec.reconcile(voter, target, 1).await.unwrap();
    let updated = rec.reconcile(voter, target, -1).await.unwrap();

    let Outcome::Updated(vote) = &updated.outcome else {
      panic!("expected update, got {:?}", updated.outcome);
    };
    assert_eq!(Some(vote.vote_id), created.outcome.current().map(|v| v.vote_id));
    let votes = store.votes_on(target);
    assert_eq!(votes.len(), 1);
    assert_eq!(votes[0].direction, Direction::Down);
  }

  #[tokio::test]
  async fn retract_without_vote_fails() {
    let store = Arc::new(MemoryStore::default());
    let result = reconciler(&store).reconcile(Uuid::new_v4(), post_target(), 0).await;
    assert!(matches!(result, Err(Error::VoteNotFound)));
  }

  #[tokio::test]
  async fn post_and_comment_votes_are_separate_rows() {
    let store = Arc::new(MemoryStore::default());
    let rec = reconciler(&store);
    let voter = Uuid::new_v4();
    let id = Uuid::new_v4();

    rec.reconcile(voter, VoteTarget::Post(id), 1).await.unwrap();
    let on_comment = rec.reconcile(voter, VoteTarget::Comment(id), 1).await.unwrap();
    assert!(matches!(on_comment.outcome, Outcome::Created(_)));
  }

  #[tokio::test]
  async fn invalid_value_touches_no_store() {
    let spy = Arc::new(SpyStore::default());
    let rec = VoteReconciler::new(Arc::clone(&spy));

    let result = rec.reconcile(Uuid::new_v4(), post_target(), 2).await;
    assert!(matches!(result, Err(Error::InvalidVoteValue(ref v)) if v == "2"));
    assert_eq!(spy.calls(), 0);
  }

  #[tokio::test]
  async fn insert_conflict_is_retried_once() {
    let store = Arc::new(MemoryStore::default());
    let voter = Uuid::new_v4();
    let target = post_target();
    // A concurrent request commits an upvote between our read and write.
    store.race_next_insert(voter, target, Direction::Up);

    let r = reconciler(&store).reconcile(voter, target, 1).await.unwrap();
    assert!(matches!(r.outcome, Outcome::Unchanged(_)));
    assert_eq!(store.votes_on(target).len(), 1);
  }

  #[tokio::test]
  async fn insert_conflict_after_retry_then_update() {
    let store = Arc::new(MemoryStore::default());
    let voter = Uuid::new_v4();
    let target = post_target();
    store.race_next_insert(voter, target, Direction::Down);

    let r = reconciler(&store).reconcile(voter, target, 1).await.unwrap();
    assert!(matches!(r.outcome, Outcome::Updated(ref v) if v.direction == Direction::Up));
    let votes = store.votes_on(target);
    assert_eq!(votes.len(), 1);
    assert_eq!(votes[0].direction, Direction::Up);
  }

  #[tokio::test]
  async fn persistent_conflict_is_surfaced() {
    let store = Arc::new(MemoryStore::default());
    store.fail_inserts_with_conflict();

    let result = reconciler(&store).reconcile(Uuid::new_v4(), post_target(), 1).await;
    assert!(matches!(result, Err(Error::ConcurrentVoteConflict)));
    assert_eq!(store.insert_attempts(), MAX_ATTEMPTS);
  }

  #[tokio::test]
  async fn storage_failure_is_not_retried() {
    let store = Arc::new(MemoryStore::default());
    store.fail_everything();

    let result = reconciler(&store).reconcile(Uuid::new_v4(), post_target(), 1).await;
    assert!(matches!(result, Err(Error::Storage(_))));
  }
}
