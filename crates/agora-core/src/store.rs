//! Store traits consumed by the voting core.
//!
//! Implemented by storage backends (e.g. `agora-store-sqlite`). The
//! reconciler, annotator and ranking query receive their store explicitly,
//! so tests can substitute in-memory fakes.

use std::future::Future;

use uuid::Uuid;

use crate::{
  content::{Comment, NewComment, NewPost, Post, PostTree},
  sub::{NewSub, Sub, SubPostCount},
  user::{Credentials, NewUser, User},
  vote::{Direction, NewVote, Vote, VoteTarget},
};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// The error contract every backend error type satisfies.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// `true` when the failure was a lost race on a vote row: a uniqueness
  /// violation on insert, or an update/delete whose row vanished. Such
  /// failures are retried by the reconciler.
  fn is_conflict(&self) -> bool;
}

// ─── Votes ───────────────────────────────────────────────────────────────────

/// Durable `(voter, target, direction)` records.
///
/// Backends must enforce at most one row per `(user, post)` and per
/// `(user, comment)` at the storage level and report a duplicate insert as an
/// error whose [`StoreError::is_conflict`] is `true`.
pub trait VoteStore: Send + Sync {
  type Error: StoreError;

  /// Find the vote `voter` cast on `target`, if any.
  fn find_vote(
    &self,
    voter: Uuid,
    target: VoteTarget,
  ) -> impl Future<Output = Result<Option<Vote>, Self::Error>> + Send + '_;

  /// Persist a new vote.
  fn insert_vote(
    &self,
    vote: NewVote,
  ) -> impl Future<Output = Result<Vote, Self::Error>> + Send + '_;

  /// Change the direction of an existing vote in place. Returns `false` if
  /// no row with `vote_id` exists.
  fn update_vote(
    &self,
    vote_id: Uuid,
    direction: Direction,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Remove a vote. Returns `false` if no row with `vote_id` exists.
  fn delete_vote(
    &self,
    vote_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

// ─── Content ─────────────────────────────────────────────────────────────────

/// Durable posts, comments and subs.
pub trait ContentStore: Send + Sync {
  type Error: StoreError;

  // ── Lookups ───────────────────────────────────────────────────────────

  /// Find a post by its public `(identifier, slug)` pair.
  fn find_post<'a>(
    &'a self,
    identifier: &'a str,
    slug: &'a str,
  ) -> impl Future<Output = Result<Option<Post>, Self::Error>> + Send + 'a;

  /// Find a comment by identifier, restricted to comments on `post_id`.
  fn find_comment<'a>(
    &'a self,
    post_id: Uuid,
    identifier: &'a str,
  ) -> impl Future<Output = Result<Option<Comment>, Self::Error>> + Send + 'a;

  /// Load a post with its votes and all of its comments with their votes.
  /// Returns `None` if the post does not exist.
  ///
  /// Must observe every write the calling task has already completed.
  fn post_tree(
    &self,
    post_id: Uuid,
  ) -> impl Future<Output = Result<Option<PostTree>, Self::Error>> + Send + '_;

  /// Every sub with the number of posts it owns; subs without posts are
  /// included with a count of zero. Order is unspecified.
  fn sub_post_counts(
    &self,
  ) -> impl Future<Output = Result<Vec<SubPostCount>, Self::Error>> + Send + '_;

  // ── Writes ────────────────────────────────────────────────────────────

  fn create_sub(
    &self,
    input: NewSub,
  ) -> impl Future<Output = Result<Sub, Self::Error>> + Send + '_;

  /// Persist a post, assigning its identifier and deriving its slug.
  fn create_post(
    &self,
    input: NewPost,
  ) -> impl Future<Output = Result<Post, Self::Error>> + Send + '_;

  /// Persist a comment, assigning its identifier.
  fn create_comment(
    &self,
    input: NewComment,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;
}

// ─── Users ───────────────────────────────────────────────────────────────────

/// User records backing the authentication collaborator.
pub trait UserStore: Send + Sync {
  type Error: StoreError;

  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Look up a user and their password hash by username.
  fn find_credentials<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<Credentials>, Self::Error>> + Send + 'a;
}
