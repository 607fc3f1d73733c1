//! In-memory store fakes for unit tests.
//!
//! [`MemoryStore`] implements [`VoteStore`] and [`ContentStore`] over plain
//! vectors behind a `Mutex`, with switches that inject conflicts and
//! failures. [`SpyStore`] answers every call with nothing and counts calls.

use std::sync::{
  Mutex,
  atomic::{AtomicUsize, Ordering},
};

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::{
  content::{
    Comment, CommentNode, NewComment, NewPost, Post, PostTree, make_identifier, slugify,
  },
  store::{ContentStore, StoreError, VoteStore},
  sub::{NewSub, Sub, SubPostCount},
  vote::{Direction, NewVote, Vote, VoteTarget},
};

#[derive(Debug, Error)]
pub enum MemoryError {
  #[error("duplicate vote")]
  Conflict,
  #[error("store unavailable")]
  Unavailable,
}

impl StoreError for MemoryError {
  fn is_conflict(&self) -> bool { matches!(self, Self::Conflict) }
}

// ─── MemoryStore ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct Inner {
  subs:            Vec<Sub>,
  posts:           Vec<Post>,
  comments:        Vec<Comment>,
  votes:           Vec<Vote>,
  racing_insert:   Option<NewVote>,
  always_conflict: bool,
  fail_all:        bool,
  fail_post_tree:  bool,
  insert_attempts: usize,
}

#[derive(Default)]
pub struct MemoryStore {
  inner: Mutex<Inner>,
}

fn new_vote_row(input: NewVote) -> Vote {
  let now = Utc::now();
  Vote {
    vote_id:    Uuid::new_v4(),
    user_id:    input.user_id,
    target:     input.target,
    direction:  input.direction,
    created_at: now,
    updated_at: now,
  }
}

impl MemoryStore {
  fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
    self.inner.lock().unwrap()
  }

  pub fn votes_on(&self, target: VoteTarget) -> Vec<Vote> {
    self.lock().votes.iter().filter(|v| v.target == target).cloned().collect()
  }

  pub fn insert_attempts(&self) -> usize { self.lock().insert_attempts }

  /// Simulate a concurrent request committing `direction` for the pair just
  /// before the next insert, so that insert hits the uniqueness check.
  pub fn race_next_insert(&self, user_id: Uuid, target: VoteTarget, direction: Direction) {
    self.lock().racing_insert = Some(NewVote { user_id, target, direction });
  }

  pub fn fail_inserts_with_conflict(&self) { self.lock().always_conflict = true; }

  pub fn fail_everything(&self) { self.lock().fail_all = true; }

  pub fn fail_post_tree(&self) { self.lock().fail_post_tree = true; }

  fn check(&self) -> Result<std::sync::MutexGuard<'_, Inner>, MemoryError> {
    let inner = self.lock();
    if inner.fail_all {
      return Err(MemoryError::Unavailable);
    }
    Ok(inner)
  }
}

impl VoteStore for MemoryStore {
  type Error = MemoryError;

  async fn find_vote(&self, voter: Uuid, target: VoteTarget) -> Result<Option<Vote>, MemoryError> {
    let inner = self.check()?;
    Ok(
      inner
        .votes
        .iter()
        .find(|v| v.user_id == voter && v.target == target)
        .cloned(),
    )
  }

  async fn insert_vote(&self, input: NewVote) -> Result<Vote, MemoryError> {
    let mut inner = self.check()?;
    inner.insert_attempts += 1;
    if inner.always_conflict {
      return Err(MemoryError::Conflict);
    }
    if let Some(racing) = inner.racing_insert.take() {
      inner.votes.push(new_vote_row(racing));
    }
    let duplicate = inner
      .votes
      .iter()
      .any(|v| v.user_id == input.user_id && v.target == input.target);
    if duplicate {
      return Err(MemoryError::Conflict);
    }
    let vote = new_vote_row(input);
    inner.votes.push(vote.clone());
    Ok(vote)
  }

  async fn update_vote(&self, vote_id: Uuid, direction: Direction) -> Result<bool, MemoryError> {
    let mut inner = self.check()?;
    match inner.votes.iter_mut().find(|v| v.vote_id == vote_id) {
      Some(v) => {
        v.direction = direction;
        v.updated_at = Utc::now();
        Ok(true)
      }
      None => Ok(false),
    }
  }

  async fn delete_vote(&self, vote_id: Uuid) -> Result<bool, MemoryError> {
    let mut inner = self.check()?;
    let before = inner.votes.len();
    inner.votes.retain(|v| v.vote_id != vote_id);
    Ok(inner.votes.len() < before)
  }
}

impl ContentStore for MemoryStore {
  type Error = MemoryError;

  async fn find_post(&self, identifier: &str, slug: &str) -> Result<Option<Post>, MemoryError> {
    let inner = self.check()?;
    Ok(
      inner
        .posts
        .iter()
        .find(|p| p.identifier == identifier && p.slug == slug)
        .cloned(),
    )
  }

  async fn find_comment(&self, post_id: Uuid, identifier: &str) -> Result<Option<Comment>, MemoryError> {
    let inner = self.check()?;
    Ok(
      inner
        .comments
        .iter()
        .find(|c| c.post_id == post_id && c.identifier == identifier)
        .cloned(),
    )
  }

  async fn post_tree(&self, post_id: Uuid) -> Result<Option<PostTree>, MemoryError> {
    let inner = self.check()?;
    if inner.fail_post_tree {
      return Err(MemoryError::Unavailable);
    }
    let Some(post) = inner.posts.iter().find(|p| p.post_id == post_id).cloned() else {
      return Ok(None);
    };
    let sub = inner
      .subs
      .iter()
      .find(|s| s.name == post.sub_name)
      .cloned()
      .ok_or(MemoryError::Unavailable)?;
    let votes_on = |target: VoteTarget| -> Vec<Vote> {
      inner.votes.iter().filter(|v| v.target == target).cloned().collect()
    };
    let comments = inner
      .comments
      .iter()
      .filter(|c| c.post_id == post_id)
      .map(|c| CommentNode {
        comment: c.clone(),
        votes:   votes_on(VoteTarget::Comment(c.comment_id)),
      })
      .collect();
    Ok(Some(PostTree { votes: votes_on(VoteTarget::Post(post_id)), comments, post, sub }))
  }

  async fn sub_post_counts(&self) -> Result<Vec<SubPostCount>, MemoryError> {
    let inner = self.check()?;
    Ok(
      inner
        .subs
        .iter()
        .map(|s| SubPostCount {
          sub:        s.clone(),
          post_count: inner.posts.iter().filter(|p| p.sub_name == s.name).count() as u64,
        })
        .collect(),
    )
  }

  async fn create_sub(&self, input: NewSub) -> Result<Sub, MemoryError> {
    let mut inner = self.check()?;
    let sub = Sub {
      name:        input.name,
      title:       input.title,
      description: input.description,
      image_urn:   input.image_urn,
      created_at:  Utc::now(),
    };
    inner.subs.push(sub.clone());
    Ok(sub)
  }

  async fn create_post(&self, input: NewPost) -> Result<Post, MemoryError> {
    let mut inner = self.check()?;
    let post = Post {
      post_id:    Uuid::new_v4(),
      identifier: make_identifier(7),
      slug:       slugify(&input.title),
      title:      input.title,
      body:       input.body,
      sub_name:   input.sub_name,
      username:   input.username,
      created_at: Utc::now(),
    };
    inner.posts.push(post.clone());
    Ok(post)
  }

  async fn create_comment(&self, input: NewComment) -> Result<Comment, MemoryError> {
    let mut inner = self.check()?;
    let comment = Comment {
      comment_id: Uuid::new_v4(),
      identifier: make_identifier(8),
      post_id:    input.post_id,
      body:       input.body,
      username:   input.username,
      created_at: Utc::now(),
    };
    inner.comments.push(comment.clone());
    Ok(comment)
  }
}

// ─── SpyStore ────────────────────────────────────────────────────────────────

/// Records how many store calls were made; every lookup finds nothing.
#[derive(Default)]
pub struct SpyStore {
  calls: AtomicUsize,
}

impl SpyStore {
  pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }

  fn record(&self) { self.calls.fetch_add(1, Ordering::SeqCst); }
}

impl VoteStore for SpyStore {
  type Error = MemoryError;

  async fn find_vote(&self, _: Uuid, _: VoteTarget) -> Result<Option<Vote>, MemoryError> {
    self.record();
    Ok(None)
  }

  async fn insert_vote(&self, input: NewVote) -> Result<Vote, MemoryError> {
    self.record();
    Ok(new_vote_row(input))
  }

  async fn update_vote(&self, _: Uuid, _: Direction) -> Result<bool, MemoryError> {
    self.record();
    Ok(false)
  }

  async fn delete_vote(&self, _: Uuid) -> Result<bool, MemoryError> {
    self.record();
    Ok(false)
  }
}

impl ContentStore for SpyStore {
  type Error = MemoryError;

  async fn find_post(&self, _: &str, _: &str) -> Result<Option<Post>, MemoryError> {
    self.record();
    Ok(None)
  }

  async fn find_comment(&self, _: Uuid, _: &str) -> Result<Option<Comment>, MemoryError> {
    self.record();
    Ok(None)
  }

  async fn post_tree(&self, _: Uuid) -> Result<Option<PostTree>, MemoryError> {
    self.record();
    Ok(None)
  }

  async fn sub_post_counts(&self) -> Result<Vec<SubPostCount>, MemoryError> {
    self.record();
    Ok(Vec::new())
  }

  async fn create_sub(&self, _: NewSub) -> Result<Sub, MemoryError> {
    self.record();
    Err(MemoryError::Unavailable)
  }

  async fn create_post(&self, _: NewPost) -> Result<Post, MemoryError> {
    self.record();
    Err(MemoryError::Unavailable)
  }

  async fn create_comment(&self, _: NewComment) -> Result<Comment, MemoryError> {
    self.record();
    Err(MemoryError::Unavailable)
  }
}
