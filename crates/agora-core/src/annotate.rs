//! Read-side projection of a content tree into its annotated, serialisable
//! form.
//!
//! Nothing here touches a store: scores and user votes are pure functions of
//! the votes loaded into a [`PostTree`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  content::{CommentNode, PostTree},
  sub::PostSub,
  vote::{Direction, Vote, serialize_user_vote},
};

// ─── Derived values ──────────────────────────────────────────────────────────

/// Net score of a set of votes; `0` when empty.
pub fn vote_score(votes: &[Vote]) -> i64 {
  votes.iter().map(|v| v.direction.value()).sum()
}

/// The direction `user` voted among `votes`, or `None` if they have not.
pub fn user_vote(votes: &[Vote], user: Uuid) -> Option<Direction> {
  votes.iter().find(|v| v.user_id == user).map(|v| v.direction)
}

// ─── Annotated output ────────────────────────────────────────────────────────

/// A comment with its derived vote fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedComment {
  pub identifier: String,
  pub body:       String,
  pub username:   String,
  pub created_at: DateTime<Utc>,
  pub vote_score: i64,
  /// `None` is the no-vote sentinel; serialised as `0`.
  #[serde(serialize_with = "serialize_user_vote")]
  pub user_vote:  Option<Direction>,
}

/// A post with its derived vote fields and annotated comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedPost {
  pub identifier:    String,
  pub slug:          String,
  pub title:         String,
  pub body:          Option<String>,
  pub sub_name:      String,
  pub sub:           PostSub,
  pub username:      String,
  pub created_at:    DateTime<Utc>,
  pub url:           String,
  pub vote_score:    i64,
  #[serde(serialize_with = "serialize_user_vote")]
  pub user_vote:     Option<Direction>,
  pub comment_count: usize,
  pub comments:      Vec<AnnotatedComment>,
}

// ─── Annotator ───────────────────────────────────────────────────────────────

/// Annotate `tree` from the perspective of `user`.
///
/// The post and each comment are scored from their own votes only. With no
/// user (anonymous read) every `user_vote` is `None`.
pub fn annotate(tree: PostTree, user: Option<Uuid>) -> AnnotatedPost {
  let PostTree { post, sub, votes, comments } = tree;

  let comments: Vec<AnnotatedComment> = comments
    .into_iter()
    .map(|node| annotate_comment(node, user))
    .collect();

  AnnotatedPost {
    url:           post.url(),
    vote_score:    vote_score(&votes),
    user_vote:     user.and_then(|u| user_vote(&votes, u)),
    comment_count: comments.len(),
    comments,
    identifier:    post.identifier,
    slug:          post.slug,
    title:         post.title,
    body:          post.body,
    sub_name:      post.sub_name,
    sub:           sub.into(),
    username:      post.username,
    created_at:    post.created_at,
  }
}

fn annotate_comment(node: CommentNode, user: Option<Uuid>) -> AnnotatedComment {
  let CommentNode { comment, votes } = node;
  AnnotatedComment {
    vote_score: vote_score(&votes),
    user_vote:  user.and_then(|u| user_vote(&votes, u)),
    identifier: comment.identifier,
    body:       comment.body,
    username:   comment.username,
    created_at: comment.created_at,
  }
}
