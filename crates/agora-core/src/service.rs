//! The vote operation end to end: validate, resolve the target, reconcile,
//! re-fetch and annotate.

use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;

use crate::{
  Error, Result,
  annotate::{AnnotatedPost, annotate},
  reconcile::{Reconciliation, VoteReconciler},
  store::{ContentStore, VoteStore},
  vote::{Direction, VoteTarget},
};

/// A vote as submitted by a client.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
  pub identifier:         String,
  pub slug:               String,
  /// When present and non-empty the vote applies to this comment of the
  /// post.
  pub comment_identifier: Option<String>,
  /// Kept as raw JSON so that a malformed value is reported as an invalid
  /// vote value rather than a body parse failure.
  #[serde(default)]
  pub value:              Option<serde_json::Value>,
}

impl VoteRequest {
  /// The comment identifier, treating an empty string as absent.
  pub fn comment_identifier(&self) -> Option<&str> {
    self.comment_identifier.as_deref().filter(|id| !id.is_empty())
  }
}

/// Applies vote requests and returns the freshly annotated content tree.
pub struct VoteService<V, C> {
  reconciler: VoteReconciler<V>,
  content:    Arc<C>,
}

impl<V, C> Clone for VoteService<V, C> {
  fn clone(&self) -> Self {
    Self {
      reconciler: self.reconciler.clone(),
      content:    Arc::clone(&self.content),
    }
  }
}

impl<V: VoteStore, C: ContentStore> VoteService<V, C> {
  pub fn new(votes: Arc<V>, content: Arc<C>) -> Self {
    Self { reconciler: VoteReconciler::new(votes), content }
  }

  /// Cast, change or retract `voter`'s vote and return the post it belongs
  /// to, annotated for `voter`.
  ///
  /// If the vote is written but the re-fetch fails, the vote stands and the
  /// returned error describes the read.
  pub async fn vote(&self, voter: Uuid, request: &VoteRequest) -> Result<AnnotatedPost> {
    let requested = Direction::parse_json(request.value.as_ref())?;
    let (post_id, target) = self.resolve_target(request).await?;

    let Reconciliation { outcome, .. } =
      self.reconciler.apply(voter, target, requested).await?;
    tracing::info!(
      %voter,
      post = %request.identifier,
      comment = request.comment_identifier(),
      ?outcome,
      "vote applied"
    );

    let tree = self
      .content
      .post_tree(post_id)
      .await
      .map_err(Error::from_store)?
      .ok_or_else(|| post_not_found(request))?;

    Ok(annotate(tree, Some(voter)))
  }

  /// Look up the post (and comment, if any) the request refers to.
  async fn resolve_target(&self, request: &VoteRequest) -> Result<(Uuid, VoteTarget)> {
    let post = self
      .content
      .find_post(&request.identifier, &request.slug)
      .await
      .map_err(Error::from_store)?
      .ok_or_else(|| post_not_found(request))?;

    let Some(comment_identifier) = request.comment_identifier() else {
      return Ok((post.post_id, VoteTarget::Post(post.post_id)));
    };

    let comment = self
      .content
      .find_comment(post.post_id, comment_identifier)
      .await
      .map_err(Error::from_store)?
      .ok_or_else(|| Error::CommentNotFound(comment_identifier.to_owned()))?;

    Ok((post.post_id, VoteTarget::Comment(comment.comment_id)))
  }
}

fn post_not_found(request: &VoteRequest) -> Error {
  Error::PostNotFound {
    identifier: request.identifier.clone(),
    slug:       request.slug.clone(),
  }
}
