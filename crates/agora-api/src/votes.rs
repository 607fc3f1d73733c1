//! Handler for `POST /misc/vote`.
//!
//! Body: [`VoteRequest`] (`{ identifier, slug, commentIdentifier?, value }`).
//! Returns the voted post with its comments, annotated for the caller.

use std::sync::Arc;

use agora_core::{
  annotate::AnnotatedPost,
  service::VoteRequest,
  store::{ContentStore, VoteStore},
};
use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};

use crate::{ApiState, error::ApiError, voter::Voter};

/// `POST /misc/vote`
pub async fn handler<S>(
  State(state): State<Arc<ApiState<S>>>,
  Voter(user): Voter,
  body: Result<Json<VoteRequest>, JsonRejection>,
) -> Result<Json<AnnotatedPost>, ApiError>
where
  S: VoteStore + ContentStore + 'static,
{
  let Json(body) = body?;
  let annotated = state.votes.vote(user.user_id, &body).await?;
  Ok(Json(annotated))
}
