//! Handler for `GET /misc/top-subs`.

use std::sync::Arc;

use agora_core::{store::ContentStore, sub::SubSummary};
use axum::{
  Json,
  extract::{Query, State},
};
use serde::Deserialize;

use crate::{ApiState, error::ApiError};

/// Upper bound on `?limit`. `0` yields an empty list.
pub const MAX_LIMIT: usize = 100;

#[derive(Debug, Deserialize, Default)]
pub struct TopSubsParams {
  /// Number of subs to return; defaults to the configured limit.
  pub limit: Option<usize>,
}

/// `GET /misc/top-subs[?limit=N]`
pub async fn top<S>(
  State(state): State<Arc<ApiState<S>>>,
  Query(params): Query<TopSubsParams>,
) -> Result<Json<Vec<SubSummary>>, ApiError>
where
  S: ContentStore + 'static,
{
  let limit = params.limit.unwrap_or(state.top_subs_limit).min(MAX_LIMIT);
  let subs = state.rankings.top_subs(limit).await?;
  Ok(Json(subs))
}
