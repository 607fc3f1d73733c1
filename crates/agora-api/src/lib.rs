//! JSON REST API for Agora voting and ranking.
//!
//! Exposes an axum [`Router`] backed by any store implementing
//! [`VoteStore`] and [`ContentStore`]. Authentication, TLS and transport
//! concerns are the caller's responsibility; see [`voter::Voter`].
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/misc/vote` | Authenticated; body `{identifier, slug, commentIdentifier?, value}` |
//! | `GET`  | `/misc/top-subs` | Optional `?limit=N` |
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", agora_api::api_router(store.clone(), settings))
//! ```

pub mod error;
pub mod subs;
pub mod voter;
pub mod votes;

use std::sync::Arc;

use agora_core::{
  ranking::{DEFAULT_LIMIT, ImageResolver, SubRankingQuery},
  service::VoteService,
  store::{ContentStore, VoteStore},
};
use axum::{
  Router,
  routing::{get, post},
};

pub use error::ApiError;

/// Settings the API needs from the embedding server's configuration.
#[derive(Debug, Clone)]
pub struct ApiSettings {
  pub images:         ImageResolver,
  /// Top-subs limit when the request gives none.
  pub top_subs_limit: usize,
}

impl ApiSettings {
  pub fn new(images: ImageResolver) -> Self {
    Self { images, top_subs_limit: DEFAULT_LIMIT }
  }
}

/// Shared state threaded through the API handlers.
pub struct ApiState<S> {
  pub votes:          VoteService<S, S>,
  pub rankings:       SubRankingQuery<S>,
  pub top_subs_limit: usize,
}

/// Build the API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, settings: ApiSettings) -> Router<()>
where
  S: VoteStore + ContentStore + 'static,
{
  let state = ApiState {
    votes:          VoteService::new(Arc::clone(&store), Arc::clone(&store)),
    rankings:       SubRankingQuery::new(store, settings.images),
    top_subs_limit: settings.top_subs_limit,
  };

  Router::new()
    .route("/misc/vote", post(votes::handler::<S>))
    .route("/misc/top-subs", get(subs::top::<S>))
    .with_state(Arc::new(state))
}

// ─── Router tests ─────────────────────────────────────────────────────────────
