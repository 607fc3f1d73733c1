//! HTTP server for Agora.
//!
//! Wires the JSON API from `agora-api` to a store, authenticates requests
//! with HTTP Basic credentials checked against the users table, and adds
//! request tracing.

pub mod auth;
pub mod error;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use agora_api::ApiSettings;
use agora_core::{
  ranking::{DEFAULT_LIMIT, ImageResolver, PLACEHOLDER_IMAGE_URL},
  store::{ContentStore, UserStore, VoteStore},
};
use axum::{Router, middleware};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `AGORA_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                  String,
  #[serde(default = "default_port")]
  pub port:                  u16,
  /// Public origin images are served from, e.g. `https://agora.example`.
  pub base_url:              String,
  pub store_path:            PathBuf,
  #[serde(default = "default_top_subs_limit")]
  pub top_subs_limit:        usize,
  #[serde(default = "default_placeholder")]
  pub placeholder_image_url: String,
}

fn default_host() -> String { "127.0.0.1".into() }

fn default_port() -> u16 { 5000 }

fn default_top_subs_limit() -> usize { DEFAULT_LIMIT }

fn default_placeholder() -> String { PLACEHOLDER_IMAGE_URL.into() }

impl ServerConfig {
  pub fn api_settings(&self) -> ApiSettings {
    let images = ImageResolver::new(self.base_url.as_str())
      .with_placeholder(self.placeholder_image_url.as_str());
    ApiSettings { images, top_subs_limit: self.top_subs_limit }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

pub struct AppState<S> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), config: Arc::clone(&self.config) }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router: `/api/...` behind Basic auth, traced.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: VoteStore + ContentStore + UserStore + 'static,
{
  let api = agora_api::api_router(Arc::clone(&state.store), state.config.api_settings());

  Router::new()
    .nest("/api", api)
    .layer(middleware::from_fn_with_state(state, auth::attach_user::<S>))
    .layer(TraceLayer::new_for_http())
}
