//! Subs: named communities that own posts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sub {
  /// Unique, URL-safe name (e.g. `programming`).
  pub name:        String,
  pub title:       String,
  pub description: Option<String>,
  /// Stored image reference, resolved against the configured base URL.
  pub image_urn:   Option<String>,
  pub created_at:  DateTime<Utc>,
}

/// Input to [`crate::store::ContentStore::create_sub`].
#[derive(Debug, Clone)]
pub struct NewSub {
  pub name:        String,
  pub title:       String,
  pub description: Option<String>,
  pub image_urn:   Option<String>,
}

/// A sub with the number of posts it owns, as produced by the store's
/// left-outer count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubPostCount {
  pub sub:        Sub,
  pub post_count: u64,
}

/// The sub embedded in an annotated post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSub {
  pub name:        String,
  pub title:       String,
  pub description: Option<String>,
}

impl From<Sub> for PostSub {
  fn from(sub: Sub) -> Self {
    Self { name: sub.name, title: sub.title, description: sub.description }
  }
}

/// One entry of the top-subs ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubSummary {
  pub title:      String,
  pub name:       String,
  pub image_url:  String,
  pub post_count: u64,
}
