//! Posts, comments, and the content tree loaded for annotation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{sub::Sub, vote::Vote};

// ─── Post ────────────────────────────────────────────────────────────────────

/// A post, addressed publicly by its `(identifier, slug)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
  pub post_id:    Uuid,
  pub identifier: String,
  pub slug:       String,
  pub title:      String,
  pub body:       Option<String>,
  pub sub_name:   String,
  /// Author's username.
  pub username:   String,
  pub created_at: DateTime<Utc>,
}

impl Post {
  /// Relative URL of the post page.
  pub fn url(&self) -> String {
    format!("/r/{}/{}/{}", self.sub_name, self.identifier, self.slug)
  }
}

/// Input to [`crate::store::ContentStore::create_post`]. The store assigns
/// the identifier and slug.
#[derive(Debug, Clone)]
pub struct NewPost {
  pub title:    String,
  pub body:     Option<String>,
  pub sub_name: String,
  pub username: String,
}

// ─── Comment ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
  pub comment_id: Uuid,
  pub identifier: String,
  pub post_id:    Uuid,
  pub body:       String,
  pub username:   String,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::ContentStore::create_comment`].
#[derive(Debug, Clone)]
pub struct NewComment {
  pub post_id:  Uuid,
  pub body:     String,
  pub username: String,
}

// ─── Content tree ────────────────────────────────────────────────────────────

/// A comment with every vote cast on it.
#[derive(Debug, Clone)]
pub struct CommentNode {
  pub comment: Comment,
  pub votes:   Vec<Vote>,
}

/// A post with its sub, its votes and its comments (each with their own
/// votes), as loaded by [`crate::store::ContentStore::post_tree`].
#[derive(Debug, Clone)]
pub struct PostTree {
  pub post:     Post,
  pub sub:      Sub,
  pub votes:    Vec<Vote>,
  pub comments: Vec<CommentNode>,
}

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// A short random identifier of `len` lowercase hex characters (at most 32).
pub fn make_identifier(len: usize) -> String {
  let mut id = Uuid::new_v4().simple().to_string();
  id.truncate(len);
  id
}

/// Derive a URL slug from a title: lowercase ASCII alphanumerics, with every
/// other run of characters collapsed to a single `_`.
pub fn slugify(title: &str) -> String {
  let mut slug = String::with_capacity(title.len());
  let mut pending_sep = false;
  for c in title.chars() {
    if c.is_ascii_alphanumeric() {
      if pending_sep && !slug.is_empty() {
        slug.push('_');
      }
      pending_sep = false;
      slug.push(c.to_ascii_lowercase());
    } else {
      pending_sep = true;
    }
  }
  slug
}
