//! Top-subs ranking by post count.

use std::{cmp::Ordering, sync::Arc};

use crate::{
  Error, Result,
  store::ContentStore,
  sub::{Sub, SubPostCount, SubSummary},
};

/// Number of entries returned when the caller gives no limit.
pub const DEFAULT_LIMIT: usize = 5;

/// Shown for subs without a stored image. The all-zero hash makes the avatar
/// service return the same generic image for every such sub.
pub const PLACEHOLDER_IMAGE_URL: &str =
  "https://www.gravatar.com/avatar/00000000000000000000000000000000?d=mp&f=y";

// ─── Image resolution ────────────────────────────────────────────────────────

/// Resolves a sub's stored image reference to a fully-qualified URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageResolver {
  base_url:    String,
  placeholder: String,
}

impl ImageResolver {
  /// Images resolve to `{base_url}/images/{image_urn}`.
  pub fn new(base_url: impl Into<String>) -> Self {
    let mut base_url = base_url.into();
    while base_url.ends_with('/') {
      base_url.pop();
    }
    Self { base_url, placeholder: PLACEHOLDER_IMAGE_URL.to_owned() }
  }

  pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
    self.placeholder = placeholder.into();
    self
  }

  pub fn resolve(&self, sub: &Sub) -> String {
    match &sub.image_urn {
      Some(urn) => format!("{}/images/{urn}", self.base_url),
      None => self.placeholder.clone(),
    }
  }
}

// ─── Query ───────────────────────────────────────────────────────────────────

/// Ranks subs by how many posts they own.
pub struct SubRankingQuery<C> {
  content: Arc<C>,
  images:  ImageResolver,
}

impl<C> Clone for SubRankingQuery<C> {
  fn clone(&self) -> Self {
    Self { content: Arc::clone(&self.content), images: self.images.clone() }
  }
}

impl<C: ContentStore> SubRankingQuery<C> {
  pub fn new(content: Arc<C>, images: ImageResolver) -> Self {
    Self { content, images }
  }

  /// The `limit` subs with the most posts, most first. Equal counts are
  /// ordered by sub name ascending.
  pub async fn top_subs(&self, limit: usize) -> Result<Vec<SubSummary>> {
    let counts = self
      .content
      .sub_post_counts()
      .await
      .map_err(Error::from_store)?;
    Ok(rank(counts, limit, &self.images))
  }
}

fn by_rank(a: &SubPostCount, b: &SubPostCount) -> Ordering {
  b.post_count
    .cmp(&a.post_count)
    .then_with(|| a.sub.name.cmp(&b.sub.name))
}

/// Order, truncate and resolve images. Separate from the query so it can be
/// checked without a store.
pub fn rank(
  mut counts: Vec<SubPostCount>,
  limit: usize,
  images: &ImageResolver,
) -> Vec<SubSummary> {
  counts.sort_by(by_rank);
  counts
    .into_iter()
    .take(limit)
    .map(|SubPostCount { sub, post_count }| SubSummary {
      image_url: images.resolve(&sub),
      title: sub.title,
      name: sub.name,
      post_count,
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::{
    content::NewPost,
    memory::MemoryStore,
    store::ContentStore as _,
    sub::NewSub,
  };

  fn sub(name: &str, image_urn: Option<&str>) -> Sub {
    Sub {
      name:        name.into(),
      title:       name.to_uppercase(),
      description: None,
      image_urn:   image_urn.map(Into::into),
      created_at:  Utc::now(),
    }
  }

  fn images() -> ImageResolver { ImageResolver::new("https://agora.test/") }

  #[test]
  fn resolves_stored_image_against_base_url() {
    let url = images().resolve(&sub("music", Some("abc.png")));
    assert_eq!(url, "https://agora.test/images/abc.png");
  }

  #[test]
  fn falls_back_to_placeholder() {
    assert_eq!(images().resolve(&sub("music", None)), PLACEHOLDER_IMAGE_URL);
    let custom = images().with_placeholder("https://cdn.test/default.png");
    assert_eq!(custom.resolve(&sub("music", None)), "https://cdn.test/default.png");
  }

  #[test]
  fn ties_break_by_name() {
    let counts = vec![
      SubPostCount { sub: sub("zebra", None), post_count: 2 },
      SubPostCount { sub: sub("apple", None), post_count: 2 },
      SubPostCount { sub: sub("mango", None), post_count: 7 },
    ];
    let names: Vec<_> = rank(counts, 10, &images())
      .into_iter()
      .map(|s| s.name)
      .collect();
    assert_eq!(names, ["mango", "apple", "zebra"]);
  }

  #[test]
  fn truncates_to_limit() {
    let counts = (0..8)
      .map(|i| SubPostCount { sub: sub(&format!("s{i}"), None), post_count: i })
      .collect();
    let ranked = rank(counts, DEFAULT_LIMIT, &images());
    assert_eq!(ranked.len(), 5);
    assert_eq!(ranked[0].post_count, 7);
    assert_eq!(ranked[4].post_count, 3);
  }

  #[tokio::test]
  async fn ranks_subs_from_store() {
    let store = Arc::new(MemoryStore::default());
    for (name, image) in [("programming", Some("prog.png")), ("music", None), ("empty", None)] {
      store
        .create_sub(NewSub {
          name:        name.into(),
          title:       format!("{name} title"),
          description: None,
          image_urn:   image.map(Into::into),
        })
        .await
        .unwrap();
    }
    for (sub_name, n) in [("programming", 3), ("music", 1)] {
      for i in 0..n {
        store
          .create_post(NewPost {
            title:    format!("post {i}"),
            body:     None,
            sub_name: sub_name.into(),
            username: "alice".into(),
          })
          .await
          .unwrap();
      }
    }

    let query = SubRankingQuery::new(Arc::clone(&store), images());
    let top = query.top_subs(5).await.unwrap();

    let ranked: Vec<_> = top.iter().map(|s| (s.name.as_str(), s.post_count)).collect();
    assert_eq!(ranked, [("programming", 3), ("music", 1), ("empty", 0)]);
    assert_eq!(top[0].image_url, "https://agora.test/images/prog.png");
    assert_eq!(top[0].title, "programming title");
    assert_eq!(top[1].image_url, PLACEHOLDER_IMAGE_URL);
    assert_eq!(top[2].image_url, PLACEHOLDER_IMAGE_URL);
  }
}
