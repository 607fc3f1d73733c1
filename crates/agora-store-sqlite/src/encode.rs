//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, UUIDs hyphenated lowercase strings. A
//! vote's target is split across the nullable `post_id` / `comment_id`
//! columns.

use agora_core::{
  content::{Comment, Post},
  sub::Sub,
  user::{Credentials, User},
  vote::{Direction, Vote, VoteTarget},
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_direction(value: i64) -> Result<Direction> {
  Direction::from_stored(value)
    .ok_or_else(|| Error::Corrupt(format!("vote value {value}")))
}

/// Split a target into its `(post_id, comment_id)` column values.
pub fn encode_target(target: VoteTarget) -> (Option<String>, Option<String>) {
  match target {
    VoteTarget::Post(id) => (Some(encode_uuid(id)), None),
    VoteTarget::Comment(id) => (None, Some(encode_uuid(id))),
  }
}

pub fn decode_target(
  post_id: Option<&str>,
  comment_id: Option<&str>,
) -> Result<VoteTarget> {
  match (post_id, comment_id) {
    (Some(p), None) => Ok(VoteTarget::Post(decode_uuid(p)?)),
    (None, Some(c)) => Ok(VoteTarget::Comment(decode_uuid(c)?)),
    _ => Err(Error::Corrupt("vote must target exactly one of post or comment".into())),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const VOTE_COLUMNS: &str =
  "vote_id, user_id, post_id, comment_id, value, created_at, updated_at";

/// Raw values read directly from a `votes` row.
pub struct RawVote {
  pub vote_id:    String,
  pub user_id:    String,
  pub post_id:    Option<String>,
  pub comment_id: Option<String>,
  pub value:      i64,
  pub created_at: String,
  pub updated_at: String,
}

impl RawVote {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      vote_id:    row.get(0)?,
      user_id:    row.get(1)?,
      post_id:    row.get(2)?,
      comment_id: row.get(3)?,
      value:      row.get(4)?,
      created_at: row.get(5)?,
      updated_at: row.get(6)?,
    })
  }

  pub fn into_vote(self) -> Result<Vote> {
    Ok(Vote {
      vote_id:    decode_uuid(&self.vote_id)?,
      user_id:    decode_uuid(&self.user_id)?,
      target:     decode_target(self.post_id.as_deref(), self.comment_id.as_deref())?,
      direction:  decode_direction(self.value)?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

pub const POST_COLUMNS: &str =
  "post_id, identifier, slug, title, body, sub_name, username, created_at";

pub struct RawPost {
  pub post_id:    String,
  pub identifier: String,
  pub slug:       String,
  pub title:      String,
  pub body:       Option<String>,
  pub sub_name:   String,
  pub username:   String,
  pub created_at: String,
}

impl RawPost {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      post_id:    row.get(0)?,
      identifier: row.get(1)?,
      slug:       row.get(2)?,
      title:      row.get(3)?,
      body:       row.get(4)?,
      sub_name:   row.get(5)?,
      username:   row.get(6)?,
      created_at: row.get(7)?,
    })
  }

  pub fn into_post(self) -> Result<Post> {
    Ok(Post {
      post_id:    decode_uuid(&self.post_id)?,
      identifier: self.identifier,
      slug:       self.slug,
      title:      self.title,
      body:       self.body,
      sub_name:   self.sub_name,
      username:   self.username,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const COMMENT_COLUMNS: &str =
  "comment_id, identifier, post_id, body, username, created_at";

pub struct RawComment {
  pub comment_id: String,
  pub identifier: String,
  pub post_id:    String,
  pub body:       String,
  pub username:   String,
  pub created_at: String,
}

impl RawComment {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      comment_id: row.get(0)?,
      identifier: row.get(1)?,
      post_id:    row.get(2)?,
      body:       row.get(3)?,
      username:   row.get(4)?,
      created_at: row.get(5)?,
    })
  }

  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      comment_id: decode_uuid(&self.comment_id)?,
      identifier: self.identifier,
      post_id:    decode_uuid(&self.post_id)?,
      body:       self.body,
      username:   self.username,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const SUB_COLUMNS: &str = "name, title, description, image_urn, created_at";

pub struct RawSub {
  pub name:        String,
  pub title:       String,
  pub description: Option<String>,
  pub image_urn:   Option<String>,
  pub created_at:  String,
}

impl RawSub {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      name:        row.get(0)?,
      title:       row.get(1)?,
      description: row.get(2)?,
      image_urn:   row.get(3)?,
      created_at:  row.get(4)?,
    })
  }

  pub fn into_sub(self) -> Result<Sub> {
    Ok(Sub {
      name:        self.name,
      title:       self.title,
      description: self.description,
      image_urn:   self.image_urn,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// A `subs` row plus the post count from the ranking join.
pub struct RawSubCount {
  pub name:        String,
  pub title:       String,
  pub description: Option<String>,
  pub image_urn:   Option<String>,
  pub created_at:  String,
  pub post_count:  i64,
}

impl RawSubCount {
  pub fn into_sub(self) -> Result<(Sub, u64)> {
    let post_count = u64::try_from(self.post_count)
      .map_err(|_| Error::Corrupt(format!("post count {}", self.post_count)))?;
    let sub = Sub {
      name:        self.name,
      title:       self.title,
      description: self.description,
      image_urn:   self.image_urn,
      created_at:  decode_dt(&self.created_at)?,
    };
    Ok((sub, post_count))
  }
}

pub struct RawCredentials {
  pub user_id:       String,
  pub username:      String,
  pub password_hash: String,
  pub created_at:    String,
}

impl RawCredentials {
  pub fn into_credentials(self) -> Result<Credentials> {
    Ok(Credentials {
      user:          User {
        user_id:    decode_uuid(&self.user_id)?,
        username:   self.username,
        created_at: decode_dt(&self.created_at)?,
      },
      password_hash: self.password_hash,
    })
  }
}
