//! [`SqliteStore`], the SQLite implementation of the Agora store traits.

use std::{collections::HashMap, path::Path};

use agora_core::{
  content::{
    Comment, CommentNode, NewComment, NewPost, Post, PostTree, make_identifier, slugify,
  },
  store::{ContentStore, UserStore, VoteStore},
  sub::{NewSub, Sub, SubPostCount},
  user::{Credentials, NewUser, User},
  vote::{Direction, NewVote, Vote, VoteTarget},
};
use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    COMMENT_COLUMNS, POST_COLUMNS, RawComment, RawCredentials, RawPost, RawSub,
    RawSubCount, RawVote, SUB_COLUMNS, VOTE_COLUMNS, encode_dt, encode_target, encode_uuid,
  },
  schema::SCHEMA,
};

/// Length of generated post identifiers.
const POST_IDENTIFIER_LEN: usize = 7;
/// Length of generated comment identifiers.
const COMMENT_IDENTIFIER_LEN: usize = 8;

// ─── Store ───────────────────────────────────────────────────────────────────

/// An Agora store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All calls
/// run on one connection in submission order, so a read issued after a
/// completed write observes it.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// `true` if `e` is a UNIQUE constraint violation.
fn is_unique_violation(e: &tokio_rusqlite::Error) -> bool {
  matches!(
    e,
    tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(f, _))
      if f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

// ─── VoteStore impl ──────────────────────────────────────────────────────────

impl VoteStore for SqliteStore {
  type Error = Error;

  async fn find_vote(&self, voter: Uuid, target: VoteTarget) -> Result<Option<Vote>> {
    let voter_str = encode_uuid(voter);
    let (post_id, comment_id) = encode_target(target);

    let raw: Option<RawVote> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {VOTE_COLUMNS} FROM votes
                 WHERE user_id = ?1 AND post_id IS ?2 AND comment_id IS ?3"
              ),
              rusqlite::params![voter_str, post_id, comment_id],
              RawVote::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawVote::into_vote).transpose()
  }

  async fn insert_vote(&self, input: NewVote) -> Result<Vote> {
    let now = Utc::now();
    let vote = Vote {
      vote_id:    Uuid::new_v4(),
      user_id:    input.user_id,
      target:     input.target,
      direction:  input.direction,
      created_at: now,
      updated_at: now,
    };

    let vote_id_str = encode_uuid(vote.vote_id);
    let user_id_str = encode_uuid(vote.user_id);
    let (post_id, comment_id) = encode_target(vote.target);
    let value       = vote.direction.value();
    let at_str      = encode_dt(now);

    let inserted = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO votes (
             vote_id, user_id, post_id, comment_id, value, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
          rusqlite::params![vote_id_str, user_id_str, post_id, comment_id, value, at_str],
        )?;
        Ok(())
      })
      .await;

    match inserted {
      Ok(()) => Ok(vote),
      Err(e) if is_unique_violation(&e) => {
        tracing::debug!(user_id = %vote.user_id, target = ?vote.target, "duplicate vote insert");
        Err(Error::DuplicateVote)
      }
      Err(e) => Err(e.into()),
    }
  }

  async fn update_vote(&self, vote_id: Uuid, direction: Direction) -> Result<bool> {
    let id_str = encode_uuid(vote_id);
    let value  = direction.value();
    let at_str = encode_dt(Utc::now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE votes SET value = ?2, updated_at = ?3 WHERE vote_id = ?1",
          rusqlite::params![id_str, value, at_str],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn delete_vote(&self, vote_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(vote_id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM votes WHERE vote_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }
}

// ─── ContentStore impl ───────────────────────────────────────────────────────

/// Everything [`ContentStore::post_tree`] reads, before decoding.
struct RawTree {
  post:          RawPost,
  sub:           RawSub,
  post_votes:    Vec<RawVote>,
  comments:      Vec<RawComment>,
  comment_votes: Vec<RawVote>,
}

impl ContentStore for SqliteStore {
  type Error = Error;

  // ── Lookups ───────────────────────────────────────────────────────────────

  async fn find_post(&self, identifier: &str, slug: &str) -> Result<Option<Post>> {
    let identifier = identifier.to_owned();
    let slug       = slug.to_owned();

    let raw: Option<RawPost> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {POST_COLUMNS} FROM posts WHERE identifier = ?1 AND slug = ?2"),
              rusqlite::params![identifier, slug],
              RawPost::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPost::into_post).transpose()
  }

  async fn find_comment(&self, post_id: Uuid, identifier: &str) -> Result<Option<Comment>> {
    let post_id_str = encode_uuid(post_id);
    let identifier  = identifier.to_owned();

    let raw: Option<RawComment> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {COMMENT_COLUMNS} FROM comments WHERE post_id = ?1 AND identifier = ?2"
              ),
              rusqlite::params![post_id_str, identifier],
              RawComment::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawComment::into_comment).transpose()
  }

  async fn post_tree(&self, post_id: Uuid) -> Result<Option<PostTree>> {
    let post_id_str = encode_uuid(post_id);

    // One transaction so the post, its comments and all votes come from the
    // same snapshot.
    let raw: Option<RawTree> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let post = tx
          .query_row(
            &format!("SELECT {POST_COLUMNS} FROM posts WHERE post_id = ?1"),
            rusqlite::params![post_id_str],
            RawPost::from_row,
          )
          .optional()?;
        let Some(post) = post else {
          return Ok(None);
        };

        let sub = tx.query_row(
          &format!("SELECT {SUB_COLUMNS} FROM subs WHERE name = ?1"),
          rusqlite::params![post.sub_name],
          RawSub::from_row,
        )?;

        let post_votes = {
          let mut stmt =
            tx.prepare(&format!("SELECT {VOTE_COLUMNS} FROM votes WHERE post_id = ?1"))?;
          stmt
            .query_map(rusqlite::params![post_id_str], RawVote::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };

        let comments = {
          let mut stmt = tx.prepare(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments
             WHERE post_id = ?1
             ORDER BY created_at DESC"
          ))?;
          stmt
            .query_map(rusqlite::params![post_id_str], RawComment::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };

        let comment_votes = {
          let mut stmt = tx.prepare(
            "SELECT v.vote_id, v.user_id, v.post_id, v.comment_id,
                    v.value, v.created_at, v.updated_at
             FROM votes v
             JOIN comments c ON c.comment_id = v.comment_id
             WHERE c.post_id = ?1",
          )?;
          stmt
            .query_map(rusqlite::params![post_id_str], RawVote::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };

        tx.commit()?;
        Ok(Some(RawTree { post, sub, post_votes, comments, comment_votes }))
      })
      .await?;

    let Some(raw) = raw else {
      return Ok(None);
    };

    let post = raw.post.into_post()?;
    let sub = raw.sub.into_sub()?;
    let votes = raw
      .post_votes
      .into_iter()
      .map(RawVote::into_vote)
      .collect::<Result<Vec<_>>>()?;

    let mut by_comment: HashMap<Uuid, Vec<Vote>> = HashMap::new();
    for rv in raw.comment_votes {
      let vote = rv.into_vote()?;
      if let VoteTarget::Comment(id) = vote.target {
        by_comment.entry(id).or_default().push(vote);
      }
    }

    let comments = raw
      .comments
      .into_iter()
      .map(|rc| {
        let comment = rc.into_comment()?;
        let votes = by_comment.remove(&comment.comment_id).unwrap_or_default();
        Ok(CommentNode { comment, votes })
      })
      .collect::<Result<Vec<_>>>()?;

    Ok(Some(PostTree { post, sub, votes, comments }))
  }

  async fn sub_post_counts(&self) -> Result<Vec<SubPostCount>> {
    let raws: Vec<RawSubCount> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT s.name, s.title, s.description, s.image_urn, s.created_at,
                  COUNT(p.post_id) AS post_count
           FROM subs s
           LEFT JOIN posts p ON p.sub_name = s.name
           GROUP BY s.name",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawSubCount {
              name:        row.get(0)?,
              title:       row.get(1)?,
              description: row.get(2)?,
              image_urn:   row.get(3)?,
              created_at:  row.get(4)?,
              post_count:  row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|raw| {
        let (sub, post_count) = raw.into_sub()?;
        Ok(SubPostCount { sub, post_count })
      })
      .collect()
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn create_sub(&self, input: NewSub) -> Result<Sub> {
    let sub = Sub {
      name:        input.name,
      title:       input.title,
      description: input.description,
      image_urn:   input.image_urn,
      created_at:  Utc::now(),
    };

    let name        = sub.name.clone();
    let title       = sub.title.clone();
    let description = sub.description.clone();
    let image_urn   = sub.image_urn.clone();
    let at_str      = encode_dt(sub.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO subs (name, title, description, image_urn, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![name, title, description, image_urn, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(sub)
  }

  async fn create_post(&self, input: NewPost) -> Result<Post> {
    let post = Post {
      post_id:    Uuid::new_v4(),
      identifier: make_identifier(POST_IDENTIFIER_LEN),
      slug:       slugify(&input.title),
      title:      input.title,
      body:       input.body,
      sub_name:   input.sub_name,
      username:   input.username,
      created_at: Utc::now(),
    };

    let post_id_str = encode_uuid(post.post_id);
    let identifier  = post.identifier.clone();
    let slug        = post.slug.clone();
    let title       = post.title.clone();
    let body        = post.body.clone();
    let sub_name    = post.sub_name.clone();
    let username    = post.username.clone();
    let at_str      = encode_dt(post.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO posts (
             post_id, identifier, slug, title, body, sub_name, username, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            post_id_str, identifier, slug, title, body, sub_name, username, at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(post)
  }

  async fn create_comment(&self, input: NewComment) -> Result<Comment> {
    let comment = Comment {
      comment_id: Uuid::new_v4(),
      identifier: make_identifier(COMMENT_IDENTIFIER_LEN),
      post_id:    input.post_id,
      body:       input.body,
      username:   input.username,
      created_at: Utc::now(),
    };

    let comment_id_str = encode_uuid(comment.comment_id);
    let identifier     = comment.identifier.clone();
    let post_id_str    = encode_uuid(comment.post_id);
    let body           = comment.body.clone();
    let username       = comment.username.clone();
    let at_str         = encode_dt(comment.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO comments (comment_id, identifier, post_id, body, username, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![comment_id_str, identifier, post_id_str, body, username, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(comment)
  }
}

// ─── UserStore impl ──────────────────────────────────────────────────────────

impl UserStore for SqliteStore {
  type Error = Error;

  async fn create_user(&self, input: NewUser) -> Result<User> {
    let user = User {
      user_id:    Uuid::new_v4(),
      username:   input.username,
      created_at: Utc::now(),
    };

    let id_str   = encode_uuid(user.user_id);
    let username = user.username.clone();
    let at_str   = encode_dt(user.created_at);
    let hash     = input.password_hash;

    let inserted = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (user_id, username, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, username, hash, at_str],
        )?;
        Ok(())
      })
      .await;

    match inserted {
      Ok(()) => Ok(user),
      Err(e) if is_unique_violation(&e) => Err(Error::UsernameTaken(user.username)),
      Err(e) => Err(e.into()),
    }
  }

  async fn find_credentials(&self, username: &str) -> Result<Option<Credentials>> {
    let username = username.to_owned();

    let raw: Option<RawCredentials> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, username, password_hash, created_at
               FROM users WHERE username = ?1",
              rusqlite::params![username],
              |row| {
                Ok(RawCredentials {
                  user_id:       row.get(0)?,
                  username:      row.get(1)?,
                  password_hash: row.get(2)?,
                  created_at:    row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCredentials::into_credentials).transpose()
  }
}
