//! Votes: a user's up/down verdict on exactly one post or comment.
//!
//! A stored vote always carries a [`Direction`]; there is no zero row. "No
//! vote" is the absence of a row, and is represented in Rust as `None`
//! wherever an `Option<Direction>` appears.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Direction ───────────────────────────────────────────────────────────────

/// The persisted value of a vote: `+1` or `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
  Up,
  Down,
}

impl Direction {
  /// The signed value this direction contributes to a score.
  pub fn value(self) -> i64 {
    match self {
      Self::Up => 1,
      Self::Down => -1,
    }
  }

  /// Parse a requested vote value.
  ///
  /// `-1` and `1` map to a direction, `0` maps to `None` (retract), and any
  /// other value is rejected with [`Error::InvalidVoteValue`].
  pub fn parse_requested(value: i64) -> Result<Option<Self>> {
    match value {
      1 => Ok(Some(Self::Up)),
      -1 => Ok(Some(Self::Down)),
      0 => Ok(None),
      other => Err(Error::InvalidVoteValue(other.to_string())),
    }
  }

  /// Parse a requested vote value straight from a request body.
  ///
  /// Anything but the numbers `-1`, `0` and `1` is rejected, including a
  /// missing value, `null`, strings and non-integral numbers. Integral floats
  /// such as `1.0` are accepted.
  pub fn parse_json(value: Option<&serde_json::Value>) -> Result<Option<Self>> {
    let invalid = || {
      Error::InvalidVoteValue(value.map_or_else(|| "missing".to_owned(), ToString::to_string))
    };
    let number = value
      .and_then(|v| {
        v.as_i64().or_else(|| {
          v.as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() <= 1.0)
            .map(|f| f as i64)
        })
      })
      .ok_or_else(invalid)?;
    Self::parse_requested(number)
  }

  /// Decode a stored value. Only `1` and `-1` are valid in storage.
  pub fn from_stored(value: i64) -> Option<Self> {
    match value {
      1 => Some(Self::Up),
      -1 => Some(Self::Down),
      _ => None,
    }
  }
}

impl Serialize for Direction {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_i64(self.value())
  }
}

impl<'de> Deserialize<'de> for Direction {
  fn deserialize<D: serde::Deserializer<'de>>(
    deserializer: D,
  ) -> Result<Self, D::Error> {
    let value = i64::deserialize(deserializer)?;
    Self::from_stored(value).ok_or_else(|| {
      serde::de::Error::custom(format!("invalid vote direction {value}"))
    })
  }
}

/// Serialise a user's vote, writing the no-vote sentinel as `0`.
pub fn serialize_user_vote<S: Serializer>(
  vote: &Option<Direction>,
  serializer: S,
) -> Result<S::Ok, S::Error> {
  serializer.serialize_i64(vote.map_or(0, Direction::value))
}

// ─── Target ──────────────────────────────────────────────────────────────────

/// What a vote applies to. Exactly one of a post or a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum VoteTarget {
  Post(Uuid),
  Comment(Uuid),
}

// ─── Vote ────────────────────────────────────────────────────────────────────

/// A persisted vote row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
  pub vote_id:    Uuid,
  pub user_id:    Uuid,
  pub target:     VoteTarget,
  pub direction:  Direction,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Input to [`crate::store::VoteStore::insert_vote`].
#[derive(Debug, Clone, Copy)]
pub struct NewVote {
  pub user_id:   Uuid,
  pub target:    VoteTarget,
  pub direction: Direction,
}
