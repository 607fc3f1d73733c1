//! SQL schema for the Agora SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,     -- argon2 PHC string
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS subs (
    name        TEXT PRIMARY KEY,
    title       TEXT NOT NULL,
    description TEXT,
    image_urn   TEXT,                -- resolved to a URL on read
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS posts (
    post_id    TEXT PRIMARY KEY,
    identifier TEXT NOT NULL,
    slug       TEXT NOT NULL,
    title      TEXT NOT NULL,
    body       TEXT,
    sub_name   TEXT NOT NULL REFERENCES subs(name),
    username   TEXT NOT NULL REFERENCES users(username),
    created_at TEXT NOT NULL,
    UNIQUE (identifier, slug)
);

CREATE TABLE IF NOT EXISTS comments (
    comment_id TEXT PRIMARY KEY,
    identifier TEXT NOT NULL UNIQUE,
    post_id    TEXT NOT NULL REFERENCES posts(post_id) ON DELETE CASCADE,
    body       TEXT NOT NULL,
    username   TEXT NOT NULL REFERENCES users(username),
    created_at TEXT NOT NULL
);

-- One row per (user, post) or (user, comment); exactly one target is set.
-- A retracted vote is deleted, so value is never 0.
CREATE TABLE IF NOT EXISTS votes (
    vote_id    TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL REFERENCES users(user_id),
    post_id    TEXT REFERENCES posts(post_id) ON DELETE CASCADE,
    comment_id TEXT REFERENCES comments(comment_id) ON DELETE CASCADE,
    value      INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    CHECK  (value IN (-1, 1)),
    CHECK  ((post_id IS NULL) != (comment_id IS NULL)),
    UNIQUE (user_id, post_id),
    UNIQUE (user_id, comment_id)
);

CREATE INDEX IF NOT EXISTS posts_sub_idx     ON posts(sub_name);
CREATE INDEX IF NOT EXISTS comments_post_idx ON comments(post_id);
CREATE INDEX IF NOT EXISTS votes_post_idx    ON votes(post_id);
CREATE INDEX IF NOT EXISTS votes_comment_idx ON votes(comment_id);

PRAGMA user_version = 1;
";
