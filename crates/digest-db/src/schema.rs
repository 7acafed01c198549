//! SQLite schema for digest issues and the seen-paper history.

/// Applied on every open; every statement is idempotent.
pub const SCHEMA: &str = r#"
-- One row per weekly issue
CREATE TABLE IF NOT EXISTS digest_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    week_key TEXT NOT NULL UNIQUE,
    generated_at TEXT NOT NULL,
    config_json TEXT NOT NULL,
    rankings_json TEXT NOT NULL DEFAULT '[]'
);

-- Rendered posts, in issue order
CREATE TABLE IF NOT EXISTS posts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    digest_id INTEGER NOT NULL,
    slug TEXT NOT NULL,
    doi TEXT,
    title TEXT NOT NULL,
    post_json TEXT NOT NULL,
    FOREIGN KEY (digest_id) REFERENCES digest_runs(id)
);

CREATE INDEX IF NOT EXISTS idx_posts_digest_id ON posts(digest_id);
CREATE INDEX IF NOT EXISTS idx_posts_slug ON posts(slug);

-- Append-only dedupe history
CREATE TABLE IF NOT EXISTS seen_doi (
    doi TEXT PRIMARY KEY,
    first_seen_week TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS seen_titles (
    norm_title TEXT PRIMARY KEY,
    first_seen_week TEXT NOT NULL
);
"#;

pub const TABLE_DIGEST_RUNS: &str = "digest_runs";
pub const TABLE_POSTS: &str = "posts";
pub const TABLE_SEEN_DOI: &str = "seen_doi";
pub const TABLE_SEEN_TITLES: &str = "seen_titles";
