//! Digest store: weekly issues, their posts and the seen-paper history.
//!
//! `rusqlite::Connection` is neither `Send` nor `Sync`, so the connection
//! lives behind `Arc<Mutex<_>>` and every call runs on the blocking pool.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use serde_json::Value;
use tokio::task::spawn_blocking;
use tracing::{debug, info, warn};

use digest_common::text::{normalize_doi, normalize_title};
use digest_common::{DigestConfig, DigestPost, SeenHistory};

use crate::error::Result;
use crate::schema::{self, SCHEMA};
use crate::slug::{slugify, SlugAllocator};

/// Summary row for the archive listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DigestRun {
    pub week_key: String,
    pub generated_at: String,
    pub post_count: usize,
}

/// A stored issue with its posts in issue order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredDigest {
    pub week_key: String,
    pub generated_at: String,
    pub posts: Vec<DigestPost>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreStats {
    pub digest_runs: u64,
    pub posts: u64,
    pub seen_dois: u64,
    pub seen_titles: u64,
}

#[derive(Clone)]
pub struct DigestStore {
    conn: Arc<Mutex<Connection>>,
    path: PathBuf,
}

impl DigestStore {
    /// Open or create the database file and apply the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path)?;
        Self::init(conn, path)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, PathBuf::from(":memory:"))
    }

    fn init(conn: Connection, path: PathBuf) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        debug!(path = %path.display(), "Digest store ready");
        Ok(Self { conn: Arc::new(Mutex::new(conn)), path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        let path = self.path.clone();
        spawn_blocking(move || {
            let mut guard = lock_recovering(&conn, &path);
            f(&mut guard)
        })
        .await?
    }

    // ── History ──────────────────────────────────────────────────────────────

    pub async fn seen_history(&self) -> Result<SeenHistory> {
        self.with_conn(|conn| {
            let mut history = SeenHistory::new();

            let mut stmt = conn.prepare("SELECT doi FROM seen_doi")?;
            for doi in stmt.query_map([], |row| row.get::<_, String>(0))? {
                if let Some(doi) = normalize_doi(&doi?) {
                    history.dois.insert(doi);
                }
            }

            let mut stmt = conn.prepare("SELECT norm_title FROM seen_titles")?;
            for title in stmt.query_map([], |row| row.get::<_, String>(0))? {
                let title = title?;
                if !title.is_empty() {
                    history.titles.insert(title);
                }
            }
            Ok(history)
        })
        .await
    }

    // ── Issues ───────────────────────────────────────────────────────────────

    pub async fn digest_for_week(&self, week_key: &str) -> Result<Option<Vec<DigestPost>>> {
        let week_key = week_key.to_string();
        self.with_conn(move |conn| {
            let run_id: Option<i64> = conn
                .query_row("SELECT id FROM digest_runs WHERE week_key = ?1", params![week_key], |row| row.get(0))
                .optional()?;
            match run_id {
                Some(id) => Ok(Some(posts_for_run(conn, id)?)),
                None     => Ok(None),
            }
        })
        .await
    }

    /// Most recently generated issue.
    pub async fn latest_digest(&self) -> Result<Option<StoredDigest>> {
        self.with_conn(|conn| {
            let run = conn
                .query_row(
                    "SELECT id, week_key, generated_at FROM digest_runs ORDER BY generated_at DESC, id DESC LIMIT 1",
                    [],
                    |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?)),
                )
                .optional()?;
            match run {
                Some((id, week_key, generated_at)) => Ok(Some(StoredDigest {
                    week_key,
                    generated_at,
                    posts: posts_for_run(conn, id)?,
                })),
                None => Ok(None),
            }
        })
        .await
    }

    /// Newest post with this slug across all issues.
    pub async fn post_by_slug(&self, slug: &str) -> Result<Option<DigestPost>> {
        let slug = slug.to_string();
        self.with_conn(move |conn| {
            let json: Option<String> = conn
                .query_row(
                    "SELECT post_json FROM posts WHERE slug = ?1 ORDER BY id DESC LIMIT 1",
                    params![slug],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(json.map(|j| serde_json::from_str(&j)).transpose()?)
        })
        .await
    }

    pub async fn rankings_for_week(&self, week_key: &str) -> Result<Option<Vec<Value>>> {
        let week_key = week_key.to_string();
        self.with_conn(move |conn| {
            let json: Option<String> = conn
                .query_row(
                    "SELECT rankings_json FROM digest_runs WHERE week_key = ?1",
                    params![week_key],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(json.map(|j| serde_json::from_str(&j)).transpose()?)
        })
        .await
    }

    /// Every stored issue, newest week first.
    pub async fn list_runs(&self) -> Result<Vec<DigestRun>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT r.week_key, r.generated_at, COUNT(p.id)
                 FROM digest_runs r LEFT JOIN posts p ON p.digest_id = r.id
                 GROUP BY r.id
                 ORDER BY r.week_key DESC",
            )?;
            let runs = stmt
                .query_map([], |row| {
                    Ok(DigestRun {
                        week_key:     row.get(0)?,
                        generated_at: row.get(1)?,
                        post_count:   row.get::<_, i64>(2)? as usize,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(runs)
        })
        .await
    }

    /// Store an issue, replacing any earlier issue for the same week.
    ///
    /// Posts get slugs unique within the issue and their DOIs and normalised
    /// titles join the seen history. Returns the posts with slugs assigned.
    pub async fn save_week_digest(
        &self,
        week_key: &str,
        config: &DigestConfig,
        rankings: &[Value],
        posts: &[DigestPost],
    ) -> Result<Vec<DigestPost>> {
        let week_key = week_key.to_string();
        let config_json = serde_json::to_string(config)?;
        let rankings_json = serde_json::to_string(rankings)?;
        let posts = posts.to_vec();
        let generated_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

        let saved = self
            .with_conn(move |conn| {
                let tx = conn.transaction()?;

                let existing: Option<i64> = tx
                    .query_row("SELECT id FROM digest_runs WHERE week_key = ?1", params![week_key], |row| row.get(0))
                    .optional()?;
                let digest_id = match existing {
                    Some(id) => {
                        tx.execute(
                            "UPDATE digest_runs SET generated_at = ?1, config_json = ?2, rankings_json = ?3 WHERE id = ?4",
                            params![generated_at, config_json, rankings_json, id],
                        )?;
                        tx.execute("DELETE FROM posts WHERE digest_id = ?1", params![id])?;
                        id
                    }
                    None => {
                        tx.execute(
                            "INSERT INTO digest_runs (week_key, generated_at, config_json, rankings_json) VALUES (?1, ?2, ?3, ?4)",
                            params![week_key, generated_at, config_json, rankings_json],
                        )?;
                        tx.last_insert_rowid()
                    }
                };

                let mut slugs = SlugAllocator::default();
                let mut saved = Vec::with_capacity(posts.len());
                for (idx, mut post) in posts.into_iter().enumerate() {
                    let base = if post.paper_title.trim().is_empty() {
                        format!("post-{}", idx + 1)
                    } else {
                        slugify(&post.paper_title)
                    };
                    let slug = slugs.allocate(&base);
                    post.slug = Some(slug.clone());

                    let doi = post.doi.as_deref().and_then(normalize_doi);
                    let title = if post.paper_title.trim().is_empty() { "Untitled" } else { post.paper_title.as_str() };

                    tx.execute(
                        "INSERT INTO posts (digest_id, slug, doi, title, post_json) VALUES (?1, ?2, ?3, ?4, ?5)",
                        params![digest_id, slug, doi, title, serde_json::to_string(&post)?],
                    )?;

                    if let Some(doi) = &doi {
                        tx.execute(
                            "INSERT OR IGNORE INTO seen_doi (doi, first_seen_week) VALUES (?1, ?2)",
                            params![doi, week_key],
                        )?;
                    }
                    let norm_title = normalize_title(title);
                    if !norm_title.is_empty() {
                        tx.execute(
                            "INSERT OR IGNORE INTO seen_titles (norm_title, first_seen_week) VALUES (?1, ?2)",
                            params![norm_title, week_key],
                        )?;
                    }
                    saved.push(post);
                }

                tx.commit()?;
                Ok(saved)
            })
            .await?;

        info!(posts = saved.len(), "Saved weekly digest");
        Ok(saved)
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        self.with_conn(|conn| {
            let count = |table: &str| -> Result<u64> {
                let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
                Ok(n as u64)
            };
            Ok(StoreStats {
                digest_runs: count(schema::TABLE_DIGEST_RUNS)?,
                posts:       count(schema::TABLE_POSTS)?,
                seen_dois:   count(schema::TABLE_SEEN_DOI)?,
                seen_titles: count(schema::TABLE_SEEN_TITLES)?,
            })
        })
        .await
    }
}

fn posts_for_run(conn: &Connection, digest_id: i64) -> Result<Vec<DigestPost>> {
    let mut stmt = conn.prepare("SELECT post_json FROM posts WHERE digest_id = ?1 ORDER BY id ASC")?;
    let rows = stmt
        .query_map(params![digest_id], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let mut posts = Vec::with_capacity(rows.len());
    for json in rows {
        posts.push(serde_json::from_str(&json)?);
    }
    Ok(posts)
}

/// Lock the connection, recovering from a poisoned mutex. A transaction left
/// open by the panicking holder is rolled back.
fn lock_recovering<'a>(conn: &'a Mutex<Connection>, path: &Path) -> MutexGuard<'a, Connection> {
    conn.lock().unwrap_or_else(|poisoned| {
        warn!(path = %path.display(), "Mutex poisoned, recovering");
        let inner = poisoned.into_inner();
        if !inner.is_autocommit() {
            if let Err(e) = inner.execute_batch("ROLLBACK") {
                tracing::error!(path = %path.display(), error = %e, "ROLLBACK failed after mutex poisoning");
            }
        }
        inner
    })
}
