use chrono::{DateTime, FixedOffset, Utc};
use std::collections::BTreeMap;
use thiserror::Error;

mod config;

pub use config::{Config, ReadmeConfig, RenderConfig};

// ── Error ─────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum TilError {
    #[cfg(feature = "rusqlite-errors")]
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),
    #[error("ingest error: {0}")]
    Ingest(String),
    #[cfg(feature = "git2-errors")]
    #[error("git error: {0}")]
    Git(#[from] git2::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("no commit history for {0}")]
    MissingTimestamps(String),
    #[error("could not render {path}: {source}")]
    Render {
        path: String,
        #[source]
        source: RenderFailure,
    },
    #[error("invalid pattern: {0}")]
    Pattern(String),
    #[error("store lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, TilError>;

/// Returned by a [`Renderer`] once every attempt has been used up.
#[derive(Debug, Clone, Error)]
#[error("gave up after {attempts} attempt(s), last response was {last}")]
pub struct RenderFailure {
    pub attempts: u32,
    /// Status line and headers of the last response, or the transport error.
    pub last: String,
}

// ── Domain types ──────────────────────────────────────────────────────────

/// A commit as seen by the history scanner: when it happened and which
/// paths it touched relative to its first parent.
#[derive(Debug, Clone)]
pub struct Commit {
    pub sha: String,
    pub time: DateTime<FixedOffset>,
    pub paths: Vec<String>,
}

/// First-seen and last-seen commit times of a single path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileTimestamps {
    pub created: DateTime<FixedOffset>,
    pub updated: DateTime<FixedOffset>,
}

impl FileTimestamps {
    pub fn first_seen(at: DateTime<FixedOffset>) -> Self {
        Self {
            created: at,
            updated: at,
        }
    }

    pub fn touch(&mut self, at: DateTime<FixedOffset>) {
        self.updated = at;
    }

    pub fn created_iso(&self) -> String {
        self.created.to_rfc3339()
    }

    pub fn created_utc_iso(&self) -> String {
        self.created.with_timezone(&Utc).to_rfc3339()
    }

    pub fn updated_iso(&self) -> String {
        self.updated.to_rfc3339()
    }

    pub fn updated_utc_iso(&self) -> String {
        self.updated.with_timezone(&Utc).to_rfc3339()
    }
}

/// Repository-relative path (always `/`-separated) to its timestamps.
pub type History = BTreeMap<String, FileTimestamps>;

/// One row of the `til` table.
///
/// `html` is `None` until the body has been rendered; the timestamp columns
/// are `None` for notes the history scanner never saw.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NoteRecord {
    pub path: String,
    pub slug: String,
    pub topic: String,
    pub title: String,
    pub url: String,
    pub body: String,
    pub html: Option<String>,
    pub created: Option<String>,
    pub created_utc: Option<String>,
    pub updated: Option<String>,
    pub updated_utc: Option<String>,
}

impl NoteRecord {
    /// Every column a record writes, in table order.
    pub const COLUMNS: &'static [&'static str] = &[
        "path",
        "slug",
        "topic",
        "title",
        "url",
        "body",
        "html",
        "created",
        "created_utc",
        "updated",
        "updated_utc",
    ];

    /// Flattens a `topic/slug.md` path into the table key `topic_slug.md`.
    pub fn key_for(relative_path: &str) -> String {
        relative_path.replace('/', "_")
    }

    /// True when the stored row cannot be reused: the body changed or the
    /// stored html is missing or empty.
    pub fn needs_render(&self, previous: Option<&NoteRecord>) -> bool {
        match previous {
            None => true,
            Some(prev) => {
                prev.body != self.body || prev.html.as_deref().map_or(true, str::is_empty)
            }
        }
    }

    pub fn merge_timestamps(&mut self, times: &FileTimestamps) {
        self.created = Some(times.created_iso());
        self.created_utc = Some(times.created_utc_iso());
        self.updated = Some(times.updated_iso());
        self.updated_utc = Some(times.updated_utc_iso());
    }

    /// Local creation date (`YYYY-MM-DD`) used in the summary bullets.
    pub fn created_date(&self) -> Option<&str> {
        self.created
            .as_deref()
            .map(|c| c.split('T').next().unwrap_or(c))
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct SearchHit {
    pub path: String,
    pub title: String,
    pub url: String,
    pub snippet: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct StoreStats {
    pub note_count: usize,
    pub topic_count: usize,
    pub last_updated_utc: Option<String>,
    pub fts_enabled: bool,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct BuildSummary {
    pub notes_seen: usize,
    pub notes_rendered: usize,
    pub notes_unchanged: usize,
    pub notes_untracked: usize,
}

// ── Core traits ───────────────────────────────────────────────────────────

pub trait Store: Send + Sync {
    // Index writes
    fn get_note(&self, path: &str) -> Result<Option<NoteRecord>>;
    /// Insert or update one record in its own transaction. `None` columns
    /// leave any stored value untouched.
    fn upsert_note(&self, note: &NoteRecord) -> Result<()>;
    /// Drop and recreate the full-text index over title and body.
    fn enable_fts(&self) -> Result<()>;

    // Reads
    fn notes_by_created(&self) -> Result<Vec<NoteRecord>>;
    fn count_notes(&self) -> Result<usize>;
    fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>>;
    fn stats(&self) -> Result<StoreStats>;
}

pub trait Renderer: Send + Sync {
    fn render(&self, text: &str) -> std::result::Result<String, RenderFailure>;
}

// ── Tests ─────────────────────────────────────────────────────────────────
