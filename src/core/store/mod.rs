//! Local learner store backed by SQLite.
//!
//! Sessions, their messages and saved vocabulary live in one database file
//! under the data directory. The interactive core treats [`Store`] as a
//! synchronous service: every call completes before the next action is
//! applied.

mod stats;
mod vocab;

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::core::difficulty::Difficulty;
use crate::core::message::Role;
use crate::core::tutor::PracticeMode;

pub use stats::{compute_streak, GroupCount, LearnerStats, VocabStats};
pub use vocab::{CollectionSummary, NewVocabItem, SaveOutcome, VocabularyItem};

pub const DEFAULT_COLLECTION: &str = "default";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt row: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Persisted view of a session, as listed by `/history` and `/resume`.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub summary: Option<String>,
    pub title: Option<String>,
    pub difficulty: Difficulty,
    pub mode: PracticeMode,
    pub message_count: usize,
    /// First thing the learner said in the session.
    pub preview: Option<String>,
}

impl SessionRecord {
    pub fn short_id(&self) -> String {
        short_id(self.id)
    }

    /// Title, else preview, else a placeholder; used as the list label.
    pub fn label(&self) -> String {
        self.title
            .clone()
            .or_else(|| self.preview.clone())
            .unwrap_or_else(|| "(empty session)".to_string())
    }
}

/// Fields to merge into a session row. `None` keeps whatever is stored.
#[derive(Debug, Clone, Default)]
pub struct SessionUpdate {
    pub summary: Option<String>,
    pub title: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub mode: Option<PracticeMode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredMessage {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

pub struct Store {
    conn: Connection,
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    summary TEXT,
    title TEXT,
    difficulty TEXT NOT NULL DEFAULT 'beginner',
    mode TEXT NOT NULL DEFAULT 'general'
);

CREATE TABLE IF NOT EXISTS messages (
    id TEXT PRIMARY KEY,
    session_id TEXT NOT NULL REFERENCES sessions(id),
    role TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_messages_session ON messages(session_id);

CREATE TABLE IF NOT EXISTS vocab_collections (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS vocab_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    collection_id INTEGER NOT NULL REFERENCES vocab_collections(id),
    word TEXT NOT NULL,
    definition TEXT,
    example TEXT,
    mastery_level INTEGER NOT NULL DEFAULT 0,
    times_reviewed INTEGER NOT NULL DEFAULT 0,
    last_reviewed_at TEXT,
    created_at TEXT NOT NULL,
    UNIQUE(collection_id, word)
);
"#;

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Insert or merge a session row, bumping `updated_at`.
    pub fn upsert_session(&self, id: Uuid, update: &SessionUpdate) -> Result<()> {
        let now = timestamp(Utc::now());
        self.conn.execute(
            r#"
            INSERT INTO sessions (id, created_at, updated_at, summary, title, difficulty, mode)
            VALUES (?1, ?2, ?2, ?3, ?4, COALESCE(?5, 'beginner'), COALESCE(?6, 'general'))
            ON CONFLICT(id) DO UPDATE SET
                updated_at = excluded.updated_at,
                summary = COALESCE(?3, sessions.summary),
                title = COALESCE(?4, sessions.title),
                difficulty = COALESCE(?5, sessions.difficulty),
                mode = COALESCE(?6, sessions.mode)
            "#,
            params![
                id.to_string(),
                now,
                update.summary,
                update.title,
                update.difficulty.map(Difficulty::as_str),
                update.mode.map(PracticeMode::as_str),
            ],
        )?;
        Ok(())
    }

    pub fn append_message(&self, session_id: Uuid, id: Uuid, role: Role, content: &str) -> Result<()> {
        self.upsert_session(session_id, &SessionUpdate::default())?;
        self.conn.execute(
            "INSERT INTO messages (id, session_id, role, content, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                id.to_string(),
                session_id.to_string(),
                role.as_str(),
                content,
                timestamp(Utc::now()),
            ],
        )?;
        Ok(())
    }

    pub fn load_messages(&self, session_id: Uuid) -> Result<Vec<StoredMessage>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, role, content, created_at FROM messages WHERE session_id = ?1 ORDER BY rowid",
        )?;
        let rows = stmt.query_map(params![session_id.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut messages = Vec::new();
        for row in rows {
            let (id, role, content, created_at) = row?;
            messages.push(StoredMessage {
                id: parse_uuid(&id)?,
                role: Role::try_from(role.as_str()).map_err(StoreError::Parse)?,
                content,
                created_at: parse_timestamp(&created_at)?,
            });
        }
        Ok(messages)
    }

    pub fn get_session(&self, id: Uuid) -> Result<Option<SessionRecord>> {
        let sql = format!("{SESSION_SELECT} WHERE s.id = ?1");
        let raw = self
            .conn
            .query_row(&sql, params![id.to_string()], RawSession::from_row)
            .optional()?;
        raw.map(RawSession::into_record).transpose()
    }

    /// All sessions, most recently updated first.
    pub fn list_sessions(&self) -> Result<Vec<SessionRecord>> {
        let sql = format!("{SESSION_SELECT} ORDER BY s.updated_at DESC, s.rowid DESC");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], RawSession::from_row)?;
        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row?.into_record()?);
        }
        Ok(sessions)
    }

    /// Sessions whose id starts with `prefix`, most recent first.
    pub fn find_sessions_by_prefix(&self, prefix: &str) -> Result<Vec<SessionRecord>> {
        let prefix = prefix.trim().to_ascii_lowercase();
        Ok(self
            .list_sessions()?
            .into_iter()
            .filter(|s| s.id.to_string().starts_with(&prefix))
            .collect())
    }
}

const SESSION_SELECT: &str = r#"
    SELECT s.id, s.created_at, s.updated_at, s.summary, s.title, s.difficulty, s.mode,
        (SELECT COUNT(*) FROM messages m WHERE m.session_id = s.id),
        (SELECT m.content FROM messages m
            WHERE m.session_id = s.id AND m.role = 'user'
            ORDER BY m.rowid LIMIT 1)
    FROM sessions s
"#;

struct RawSession {
    id: String,
    created_at: String,
    updated_at: String,
    summary: Option<String>,
    title: Option<String>,
    difficulty: String,
    mode: String,
    message_count: i64,
    preview: Option<String>,
}

impl RawSession {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            created_at: row.get(1)?,
            updated_at: row.get(2)?,
            summary: row.get(3)?,
            title: row.get(4)?,
            difficulty: row.get(5)?,
            mode: row.get(6)?,
            message_count: row.get(7)?,
            preview: row.get(8)?,
        })
    }

    fn into_record(self) -> Result<SessionRecord> {
        Ok(SessionRecord {
            id: parse_uuid(&self.id)?,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
            summary: self.summary,
            title: self.title,
            difficulty: self.difficulty.parse().unwrap_or_default(),
            mode: self.mode.parse().unwrap_or_default(),
            message_count: self.message_count.max(0) as usize,
            preview: self.preview,
        })
    }
}

/// Fixed-width RFC 3339 so stored timestamps sort lexically.
pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Parse(format!("timestamp '{raw}': {e}")))
}

fn parse_uuid(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| StoreError::Parse(format!("id '{raw}': {e}")))
}

pub fn short_id(id: Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}
