use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use super::{parse_timestamp, timestamp, Result, Store};

#[derive(Debug, Clone, PartialEq)]
pub struct VocabularyItem {
    pub id: i64,
    pub word: String,
    pub definition: Option<String>,
    pub example: Option<String>,
    pub collection: String,
    pub mastery_level: i64,
    pub times_reviewed: i64,
    pub last_reviewed_at: Option<chrono::DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewVocabItem {
    pub word: String,
    pub definition: Option<String>,
    pub example: Option<String>,
}

impl NewVocabItem {
    pub fn word(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            ..Default::default()
        }
    }
}

/// Result of a batch save. Words already present in the collection are
/// skipped rather than overwritten.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveOutcome {
    pub collection: String,
    pub created_collection: bool,
    pub saved: Vec<String>,
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSummary {
    pub name: String,
    pub word_count: usize,
}

const ITEM_SELECT: &str = r#"
    SELECT v.id, v.word, v.definition, v.example, c.name,
        v.mastery_level, v.times_reviewed, v.last_reviewed_at
    FROM vocab_items v
    JOIN vocab_collections c ON c.id = v.collection_id
"#;

impl Store {
    /// Id of the named collection, creating it when missing. The flag is
    /// true when the collection was created by this call.
    pub fn ensure_collection(&self, name: &str) -> Result<(i64, bool)> {
        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM vocab_collections WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(id) = existing {
            return Ok((id, false));
        }
        self.conn.execute(
            "INSERT INTO vocab_collections (name, created_at) VALUES (?1, ?2)",
            params![name, timestamp(Utc::now())],
        )?;
        Ok((self.conn.last_insert_rowid(), true))
    }

    pub fn collection_exists(&self, name: &str) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM vocab_collections WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn save_vocab_items(&self, collection: &str, items: &[NewVocabItem]) -> Result<SaveOutcome> {
        let (collection_id, created_collection) = self.ensure_collection(collection)?;
        let mut outcome = SaveOutcome {
            collection: collection.to_string(),
            created_collection,
            ..Default::default()
        };
        let now = timestamp(Utc::now());
        for item in items {
            let inserted = self.conn.execute(
                r#"
                INSERT OR IGNORE INTO vocab_items
                    (collection_id, word, definition, example, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![collection_id, item.word, item.definition, item.example, now],
            )?;
            if inserted > 0 {
                outcome.saved.push(item.word.clone());
            } else {
                outcome.skipped.push(item.word.clone());
            }
        }
        Ok(outcome)
    }

    /// Items in one collection (or every collection), alphabetical.
    pub fn list_vocab(&self, collection: Option<&str>) -> Result<Vec<VocabularyItem>> {
        let sql = format!(
            "{ITEM_SELECT} WHERE (?1 IS NULL OR c.name = ?1) ORDER BY c.name, v.word COLLATE NOCASE"
        );
        self.query_items(&sql, collection, None)
    }

    /// Weakest items first: lowest mastery, then least recently reviewed.
    pub fn practice_pool(&self, collection: Option<&str>, limit: usize) -> Result<Vec<VocabularyItem>> {
        let sql = format!(
            r#"{ITEM_SELECT}
            WHERE (?1 IS NULL OR c.name = ?1)
            ORDER BY v.mastery_level ASC,
                v.last_reviewed_at IS NOT NULL,
                v.last_reviewed_at ASC,
                v.id ASC
            LIMIT ?2"#
        );
        self.query_items(&sql, collection, Some(limit))
    }

    pub fn count_vocab(&self, collection: Option<&str>) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            r#"
            SELECT COUNT(*) FROM vocab_items v
            JOIN vocab_collections c ON c.id = v.collection_id
            WHERE (?1 IS NULL OR c.name = ?1)
            "#,
            params![collection],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as usize)
    }

    /// Apply one review outcome. Mastery is unbounded in both directions.
    pub fn update_vocab_mastery(&self, item_id: i64, delta: i64) -> Result<()> {
        self.conn.execute(
            r#"
            UPDATE vocab_items SET
                mastery_level = mastery_level + ?1,
                times_reviewed = times_reviewed + 1,
                last_reviewed_at = ?2
            WHERE id = ?3
            "#,
            params![delta, timestamp(Utc::now()), item_id],
        )?;
        Ok(())
    }

    pub fn list_collections(&self) -> Result<Vec<CollectionSummary>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT c.name, COUNT(v.id)
            FROM vocab_collections c
            LEFT JOIN vocab_items v ON v.collection_id = c.id
            GROUP BY c.id
            ORDER BY c.name
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(CollectionSummary {
                name: row.get(0)?,
                word_count: row.get::<_, i64>(1)?.max(0) as usize,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn query_items(
        &self,
        sql: &str,
        collection: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<VocabularyItem>> {
        let mut stmt = self.conn.prepare(sql)?;
        let map_row = |row: &rusqlite::Row| -> rusqlite::Result<(VocabularyItem, Option<String>)> {
            Ok((
                VocabularyItem {
                    id: row.get(0)?,
                    word: row.get(1)?,
                    definition: row.get(2)?,
                    example: row.get(3)?,
                    collection: row.get(4)?,
                    mastery_level: row.get(5)?,
                    times_reviewed: row.get(6)?,
                    last_reviewed_at: None,
                },
                row.get::<_, Option<String>>(7)?,
            ))
        };
        let rows: Vec<_> = match limit {
            Some(limit) => stmt
                .query_map(params![collection, limit as i64], map_row)?
                .collect::<rusqlite::Result<_>>()?,
            None => stmt
                .query_map(params![collection], map_row)?
                .collect::<rusqlite::Result<_>>()?,
        };

        rows.into_iter()
            .map(|(mut item, reviewed)| {
                item.last_reviewed_at = reviewed.as_deref().map(parse_timestamp).transpose()?;
                Ok(item)
            })
            .collect()
    }
}
