use chrono::{NaiveDate, Utc};
use rusqlite::params;

use super::{parse_timestamp, Result, Store};

pub const MASTERED_THRESHOLD: i64 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupCount {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LearnerStats {
    pub sessions: usize,
    pub messages_sent: usize,
    pub words_saved: usize,
    pub words_mastered: usize,
    pub streak_days: u32,
    pub by_difficulty: Vec<GroupCount>,
    pub by_mode: Vec<GroupCount>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VocabStats {
    pub total: usize,
    pub mastered: usize,
    pub learning: usize,
    pub struggling: usize,
    pub reviewed: usize,
    pub by_collection: Vec<GroupCount>,
}

impl Store {
    pub fn learner_stats(&self, today: NaiveDate) -> Result<LearnerStats> {
        let sessions = self.count("SELECT COUNT(*) FROM sessions")?;
        let messages_sent = self.count("SELECT COUNT(*) FROM messages WHERE role = 'user'")?;
        let words_saved = self.count("SELECT COUNT(*) FROM vocab_items")?;
        let words_mastered = self.count_with(
            "SELECT COUNT(*) FROM vocab_items WHERE mastery_level >= ?1",
            MASTERED_THRESHOLD,
        )?;

        Ok(LearnerStats {
            sessions,
            messages_sent,
            words_saved,
            words_mastered,
            streak_days: compute_streak(&self.active_days()?, today),
            by_difficulty: self.group_counts(
                "SELECT difficulty, COUNT(*) FROM sessions GROUP BY difficulty ORDER BY COUNT(*) DESC, difficulty",
            )?,
            by_mode: self.group_counts(
                "SELECT mode, COUNT(*) FROM sessions GROUP BY mode ORDER BY COUNT(*) DESC, mode",
            )?,
        })
    }

    pub fn vocab_stats(&self) -> Result<VocabStats> {
        let total = self.count("SELECT COUNT(*) FROM vocab_items")?;
        let mastered = self.count_with(
            "SELECT COUNT(*) FROM vocab_items WHERE mastery_level >= ?1",
            MASTERED_THRESHOLD,
        )?;
        let struggling = self.count("SELECT COUNT(*) FROM vocab_items WHERE mastery_level < 0")?;
        let reviewed = self.count("SELECT COUNT(*) FROM vocab_items WHERE times_reviewed > 0")?;
        let by_collection = self.group_counts(
            r#"
            SELECT c.name, COUNT(v.id) FROM vocab_collections c
            LEFT JOIN vocab_items v ON v.collection_id = c.id
            GROUP BY c.id ORDER BY c.name
            "#,
        )?;
        Ok(VocabStats {
            total,
            mastered,
            learning: total.saturating_sub(mastered + struggling),
            struggling,
            reviewed,
            by_collection,
        })
    }

    /// Distinct UTC dates on which the learner sent a message.
    fn active_days(&self) -> Result<Vec<NaiveDate>> {
        let mut stmt = self
            .conn
            .prepare("SELECT created_at FROM messages WHERE role = 'user'")?;
        let raw: Vec<String> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<_>>()?;
        let mut days = raw
            .iter()
            .map(|ts| parse_timestamp(ts).map(|dt| dt.with_timezone(&Utc).date_naive()))
            .collect::<Result<Vec<_>>>()?;
        days.sort_unstable();
        days.dedup();
        Ok(days)
    }

    fn count(&self, sql: &str) -> Result<usize> {
        let n: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(n.max(0) as usize)
    }

    fn count_with(&self, sql: &str, arg: i64) -> Result<usize> {
        let n: i64 = self.conn.query_row(sql, params![arg], |row| row.get(0))?;
        Ok(n.max(0) as usize)
    }

    fn group_counts(&self, sql: &str) -> Result<Vec<GroupCount>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| {
            Ok(GroupCount {
                label: row.get(0)?,
                count: row.get::<_, i64>(1)?.max(0) as usize,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

/// Consecutive active days ending today, or ending yesterday when the
/// learner has not practised yet today. `days` may be unsorted and contain
/// duplicates.
pub fn compute_streak(days: &[NaiveDate], today: NaiveDate) -> u32 {
    let mut sorted: Vec<NaiveDate> = days.iter().copied().filter(|d| *d <= today).collect();
    sorted.sort_unstable();
    sorted.dedup();

    let Some(&latest) = sorted.last() else {
        return 0;
    };
    let gap = (today - latest).num_days();
    if gap > 1 {
        return 0;
    }

    let mut streak = 0u32;
    let mut expected = latest;
    for day in sorted.iter().rev() {
        if *day != expected {
            break;
        }
        streak += 1;
        match expected.pred_opt() {
            Some(prev) => expected = prev,
            None => break,
        }
    }
    streak
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::difficulty::Difficulty;
    use crate::core::message::Role;
    use crate::core::store::{NewVocabItem, SessionUpdate};
    use uuid::Uuid;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn streak_counts_back_from_today() {
        let today = day(2024, 3, 10);
        let days = [day(2024, 3, 10), day(2024, 3, 9), day(2024, 3, 8), day(2024, 3, 5)];
        assert_eq!(compute_streak(&days, today), 3);
    }

    #[test]
    fn streak_survives_until_end_of_next_day() {
        let today = day(2024, 3, 10);
        assert_eq!(compute_streak(&[day(2024, 3, 9), day(2024, 3, 8)], today), 2);
        assert_eq!(compute_streak(&[day(2024, 3, 8)], today), 0);
        assert_eq!(compute_streak(&[], today), 0);
    }

    #[test]
    fn streak_ignores_duplicates_and_order() {
        let today = day(2024, 1, 1);
        let days = [day(2023, 12, 31), day(2024, 1, 1), day(2023, 12, 31)];
        assert_eq!(compute_streak(&days, today), 2);
    }

    #[test]
    fn learner_stats_aggregate_sessions_and_vocab() {
        let store = Store::open_in_memory().unwrap();
        let session = Uuid::new_v4();
        store
            .append_message(session, Uuid::new_v4(), Role::User, "hello")
            .unwrap();
        store
            .append_message(session, Uuid::new_v4(), Role::Assistant, "hi")
            .unwrap();
        store
            .upsert_session(
                session,
                &SessionUpdate {
                    difficulty: Some(Difficulty::Intermediate),
                    ..Default::default()
                },
            )
            .unwrap();
        store
            .save_vocab_items(
                "default",
                &[NewVocabItem::word("cat"), NewVocabItem::word("dog")],
            )
            .unwrap();
        let cat = store.list_vocab(None).unwrap()[0].id;
        for _ in 0..3 {
            store.update_vocab_mastery(cat, 1).unwrap();
        }

        let stats = store.learner_stats(Utc::now().date_naive()).unwrap();
        assert_eq!(stats.sessions, 1);
        assert_eq!(stats.messages_sent, 1);
        assert_eq!(stats.words_saved, 2);
        assert_eq!(stats.words_mastered, 1);
        assert_eq!(stats.streak_days, 1);
        assert_eq!(
            stats.by_difficulty,
            vec![GroupCount {
                label: "intermediate".into(),
                count: 1
            }]
        );
    }

    #[test]
    fn vocab_stats_split_by_mastery() {
        let store = Store::open_in_memory().unwrap();
        store
            .save_vocab_items(
                "default",
                &[
                    NewVocabItem::word("a"),
                    NewVocabItem::word("b"),
                    NewVocabItem::word("c"),
                ],
            )
            .unwrap();
        let items = store.list_vocab(None).unwrap();
        store.update_vocab_mastery(items[0].id, -1).unwrap();
        for _ in 0..3 {
            store.update_vocab_mastery(items[1].id, 1).unwrap();
        }

        let stats = store.vocab_stats().unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.struggling, 1);
        assert_eq!(stats.mastered, 1);
        assert_eq!(stats.learning, 1);
        assert_eq!(stats.reviewed, 2);
    }
}
