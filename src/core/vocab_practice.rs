//! Vocabulary quiz state for the practice view.
//!
//! The state records an answer's mastery delta as a pending review and only
//! hands it out when the learner advances past the item, so each answered
//! item produces exactly one persistence update no matter how many keys
//! arrive in between.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::core::store::VocabularyItem;

pub const PRACTICE_ITEM_LIMIT: usize = 10;
pub const MULTIPLE_CHOICE_OPTIONS: usize = 4;
pub const OPTION_KEYS: [char; MULTIPLE_CHOICE_OPTIONS] = ['A', 'B', 'C', 'D'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PracticeKind {
    Flashcard,
    TypeAnswer,
    MultipleChoice,
}

impl PracticeKind {
    pub fn label(self) -> &'static str {
        match self {
            PracticeKind::Flashcard => "flashcards",
            PracticeKind::TypeAnswer => "type the answer",
            PracticeKind::MultipleChoice => "multiple choice",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PracticeItem {
    pub item_id: i64,
    pub word: String,
    pub definition: Option<String>,
    pub example: Option<String>,
    /// Multiple-choice words; empty for the other kinds.
    pub options: Vec<String>,
    pub correct_option: usize,
}

impl PracticeItem {
    /// What the learner is asked to recall the word from.
    pub fn clue(&self) -> String {
        if let Some(definition) = &self.definition {
            return definition.clone();
        }
        if let Some(example) = &self.example {
            return blank_out(example, &self.word);
        }
        let first = self.word.chars().next().unwrap_or('?');
        format!(
            "A word starting with '{first}' ({} letters)",
            self.word.chars().count()
        )
    }

    pub fn back_side(&self) -> String {
        let mut lines = Vec::new();
        match &self.definition {
            Some(def) => lines.push(def.clone()),
            None => lines.push("(no definition saved)".to_string()),
        }
        if let Some(example) = &self.example {
            lines.push(format!("e.g. {example}"));
        }
        lines.join("\n")
    }
}

/// Replace the first case-insensitive occurrence of `word` with a blank.
/// Offsets come from `sentence` itself, so they always sit on char
/// boundaries even when lowercasing changes byte lengths.
fn blank_out(sentence: &str, word: &str) -> String {
    let needle: Vec<char> = word.chars().flat_map(char::to_lowercase).collect();
    if needle.is_empty() {
        return sentence.to_string();
    }
    for (start, _) in sentence.char_indices() {
        if let Some(len) = lowercase_prefix_len(&sentence[start..], &needle) {
            let end = start + len;
            return format!("{}____{}", &sentence[..start], &sentence[end..]);
        }
    }
    sentence.to_string()
}

/// Byte length of the shortest prefix of `text` whose lowercase form
/// begins with `needle`.
fn lowercase_prefix_len(text: &str, needle: &[char]) -> Option<usize> {
    let mut matched = 0;
    for (at, ch) in text.char_indices() {
        for lower in ch.to_lowercase() {
            if lower != needle[matched] {
                return None;
            }
            matched += 1;
            if matched == needle.len() {
                return Some(at + ch.len_utf8());
            }
        }
    }
    None
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Score {
    pub correct: u32,
    pub incorrect: u32,
}

impl Score {
    pub fn answered(&self) -> u32 {
        self.correct + self.incorrect
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    Correct,
    Incorrect { expected: String },
}

/// Mastery change waiting to be written for one answered item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingReview {
    pub item_id: i64,
    pub delta: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VocabPracticeState {
    pub kind: PracticeKind,
    pub collection: Option<String>,
    pub items: Vec<PracticeItem>,
    pub current_index: usize,
    pub show_answer: bool,
    pub score: Score,
    pub user_input: String,
    pub selected_option: Option<usize>,
    pub feedback: Option<Feedback>,
    pending_review: Option<PendingReview>,
}

impl VocabPracticeState {
    /// Build a quiz over `pool` (already ordered weakest first). Multiple
    /// choice draws distractors from the same pool, so callers must check
    /// the pool holds at least [`MULTIPLE_CHOICE_OPTIONS`] words.
    pub fn new<R: Rng + ?Sized>(
        kind: PracticeKind,
        collection: Option<String>,
        pool: &[VocabularyItem],
        rng: &mut R,
    ) -> Self {
        let items = pool
            .iter()
            .take(PRACTICE_ITEM_LIMIT)
            .map(|item| {
                let (options, correct_option) = if kind == PracticeKind::MultipleChoice {
                    build_options(item, pool, rng)
                } else {
                    (Vec::new(), 0)
                };
                PracticeItem {
                    item_id: item.id,
                    word: item.word.clone(),
                    definition: item.definition.clone(),
                    example: item.example.clone(),
                    options,
                    correct_option,
                }
            })
            .collect();

        Self {
            kind,
            collection,
            items,
            current_index: 0,
            show_answer: false,
            score: Score::default(),
            user_input: String::new(),
            selected_option: None,
            feedback: None,
            pending_review: None,
        }
    }

    pub fn current(&self) -> Option<&PracticeItem> {
        self.items.get(self.current_index)
    }

    pub fn is_finished(&self) -> bool {
        self.current_index >= self.items.len()
    }

    pub fn is_answered(&self) -> bool {
        self.feedback.is_some()
    }

    pub fn reveal(&mut self) {
        if self.kind == PracticeKind::Flashcard && self.current().is_some() {
            self.show_answer = true;
        }
    }

    /// Flashcard self-assessment; only counts once the card is revealed.
    pub fn grade_flashcard(&mut self, knew_it: bool) {
        if self.kind != PracticeKind::Flashcard || !self.show_answer {
            return;
        }
        self.record(knew_it);
    }

    pub fn push_char(&mut self, ch: char) {
        if self.kind == PracticeKind::TypeAnswer && !self.is_answered() {
            self.user_input.push(ch);
        }
    }

    pub fn pop_char(&mut self) {
        if self.kind == PracticeKind::TypeAnswer && !self.is_answered() {
            self.user_input.pop();
        }
    }

    pub fn submit_typed(&mut self) {
        if self.kind != PracticeKind::TypeAnswer || self.user_input.trim().is_empty() {
            return;
        }
        let Some(item) = self.current() else {
            return;
        };
        let correct = self.user_input.trim().to_lowercase() == item.word.trim().to_lowercase();
        self.record(correct);
    }

    pub fn select_option(&mut self, index: usize) {
        if self.kind != PracticeKind::MultipleChoice || self.is_answered() {
            return;
        }
        if self.current().is_some_and(|item| index < item.options.len()) {
            self.selected_option = Some(index);
        }
    }

    pub fn confirm_selection(&mut self) {
        if self.kind != PracticeKind::MultipleChoice {
            return;
        }
        let Some(selected) = self.selected_option else {
            return;
        };
        let Some(item) = self.current() else {
            return;
        };
        let correct = selected == item.correct_option;
        self.record(correct);
    }

    fn record(&mut self, correct: bool) {
        if self.is_answered() {
            return;
        }
        let Some(item) = self.current() else {
            return;
        };
        let review = PendingReview {
            item_id: item.item_id,
            delta: if correct { 1 } else { -1 },
        };
        let feedback = if correct {
            Feedback::Correct
        } else {
            Feedback::Incorrect {
                expected: item.word.clone(),
            }
        };
        self.show_answer = true;
        self.feedback = Some(feedback);
        self.pending_review = Some(review);
        if correct {
            self.score.correct += 1;
        } else {
            self.score.incorrect += 1;
        }
    }

    /// Move past an answered item, returning its review to persist.
    /// Unanswered items cannot be skipped.
    pub fn advance(&mut self) -> Option<PendingReview> {
        if !self.is_answered() {
            return None;
        }
        let review = self.pending_review.take();
        self.current_index += 1;
        self.show_answer = false;
        self.user_input.clear();
        self.selected_option = None;
        self.feedback = None;
        review
    }

    /// Review of an answered item the learner has not advanced past yet.
    pub fn take_pending_review(&mut self) -> Option<PendingReview> {
        self.pending_review.take()
    }

    pub fn score_line(&self) -> String {
        let answered = self.score.answered();
        format!(
            "{} of {} correct ({}%).",
            self.score.correct,
            answered,
            if answered == 0 {
                0
            } else {
                self.score.correct * 100 / answered
            }
        )
    }
}

/// Words in `pool` that can appear as separate multiple-choice options.
/// The same word saved in two collections counts once.
pub fn distinct_words(pool: &[VocabularyItem]) -> usize {
    let mut words: Vec<String> = pool
        .iter()
        .map(|item| item.word.to_ascii_lowercase())
        .collect();
    words.sort_unstable();
    words.dedup();
    words.len()
}

fn build_options<R: Rng + ?Sized>(
    item: &VocabularyItem,
    pool: &[VocabularyItem],
    rng: &mut R,
) -> (Vec<String>, usize) {
    let mut distractors: Vec<&str> = pool
        .iter()
        .filter(|other| !other.word.eq_ignore_ascii_case(&item.word))
        .map(|other| other.word.as_str())
        .collect();
    distractors.sort_unstable_by_key(|w| w.to_ascii_lowercase());
    distractors.dedup_by(|a, b| a.eq_ignore_ascii_case(b));
    distractors.shuffle(rng);

    let mut options: Vec<String> = distractors
        .into_iter()
        .take(MULTIPLE_CHOICE_OPTIONS - 1)
        .map(str::to_string)
        .collect();
    options.push(item.word.clone());
    options.shuffle(rng);
    let correct = options
        .iter()
        .position(|w| *w == item.word)
        .unwrap_or_default();
    (options, correct)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn vocab(id: i64, word: &str) -> VocabularyItem {
        VocabularyItem {
            id,
            word: word.to_string(),
            definition: Some(format!("meaning of {word}")),
            example: None,
            collection: "default".into(),
            mastery_level: 0,
            times_reviewed: 0,
            last_reviewed_at: None,
        }
    }

    fn pool(words: &[&str]) -> Vec<VocabularyItem> {
        words
            .iter()
            .enumerate()
            .map(|(i, w)| vocab(i as i64 + 1, w))
            .collect()
    }

    #[test]
    fn multiple_choice_options_hold_the_word_and_three_distractors() {
        let mut rng = StdRng::seed_from_u64(7);
        let state = VocabPracticeState::new(
            PracticeKind::MultipleChoice,
            None,
            &pool(&["apple", "banana", "cherry", "date", "elder"]),
            &mut rng,
        );
        for item in &state.items {
            assert_eq!(item.options.len(), MULTIPLE_CHOICE_OPTIONS);
            assert_eq!(item.options[item.correct_option], item.word);
            let unique: std::collections::HashSet<_> = item.options.iter().collect();
            assert_eq!(unique.len(), MULTIPLE_CHOICE_OPTIONS);
        }
    }

    #[test]
    fn quiz_is_capped_at_ten_items() {
        let words: Vec<String> = (0..15).map(|i| format!("w{i}")).collect();
        let refs: Vec<&str> = words.iter().map(String::as_str).collect();
        let mut rng = StdRng::seed_from_u64(1);
        let state = VocabPracticeState::new(PracticeKind::Flashcard, None, &pool(&refs), &mut rng);
        assert_eq!(state.items.len(), PRACTICE_ITEM_LIMIT);
    }

    #[test]
    fn flashcard_grades_only_after_reveal_and_only_once() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut state =
            VocabPracticeState::new(PracticeKind::Flashcard, None, &pool(&["cat"]), &mut rng);
        state.grade_flashcard(true);
        assert_eq!(state.score.answered(), 0);

        state.reveal();
        state.grade_flashcard(true);
        state.grade_flashcard(false);
        assert_eq!(state.score, Score { correct: 1, incorrect: 0 });

        let review = state.advance();
        assert_eq!(review, Some(PendingReview { item_id: 1, delta: 1 }));
        assert_eq!(state.advance(), None);
        assert!(state.is_finished());
    }

    #[test]
    fn typed_answers_compare_case_insensitively_after_trim() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut state =
            VocabPracticeState::new(PracticeKind::TypeAnswer, None, &pool(&["Apple", "pear"]), &mut rng);
        for ch in "  aPPle ".chars() {
            state.push_char(ch);
        }
        state.submit_typed();
        assert_eq!(state.feedback, Some(Feedback::Correct));
        state.push_char('x');
        assert_eq!(state.user_input, "  aPPle ");

        state.advance();
        state.push_char('z');
        state.pop_char();
        state.push_char('q');
        state.submit_typed();
        assert_eq!(
            state.feedback,
            Some(Feedback::Incorrect {
                expected: "pear".into()
            })
        );
        assert_eq!(
            state.take_pending_review(),
            Some(PendingReview { item_id: 2, delta: -1 })
        );
        assert_eq!(state.take_pending_review(), None);
    }

    #[test]
    fn multiple_choice_needs_a_selection_before_confirming() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut state = VocabPracticeState::new(
            PracticeKind::MultipleChoice,
            None,
            &pool(&["one", "two", "three", "four"]),
            &mut rng,
        );
        state.confirm_selection();
        assert!(!state.is_answered());

        state.select_option(9);
        assert_eq!(state.selected_option, None);

        let correct = state.items[0].correct_option;
        state.select_option(correct);
        state.confirm_selection();
        assert_eq!(state.feedback, Some(Feedback::Correct));
        assert_eq!(state.score_line(), "1 of 1 correct (100%).");
    }

    #[test]
    fn clue_blanks_the_word_inside_examples() {
        let item = PracticeItem {
            item_id: 1,
            word: "ubiquitous".into(),
            definition: None,
            example: Some("Phones are ubiquitous today.".into()),
            options: Vec::new(),
            correct_option: 0,
        };
        assert_eq!(item.clue(), "Phones are ____ today.");
    }

    #[test]
    fn blanking_survives_case_mappings_that_change_byte_length() {
        assert_eq!(blank_out("Ⱥ cat K", "cat"), "Ⱥ ____ K");
        assert_eq!(blank_out("Die STRAẞE ist lang.", "straße"), "Die ____ ist lang.");
        assert_eq!(blank_out("\u{212A}elvin scale", "kelvin"), "____ scale");
        assert_eq!(blank_out("ȺȺ K here", "missing"), "ȺȺ K here");
    }
}
