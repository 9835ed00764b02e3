use tracing::debug;

use super::{store_error, usage};
use crate::commands::registry::{ArgHint, CommandInvocation};
use crate::commands::CommandResult;
use crate::core::app::{App, ViewMode};
use crate::core::store::{NewVocabItem, DEFAULT_COLLECTION};
use crate::core::vocab_practice::{
    distinct_words, PracticeKind, VocabPracticeState, MULTIPLE_CHOICE_OPTIONS,
    PRACTICE_ITEM_LIMIT,
};

const USAGE_SAVE: &str = "/save <word1, word2, ...> [collection] [--def \"text\"]";
const USAGE_VOCAB: &str = "/vocab [list|stats|collections|practice] [collection] [--type|--mc]";
const DEF_FLAG: &str = "--def";

/// Parsed form of `/save` arguments.
#[derive(Debug, PartialEq)]
struct SaveRequest {
    words: Vec<String>,
    collection: Option<String>,
    definition: Option<String>,
}

/// The last whitespace token names the collection when it holds no comma
/// and follows a token that does not end a list item with a comma.
/// Everything else is a comma separated list.
fn parse_save_args(args: &str) -> Result<SaveRequest, String> {
    let (word_part, definition) = match args.find(DEF_FLAG) {
        Some(at) => {
            let raw = args[at + DEF_FLAG.len()..].trim();
            let unquoted = raw
                .strip_prefix('"')
                .and_then(|s| s.strip_suffix('"'))
                .unwrap_or(raw)
                .trim();
            if unquoted.is_empty() {
                return Err(format!("Usage: {USAGE_SAVE}"));
            }
            (&args[..at], Some(unquoted.to_string()))
        }
        None => (args, None),
    };

    let mut tokens: Vec<&str> = word_part.split_whitespace().collect();
    let names_collection = matches!(
        tokens.as_slice(),
        [.., before, last] if !last.contains(',') && !before.ends_with(',')
    );
    let collection = if names_collection {
        tokens.pop().map(str::to_string)
    } else {
        None
    };

    let words: Vec<String> = tokens
        .join(" ")
        .split(',')
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect();
    if words.is_empty() {
        return Err(format!("Usage: {USAGE_SAVE}"));
    }
    if definition.is_some() && words.len() != 1 {
        return Err("--def can only be used when saving a single word".to_string());
    }

    Ok(SaveRequest {
        words,
        collection,
        definition,
    })
}

pub(crate) fn handle_save(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    let request = match parse_save_args(invocation.args) {
        Ok(request) => request,
        Err(message) => return CommandResult::error(message),
    };
    let collection = request
        .collection
        .unwrap_or_else(|| DEFAULT_COLLECTION.to_string());
    let items: Vec<NewVocabItem> = request
        .words
        .into_iter()
        .map(|word| NewVocabItem {
            word,
            definition: request.definition.clone(),
            example: None,
        })
        .collect();

    let outcome = match app.store.save_vocab_items(&collection, &items) {
        Ok(outcome) => outcome,
        Err(err) => return store_error(err),
    };
    debug!(
        collection = %outcome.collection,
        saved = outcome.saved.len(),
        skipped = outcome.skipped.len(),
        "saved vocabulary"
    );

    let mut message = if outcome.saved.is_empty() {
        format!("Nothing new saved to '{}'", outcome.collection)
    } else {
        format!(
            "Saved {} word{} to '{}'{}: {}",
            outcome.saved.len(),
            if outcome.saved.len() == 1 { "" } else { "s" },
            outcome.collection,
            if outcome.created_collection {
                " (new collection)"
            } else {
                ""
            },
            outcome.saved.join(", ")
        )
    };
    if !outcome.skipped.is_empty() {
        message.push_str(&format!("; already saved: {}", outcome.skipped.join(", ")));
    }
    CommandResult::ok(message)
}

pub(crate) fn handle_vocab(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    let tokens = invocation.tokens();
    match tokens.as_slice() {
        [] | ["list"] => list_vocab(app, None),
        ["list", collection] => list_vocab(app, Some(*collection)),
        ["stats"] => vocab_stats(app),
        ["collections"] => list_collections(app),
        ["practice", rest @ ..] => start_practice(app, rest),
        _ => usage(USAGE_VOCAB),
    }
}

fn list_vocab(app: &mut App, collection: Option<&str>) -> CommandResult {
    let items = match app.store.list_vocab(collection) {
        Ok(items) => items,
        Err(err) => return store_error(err),
    };
    if items.is_empty() {
        return CommandResult::ok(match collection {
            Some(name) => format!("No words saved in '{name}'"),
            None => "No words saved yet. Try /save <word>".to_string(),
        });
    }

    let mut lines = vec![match collection {
        Some(name) => format!("Vocabulary in '{name}'"),
        None => "Vocabulary".to_string(),
    }];
    for item in &items {
        let mut line = format!("  {} [{}] mastery {}", item.word, item.collection, item.mastery_level);
        if let Some(def) = &item.definition {
            line.push_str(&format!(" - {def}"));
        }
        lines.push(line);
    }
    app.add_notice(lines.join("\n"));
    CommandResult::ok(format!("Listed {} words", items.len()))
}

fn vocab_stats(app: &mut App) -> CommandResult {
    let stats = match app.store.vocab_stats() {
        Ok(stats) => stats,
        Err(err) => return store_error(err),
    };
    let mut lines = vec![
        "Vocabulary statistics".to_string(),
        format!("  Total words: {}", stats.total),
        format!("  Mastered: {}", stats.mastered),
        format!("  Learning: {}", stats.learning),
        format!("  Struggling: {}", stats.struggling),
        format!("  Reviewed at least once: {}", stats.reviewed),
    ];
    if !stats.by_collection.is_empty() {
        lines.push("  By collection:".to_string());
        lines.extend(
            stats
                .by_collection
                .iter()
                .map(|g| format!("    {}: {}", g.label, g.count)),
        );
    }
    app.add_notice(lines.join("\n"));
    CommandResult::ok("Vocabulary statistics updated")
}

fn list_collections(app: &mut App) -> CommandResult {
    let collections = match app.store.list_collections() {
        Ok(collections) => collections,
        Err(err) => return store_error(err),
    };
    if collections.is_empty() {
        return CommandResult::ok("No collections yet");
    }
    let mut lines = vec!["Collections".to_string()];
    lines.extend(collections.iter().map(|c| {
        format!(
            "  {} ({} word{})",
            c.name,
            c.word_count,
            if c.word_count == 1 { "" } else { "s" }
        )
    }));
    app.add_notice(lines.join("\n"));
    CommandResult::ok(format!("{} collections", collections.len()))
}

fn start_practice(app: &mut App, args: &[&str]) -> CommandResult {
    let mut collection: Option<String> = None;
    let mut wants_type = false;
    let mut wants_mc = false;
    for arg in args {
        match *arg {
            "--type" => wants_type = true,
            "--mc" => wants_mc = true,
            flag if flag.starts_with("--") => return usage(USAGE_VOCAB),
            name if collection.is_none() => collection = Some(name.to_string()),
            _ => return usage(USAGE_VOCAB),
        }
    }
    let mut kind = if wants_mc {
        PracticeKind::MultipleChoice
    } else if wants_type {
        PracticeKind::TypeAnswer
    } else {
        PracticeKind::Flashcard
    };

    if let Some(name) = &collection {
        match app.store.collection_exists(name) {
            Ok(true) => {}
            Ok(false) => return CommandResult::error(format!("No collection named '{name}'")),
            Err(err) => return store_error(err),
        }
    }

    let pool = match app
        .store
        .practice_pool(collection.as_deref(), PRACTICE_ITEM_LIMIT)
    {
        Ok(pool) => pool,
        Err(err) => return store_error(err),
    };
    if pool.is_empty() {
        return CommandResult::error("No words to practise yet. Save some with /save");
    }

    let mut warning = None;
    if kind == PracticeKind::MultipleChoice {
        let available = distinct_words(&pool);
        if available < MULTIPLE_CHOICE_OPTIONS {
            kind = PracticeKind::Flashcard;
            warning = Some(format!(
                "Multiple choice needs at least {MULTIPLE_CHOICE_OPTIONS} different words ({available} available); using flashcards"
            ));
        }
    }

    let state = VocabPracticeState::new(kind, collection, &pool, &mut rand::thread_rng());
    debug!(kind = kind.label(), items = state.items.len(), "starting practice");
    app.practice = Some(state);
    app.palette.close();
    app.ui.clear_input();
    app.ui.open_view(ViewMode::VocabPractice, 0);

    match warning {
        Some(message) => CommandResult::ok(message),
        None => CommandResult::Handled,
    }
}

/// Close the quiz, flushing a review the learner answered but never
/// advanced past, and report the running score.
pub(crate) fn end_practice(app: &mut App) {
    let Some(mut practice) = app.practice.take() else {
        app.ui.view = ViewMode::Chat;
        return;
    };
    if let Some(review) = practice.take_pending_review() {
        app.persist_review(review);
    }
    app.ui.view = ViewMode::Chat;
    let finished = practice.is_finished();
    if practice.score.answered() > 0 {
        let prefix = if finished {
            "Practice complete"
        } else {
            "Practice ended"
        };
        let message = format!("{prefix}: {}", practice.score_line());
        app.add_notice(message.clone());
        app.ui.set_status(message);
    } else {
        app.ui.set_status("Practice ended");
    }
}

pub(crate) fn vocab_hints(app: &App) -> Vec<ArgHint> {
    let mut hints = vec![
        ArgHint::new("list", "all saved words"),
        ArgHint::new("stats", "mastery breakdown"),
        ArgHint::new("collections", "collections and word counts"),
        ArgHint::new("practice", "flashcards over your weakest words"),
        ArgHint::new("practice --type", "type the word from its clue"),
        ArgHint::new("practice --mc", "multiple choice"),
    ];
    if let Ok(collections) = app.store.list_collections() {
        hints.extend(collections.into_iter().map(|c| {
            ArgHint::new(
                format!("practice {}", c.name),
                format!("{} words", c.word_count),
            )
        }));
    }
    hints
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_token_without_comma_names_the_collection() {
        let request = parse_save_args("apple, banana fruits").unwrap();
        assert_eq!(request.words, vec!["apple", "banana"]);
        assert_eq!(request.collection.as_deref(), Some("fruits"));
        assert_eq!(request.definition, None);
    }

    #[test]
    fn single_word_has_no_collection() {
        let request = parse_save_args("vocabulary").unwrap();
        assert_eq!(request.words, vec!["vocabulary"]);
        assert_eq!(request.collection, None);
    }

    #[test]
    fn trailing_comma_token_is_a_word() {
        let request = parse_save_args("apple, banana,").unwrap();
        assert_eq!(request.words, vec!["apple", "banana"]);
        assert_eq!(request.collection, None);
    }

    #[test]
    fn definition_is_unquoted() {
        let request = parse_save_args("vocabulary --def \"a list of words\"").unwrap();
        assert_eq!(request.words, vec!["vocabulary"]);
        assert_eq!(request.definition.as_deref(), Some("a list of words"));
    }

    #[test]
    fn definition_requires_exactly_one_word() {
        let err = parse_save_args("apple, banana, --def \"fruit\"").unwrap_err();
        assert!(err.contains("single word"));
        let err = parse_save_args("apple, banana --def \"fruit\"").unwrap_err();
        assert!(err.contains("single word"));
    }

    #[test]
    fn empty_arguments_show_usage() {
        assert!(parse_save_args("").unwrap_err().starts_with("Usage:"));
        assert!(parse_save_args("apple --def").unwrap_err().starts_with("Usage:"));
    }
}
