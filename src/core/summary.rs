//! Requests that condense a session into a summary or a short title.

use crate::core::message::{conversation_turns, ApiMessage, ChatMessage, Role};

pub const MAX_TITLE_CHARS: usize = 60;
const FALLBACK_TITLE_WORDS: usize = 6;

const SUMMARY_INSTRUCTIONS: &str = "Summarize this English tutoring conversation in 3-5 sentences. \
Mention the topics discussed, recurring mistakes, and new vocabulary so a tutor could continue later.";

const TITLE_INSTRUCTIONS: &str = "Write a short title (at most 6 words) for this English tutoring conversation. \
Reply with the title only, without quotes or punctuation at the end.";

fn transcript(history: &[ChatMessage]) -> String {
    conversation_turns(history)
        .map(|m| {
            let speaker = if m.role == Role::User { "Learner" } else { "Tutor" };
            format!("{speaker}: {}", m.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn summary_request(history: &[ChatMessage]) -> Vec<ApiMessage> {
    vec![
        ApiMessage::system(SUMMARY_INSTRUCTIONS),
        ApiMessage {
            role: Role::User,
            content: transcript(history),
        },
    ]
}

pub fn title_request(history: &[ChatMessage]) -> Vec<ApiMessage> {
    vec![
        ApiMessage::system(TITLE_INSTRUCTIONS),
        ApiMessage {
            role: Role::User,
            content: transcript(history),
        },
    ]
}

/// Normalize a model-written title: first line, surrounding quotes and
/// trailing periods removed, capped at [`MAX_TITLE_CHARS`].
pub fn clean_title(raw: &str) -> Option<String> {
    let line = raw.lines().map(str::trim).find(|l| !l.is_empty())?;
    let line = line
        .strip_prefix("Title:")
        .map(str::trim)
        .unwrap_or(line)
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '“' | '”' | '*' | '`'))
        .trim_end_matches('.')
        .trim();
    if line.is_empty() {
        return None;
    }
    Some(truncate_chars(line, MAX_TITLE_CHARS))
}

/// Title used when generation fails: the first user message's first words.
pub fn fallback_title(history: &[ChatMessage]) -> Option<String> {
    let first = conversation_turns(history).find(|m| m.role == Role::User)?;
    let words: Vec<&str> = first
        .content
        .split_whitespace()
        .take(FALLBACK_TITLE_WORDS)
        .collect();
    if words.is_empty() {
        return None;
    }
    Some(truncate_chars(&words.join(" "), MAX_TITLE_CHARS))
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out = out.trim_end().to_string();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_title_strips_quotes_and_prefix() {
        assert_eq!(
            clean_title("\"Ordering Coffee in London.\"\n").as_deref(),
            Some("Ordering Coffee in London")
        );
        assert_eq!(
            clean_title("Title: Job interview practice").as_deref(),
            Some("Job interview practice")
        );
        assert_eq!(clean_title("   \n  "), None);
    }

    #[test]
    fn clean_title_caps_length() {
        let long = "word ".repeat(40);
        let title = clean_title(&long).unwrap();
        assert!(title.chars().count() <= MAX_TITLE_CHARS);
        assert!(title.ends_with('…'));
    }

    #[test]
    fn fallback_title_uses_first_six_words_of_first_user_message() {
        let history = vec![
            ChatMessage::notice("Welcome"),
            ChatMessage::user("I would like to practise talking about my weekend plans"),
            ChatMessage::assistant("Sure!"),
        ];
        assert_eq!(
            fallback_title(&history).as_deref(),
            Some("I would like to practise talking")
        );
        assert_eq!(fallback_title(&[]), None);
    }

    #[test]
    fn requests_carry_only_conversation_turns() {
        let history = vec![
            ChatMessage::user("Hi"),
            ChatMessage::error("HTTP 500"),
            ChatMessage::assistant("Hello"),
        ];
        let request = summary_request(&history);
        assert_eq!(request.len(), 2);
        assert_eq!(request[0].role, Role::System);
        assert_eq!(request[1].content, "Learner: Hi\nTutor: Hello");
        assert_eq!(title_request(&history)[1].content, request[1].content);
    }
}
