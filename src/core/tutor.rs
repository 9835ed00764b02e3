//! Tutor persona: practice modes and the system prompt that frames every
//! provider request.

use crate::core::difficulty::Difficulty;
use crate::core::message::{conversation_turns, ApiMessage, ChatMessage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PracticeMode {
    #[default]
    General,
    Grammar,
    Vocab,
    RolePlay,
    Fluency,
    Exam,
}

impl PracticeMode {
    pub const ALL: [PracticeMode; 6] = [
        PracticeMode::General,
        PracticeMode::Grammar,
        PracticeMode::Vocab,
        PracticeMode::RolePlay,
        PracticeMode::Fluency,
        PracticeMode::Exam,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PracticeMode::General => "general",
            PracticeMode::Grammar => "grammar",
            PracticeMode::Vocab => "vocab",
            PracticeMode::RolePlay => "role-play",
            PracticeMode::Fluency => "fluency",
            PracticeMode::Exam => "exam",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            PracticeMode::General => "Open conversation with light corrections",
            PracticeMode::Grammar => "Focus on grammar mistakes and rules",
            PracticeMode::Vocab => "Learn and reuse new words",
            PracticeMode::RolePlay => "Act out real-life scenarios",
            PracticeMode::Fluency => "Keep the conversation flowing, fewer interruptions",
            PracticeMode::Exam => "Exam-style tasks with scoring",
        }
    }

    pub fn guidance(self) -> &'static str {
        match self {
            PracticeMode::General => {
                "Mode: general conversation. Chat naturally and correct only the most important mistakes at the end of your reply."
            }
            PracticeMode::Grammar => {
                "Mode: grammar practice. Point out every grammar mistake, show the corrected sentence, and name the rule involved."
            }
            PracticeMode::Vocab => {
                "Mode: vocabulary building. Introduce two or three useful words per reply with a short definition and an example, and encourage the learner to reuse them."
            }
            PracticeMode::RolePlay => {
                "Mode: role-play. Stay in character in a realistic scenario (shop, interview, travel). Add corrections in a short note after your in-character reply."
            }
            PracticeMode::Fluency => {
                "Mode: fluency. Keep the conversation moving with open questions. Avoid interrupting with corrections unless a mistake blocks understanding."
            }
            PracticeMode::Exam => {
                "Mode: exam preparation. Give exam-style tasks one at a time, grade each answer on a 0-10 scale, and explain how to improve."
            }
        }
    }
}

impl fmt::Display for PracticeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PracticeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        PracticeMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized || mode.as_str().replace('-', "") == normalized)
            .ok_or_else(|| {
                let names: Vec<&str> = PracticeMode::ALL.iter().map(|m| m.as_str()).collect();
                format!("Unknown mode '{}'. Use one of: {}.", s.trim(), names.join(", "))
            })
    }
}

const BASE_INSTRUCTIONS: &str = "You are a friendly, patient English tutor chatting with a learner in a terminal. \
Reply in English. Keep replies concise (under 150 words unless asked for more). \
When the learner makes mistakes, show the corrected version and a one-line explanation.";

pub fn build_system_prompt(
    difficulty: Difficulty,
    mode: PracticeMode,
    summary: Option<&str>,
) -> String {
    let mut prompt = String::from(BASE_INSTRUCTIONS);
    prompt.push_str("\n\n");
    prompt.push_str(difficulty.guidance());
    prompt.push_str("\n\n");
    prompt.push_str(mode.guidance());
    if let Some(summary) = summary.map(str::trim).filter(|s| !s.is_empty()) {
        prompt.push_str("\n\nSummary of earlier conversation with this learner:\n");
        prompt.push_str(summary);
    }
    prompt
}

/// Outbound history: exactly one freshly synthesized system message, then
/// the conversation turns in order.
pub fn build_request_history(
    history: &[ChatMessage],
    difficulty: Difficulty,
    mode: PracticeMode,
    summary: Option<&str>,
) -> Vec<ApiMessage> {
    let mut messages = vec![ApiMessage::system(build_system_prompt(
        difficulty, mode, summary,
    ))];
    messages.extend(conversation_turns(history).map(ApiMessage::from));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Role;

    #[test]
    fn request_history_starts_with_exactly_one_system_message() {
        let history = vec![
            ChatMessage::user("Hello"),
            ChatMessage::notice("help text"),
            ChatMessage::assistant("Hi!"),
            ChatMessage::error("API Error"),
            ChatMessage::user("How are you?"),
        ];
        let request = build_request_history(
            &history,
            Difficulty::Intermediate,
            PracticeMode::Grammar,
            None,
        );
        assert_eq!(request[0].role, Role::System);
        assert_eq!(
            request.iter().filter(|m| m.role == Role::System).count(),
            1
        );
        assert!(request[0].content.contains("intermediate"));
        assert!(request[0].content.contains("grammar practice"));
        let rest: Vec<_> = request[1..].iter().map(|m| m.content.as_str()).collect();
        assert_eq!(rest, vec!["Hello", "Hi!", "How are you?"]);
    }

    #[test]
    fn summary_is_folded_into_system_prompt() {
        let prompt = build_system_prompt(
            Difficulty::Beginner,
            PracticeMode::General,
            Some("We talked about cooking."),
        );
        assert!(prompt.contains("We talked about cooking."));
        let without = build_system_prompt(Difficulty::Beginner, PracticeMode::General, Some("  "));
        assert!(!without.contains("Summary of earlier"));
    }

    #[test]
    fn modes_parse_with_or_without_dash() {
        assert_eq!("role-play".parse(), Ok(PracticeMode::RolePlay));
        assert_eq!("roleplay".parse(), Ok(PracticeMode::RolePlay));
        assert_eq!("EXAM".parse(), Ok(PracticeMode::Exam));
        assert!("karaoke".parse::<PracticeMode>().is_err());
    }
}
