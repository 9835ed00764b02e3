use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Learner level. Variants are declared in ascending order so the derived
/// ordering matches the level ordering.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

const UP_WORD_THRESHOLD: usize = 20;
const DOWN_WORD_THRESHOLD: usize = 6;

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Advanced,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }

    pub fn step_up(self) -> Self {
        match self {
            Difficulty::Beginner => Difficulty::Intermediate,
            Difficulty::Intermediate | Difficulty::Advanced => Difficulty::Advanced,
        }
    }

    pub fn step_down(self) -> Self {
        match self {
            Difficulty::Advanced => Difficulty::Intermediate,
            Difficulty::Intermediate | Difficulty::Beginner => Difficulty::Beginner,
        }
    }

    pub fn guidance(self) -> &'static str {
        match self {
            Difficulty::Beginner => {
                "The learner is a beginner. Use short sentences, common words, and explain every correction simply."
            }
            Difficulty::Intermediate => {
                "The learner is intermediate. Use natural everyday English, introduce some idioms, and explain corrections briefly."
            }
            Difficulty::Advanced => {
                "The learner is advanced. Use rich vocabulary and complex structures, and point out subtle issues of style and register."
            }
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            other => Err(format!(
                "Unknown difficulty '{other}'. Use beginner, intermediate, or advanced."
            )),
        }
    }
}

/// Next level after the learner wrote `user_message`.
///
/// Long messages or messages using `;`/`:` move one step up; very short
/// messages move one step down. The upward check runs first.
pub fn update_difficulty(current: Difficulty, user_message: &str) -> Difficulty {
    let word_count = user_message.split_whitespace().count();
    if word_count == 0 {
        return current;
    }

    if word_count >= UP_WORD_THRESHOLD || user_message.contains(';') || user_message.contains(':') {
        current.step_up()
    } else if word_count <= DOWN_WORD_THRESHOLD {
        current.step_down()
    } else {
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "",
        "   \t ",
        "hi",
        "I like apples very much",
        "Yesterday I went to the market and bought some fruit",
        "Note: this is short",
        "one; two",
        "This is a considerably longer sentence that I am writing in order to check how the tutor reacts to it today",
    ];

    #[test]
    fn empty_message_keeps_level() {
        for level in Difficulty::ALL {
            assert_eq!(update_difficulty(level, ""), level);
            assert_eq!(update_difficulty(level, "  \n "), level);
        }
    }

    #[test]
    fn short_messages_never_increase() {
        for level in Difficulty::ALL {
            for msg in ["hi", "how are you", "I am fine thank you"] {
                assert!(update_difficulty(level, msg) <= level);
            }
        }
        assert_eq!(
            update_difficulty(Difficulty::Advanced, "ok"),
            Difficulty::Intermediate
        );
        assert_eq!(
            update_difficulty(Difficulty::Beginner, "ok"),
            Difficulty::Beginner
        );
    }

    #[test]
    fn long_or_punctuated_messages_never_decrease() {
        let long = SAMPLES[7];
        assert!(long.split_whitespace().count() >= 20);
        for level in Difficulty::ALL {
            assert!(update_difficulty(level, long) >= level);
            assert!(update_difficulty(level, "Note: this is short") >= level);
            assert!(update_difficulty(level, "one; two") >= level);
        }
        assert_eq!(
            update_difficulty(Difficulty::Beginner, "one; two"),
            Difficulty::Intermediate
        );
        assert_eq!(
            update_difficulty(Difficulty::Advanced, long),
            Difficulty::Advanced
        );
    }

    #[test]
    fn mid_length_messages_keep_level() {
        let msg = SAMPLES[4];
        for level in Difficulty::ALL {
            assert_eq!(update_difficulty(level, msg), level);
        }
    }

    #[test]
    fn transitions_move_at_most_one_step() {
        for level in Difficulty::ALL {
            for msg in SAMPLES {
                let next = update_difficulty(level, msg);
                let distance = (next as i32 - level as i32).abs();
                assert!(distance <= 1, "{level} -> {next} for {msg:?}");
                assert!(Difficulty::ALL.contains(&next));
            }
        }
    }

    #[test]
    fn parses_levels_case_insensitively() {
        assert_eq!("Advanced".parse::<Difficulty>(), Ok(Difficulty::Advanced));
        assert!("expert".parse::<Difficulty>().is_err());
    }
}
