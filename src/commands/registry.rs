use super::handlers::{config, core, io, session, vocab};
use super::CommandResult;
use crate::core::app::App;

pub type CommandHandler = fn(&mut App, CommandInvocation<'_>) -> CommandResult;
pub type DisabledReason = fn(&App) -> Option<&'static str>;
pub type ArgHints = fn(&App) -> Vec<ArgHint>;

pub struct Command {
    /// Name without the leading slash.
    pub name: &'static str,
    pub usage: &'static str,
    pub description: &'static str,
    pub palette_visible: bool,
    pub disabled_reason: Option<DisabledReason>,
    pub arg_hints: Option<ArgHints>,
    pub handler: CommandHandler,
}

/// One suggested argument string shown in the palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgHint {
    pub value: String,
    pub description: String,
}

impl ArgHint {
    pub fn new(value: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            description: description.into(),
        }
    }
}

#[derive(Clone, Copy)]
pub struct CommandInvocation<'a> {
    pub input: &'a str,
    /// Everything after the command token, trimmed.
    pub args: &'a str,
}

impl<'a> CommandInvocation<'a> {
    pub fn tokens(&self) -> Vec<&'a str> {
        self.args.split_whitespace().collect()
    }

    pub fn arg(&self, index: usize) -> Option<&'a str> {
        self.args.split_whitespace().nth(index)
    }

    pub fn args_len(&self) -> usize {
        self.args.split_whitespace().count()
    }
}

pub fn all_commands() -> &'static [Command] {
    COMMANDS
}

/// Exact, case-sensitive lookup by name without the slash.
pub fn find_command(name: &str) -> Option<&'static Command> {
    all_commands().iter().find(|command| command.name == name)
}

fn requires_api_key(app: &App) -> Option<&'static str> {
    if app.has_api_key() {
        None
    } else {
        Some("no API key configured")
    }
}

const COMMANDS: &[Command] = &[
    Command {
        name: "help",
        usage: "/help",
        description: "Show commands and keyboard shortcuts",
        palette_visible: true,
        disabled_reason: None,
        arg_hints: None,
        handler: core::handle_help,
    },
    Command {
        name: "clear",
        usage: "/clear [--new-session]",
        description: "Clear the conversation (optionally start a new session)",
        palette_visible: true,
        disabled_reason: None,
        arg_hints: Some(core::clear_hints),
        handler: core::handle_clear,
    },
    Command {
        name: "config",
        usage: "/config [summary-model [<model>|--reset]]",
        description: "Show settings or change the summary model",
        palette_visible: true,
        disabled_reason: None,
        arg_hints: Some(config::config_hints),
        handler: config::handle_config,
    },
    Command {
        name: "difficulty",
        usage: "/difficulty [beginner|intermediate|advanced]",
        description: "Show or set the difficulty level",
        palette_visible: true,
        disabled_reason: None,
        arg_hints: Some(core::difficulty_hints),
        handler: core::handle_difficulty,
    },
    Command {
        name: "mode",
        usage: "/mode [general|grammar|vocab|role-play|fluency|exam]",
        description: "Pick or set the practice mode",
        palette_visible: true,
        disabled_reason: None,
        arg_hints: Some(core::mode_hints),
        handler: core::handle_mode,
    },
    Command {
        name: "export",
        usage: "/export [md|txt|json]",
        description: "Export the conversation to a file",
        palette_visible: true,
        disabled_reason: None,
        arg_hints: Some(io::export_hints),
        handler: io::handle_export,
    },
    Command {
        name: "history",
        usage: "/history",
        description: "Browse saved sessions",
        palette_visible: true,
        disabled_reason: None,
        arg_hints: None,
        handler: session::handle_history,
    },
    Command {
        name: "resume",
        usage: "/resume [session-id-prefix]",
        description: "Continue a saved session",
        palette_visible: true,
        disabled_reason: None,
        arg_hints: Some(session::session_hints),
        handler: session::handle_resume,
    },
    Command {
        name: "rename",
        usage: "/rename <session-id-prefix> <title>",
        description: "Rename a saved session",
        palette_visible: false,
        disabled_reason: None,
        arg_hints: Some(session::session_hints),
        handler: session::handle_rename,
    },
    Command {
        name: "summary",
        usage: "/summary [--regenerate]",
        description: "Show or generate a summary of this session",
        palette_visible: true,
        disabled_reason: Some(requires_api_key),
        arg_hints: Some(session::summary_hints),
        handler: session::handle_summary,
    },
    Command {
        name: "save",
        usage: "/save <word1, word2, ...> [collection] [--def \"text\"]",
        description: "Save words to your vocabulary",
        palette_visible: true,
        disabled_reason: None,
        arg_hints: None,
        handler: vocab::handle_save,
    },
    Command {
        name: "vocab",
        usage: "/vocab [list|stats|collections|practice] [collection] [--type|--mc]",
        description: "List, inspect or practise saved words",
        palette_visible: true,
        disabled_reason: None,
        arg_hints: Some(vocab::vocab_hints),
        handler: vocab::handle_vocab,
    },
    Command {
        name: "stats",
        usage: "/stats",
        description: "Show your learning statistics",
        palette_visible: true,
        disabled_reason: None,
        arg_hints: None,
        handler: core::handle_stats,
    },
    Command {
        name: "models",
        usage: "/models",
        description: "Choose the chat model",
        palette_visible: true,
        disabled_reason: Some(requires_api_key),
        arg_hints: None,
        handler: config::handle_models,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_exact_and_case_sensitive() {
        assert!(find_command("help").is_some());
        assert!(find_command("Help").is_none());
        assert!(find_command("hel").is_none());
    }

    #[test]
    fn command_names_are_unique() {
        let mut names: Vec<_> = all_commands().iter().map(|c| c.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), all_commands().len());
    }

    #[test]
    fn invocation_splits_arguments_on_whitespace() {
        let invocation = CommandInvocation {
            input: "/vocab practice  fruits --mc",
            args: "practice  fruits --mc",
        };
        assert_eq!(invocation.tokens(), vec!["practice", "fruits", "--mc"]);
        assert_eq!(invocation.arg(1), Some("fruits"));
        assert_eq!(invocation.args_len(), 3);
    }
}
