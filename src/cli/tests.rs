use super::*;
use crate::core::config::Config;
use std::fs;
use tempfile::TempDir;

mod test_helpers {
    use super::*;

    pub(super) fn parse_args(argv: &[&str]) -> Args {
        Args::try_parse_from(argv)
            .unwrap_or_else(|err| panic!("argv={argv:?} should parse successfully: {err}"))
    }

    pub(super) fn config_in(dir: &TempDir) -> std::path::PathBuf {
        dir.path().join("config.toml")
    }
}

use test_helpers::*;

#[test]
fn no_subcommand_means_chat() {
    let args = parse_args(&["english-tutor"]);
    assert!(args.command.is_none());
    assert!(args.provider.is_none());
}

#[test]
fn global_flags_parse_alongside_chat() {
    let argv = [
        "english-tutor",
        "chat",
        "--provider",
        "gemini",
        "-m",
        "gemini-2.0-flash",
        "--db",
        "/tmp/tutor.db",
        "--log",
        "/tmp/tutor.log",
    ];
    let args = parse_args(&argv);
    assert_eq!(args.command, Some(Commands::Chat));
    assert_eq!(args.provider, Some(ProviderKind::Gemini));
    assert_eq!(args.model.as_deref(), Some("gemini-2.0-flash"));
    assert_eq!(args.db, Some(PathBuf::from("/tmp/tutor.db")));
    assert_eq!(args.log, Some(PathBuf::from("/tmp/tutor.log")));
}

#[test]
fn resume_takes_a_prefix() {
    let args = parse_args(&["english-tutor", "--resume", "3fa8"]);
    assert_eq!(args.resume.as_deref(), Some("3fa8"));
}

#[test]
fn unknown_provider_is_rejected() {
    assert!(Args::try_parse_from(["english-tutor", "--provider", "claude"]).is_err());
}

#[test]
fn set_collects_multi_word_values() {
    let args = parse_args(&["english-tutor", "set", "export-dir", "My", "Exports"]);
    assert_eq!(
        args.command,
        Some(Commands::Set {
            key: "export-dir".into(),
            value: vec!["My".into(), "Exports".into()],
        })
    );
}

#[test]
fn set_then_unset_round_trips_through_the_file() {
    let dir = TempDir::new().unwrap();
    let path = config_in(&dir);

    let message = settings::set_value(&path, "model", "gpt-4o").unwrap();
    assert_eq!(message, "model set to gpt-4o");
    settings::set_value(&path, "api-key", "sk-test").unwrap();

    let config = Config::load_from_path(&path).unwrap();
    assert_eq!(config.model.as_deref(), Some("gpt-4o"));
    assert_eq!(config.api_key.as_deref(), Some("sk-test"));

    settings::unset_value(&path, "model").unwrap();
    let config = Config::load_from_path(&path).unwrap();
    assert!(config.model.is_none());
    assert_eq!(config.api_key.as_deref(), Some("sk-test"));
}

#[test]
fn invalid_settings_leave_the_file_alone() {
    let dir = TempDir::new().unwrap();
    let path = config_in(&dir);
    settings::set_value(&path, "model", "gpt-4o").unwrap();
    let before = fs::read_to_string(&path).unwrap();

    assert!(settings::set_value(&path, "colour", "blue").is_err());
    assert!(settings::set_value(&path, "provider", "claude").is_err());
    assert!(settings::set_value(&path, "model", "  ").is_err());
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn missing_config_directory_is_an_error() {
    assert!(settings::require_path(None).is_err());
}

#[test]
fn resume_is_accepted_after_the_chat_subcommand() {
    let args = parse_args(&["english-tutor", "chat", "--resume", "3fa8"]);
    assert_eq!(args.command, Some(Commands::Chat));
    assert_eq!(args.resume.as_deref(), Some("3fa8"));
}
