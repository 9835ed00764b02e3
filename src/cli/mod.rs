//! Command-line interface parsing and handling.
//!
//! Without a subcommand the tutor opens the interactive chat. `set`,
//! `unset` and `config` edit or print the configuration file and exit.

pub mod settings;

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::warn;

use crate::core::config::Config;
use crate::core::providers::ProviderKind;
use crate::ui::chat_loop::{run_chat, ChatOptions};
use crate::utils::logging::init_logging;

#[derive(Parser, Debug)]
#[command(name = "english-tutor")]
#[command(version, about = "A terminal English tutor backed by OpenAI or Gemini")]
#[command(
    long_about = "english-tutor is a full-screen terminal chat with an English tutor. \
It adapts to your level, keeps your sessions and saved vocabulary in a local \
database, and quizzes you on the words you save.\n\n\
Environment Variables (used when no api-key is configured):\n\
  OPENAI_API_KEY    Key for the openai provider\n\
  GEMINI_API_KEY    Key for the gemini provider\n\
  TUTOR_LOG         Log filter, e.g. debug or english_tutor=trace (default: warn)\n\n\
Controls:\n\
  Enter             Send the message or run the command\n\
  Alt+Enter         Insert a new line\n\
  Ctrl+P            Open the command palette\n\
  Ctrl+O            Choose a model\n\
  Ctrl+C            Stop the reply, or quit when idle\n\n\
Type /help inside the tutor for the list of commands."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Provider for this run (openai or gemini)
    #[arg(short = 'p', long, global = true, value_name = "PROVIDER")]
    pub provider: Option<ProviderKind>,

    /// Model for this run
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Write diagnostics to this file instead of the default log file
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Progress database to use
    #[arg(long, global = true, value_name = "FILE")]
    pub db: Option<PathBuf>,

    /// Resume the session whose id starts with this prefix
    #[arg(short = 'r', long, global = true, value_name = "ID_PREFIX")]
    pub resume: Option<String>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the tutor (default)
    Chat,
    /// Set a configuration value
    Set {
        /// Configuration key (provider, api-key, model, summary-model, base-url, export-dir)
        key: String,
        /// Value to set; several words are joined with spaces
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Remove a configuration value
    Unset {
        /// Configuration key to unset
        key: String,
    },
    /// Print the current configuration
    Config,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let config_path = Config::default_path();

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Set { key, value } => {
            let path = settings::require_path(config_path)?;
            let message = settings::set_value(&path, &key, &value.join(" "))?;
            println!("✅ {message}");
            Ok(())
        }
        Commands::Unset { key } => {
            let path = settings::require_path(config_path)?;
            let message = settings::unset_value(&path, &key)?;
            println!("✅ {message}");
            Ok(())
        }
        Commands::Config => {
            let config = match &config_path {
                Some(path) => Config::load_from_path(path)?,
                None => Config::default(),
            };
            config.print_all();
            Ok(())
        }
        Commands::Chat => {
            if let Err(err) = init_logging(args.log.as_deref()) {
                eprintln!("⚠️  Logging disabled: {err}");
            }
            let result = run_chat(ChatOptions {
                provider: args.provider,
                model: args.model,
                db: args.db,
                resume: args.resume,
                config_path,
            })
            .await;
            if let Err(err) = &result {
                warn!(error = %err, "tutor stopped with an error");
            }
            result
        }
    }
}

#[cfg(test)]
mod tests;
