//! A terminal English tutor backed by OpenAI or Gemini.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns session state, the tutor prompt, difficulty tracking,
//!   the provider adapters, vocabulary practice and the SQLite store.
//! - [`ui`] renders the terminal interface and runs the event loop that
//!   drives input, streaming replies and redraws.
//! - [`commands`] implements slash-command parsing and execution.
//! - [`api`] defines the request and response payloads of both backends.
//!
//! The binary routes through [`crate::cli::main`], which handles the
//! configuration subcommands or starts [`ui::chat_loop`].

pub mod api;
pub mod cli;
pub mod commands;
pub mod core;
pub mod ui;
pub mod utils;
