//! Main chat event loop and key handling.

mod event_loop;
mod executors;
mod keybindings;
mod lifecycle;
mod modes;
mod setup;

pub use event_loop::run_chat;
pub use setup::{default_db_path, ChatOptions};
