//! Terminal UI layer for tutor sessions.
//!
//! - [`chat_loop`]: the event loop that routes keys to [`crate::commands`]
//!   and the action handlers, and runs provider work in the background.
//! - [`renderer`] and [`views`]: frame output for the chat and the
//!   full-screen views.
//! - [`picker`]: highlight state shared by the list pickers.
//!
//! This layer presents and captures interaction state; [`crate::core`]
//! owns the tutoring logic and persistence.

pub mod chat_loop;
pub mod picker;
pub mod renderer;
pub mod views;
