pub mod app;
pub mod chat_stream;
pub mod config;
pub mod difficulty;
pub mod export;
pub mod message;
pub mod providers;
pub mod store;
pub mod summary;
pub mod tutor;
pub mod vocab_practice;
