#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::return_self_not_must_use
)]

pub mod app;
pub mod bestqa;
pub mod commands;
pub mod config;
pub mod directory;
pub mod error;
pub mod intake;
pub mod llm;
pub mod menu;
pub mod recency;
pub mod roster;
pub mod telegram;

pub use app::App;
pub use config::Config;
pub use error::{BotError, Result};
