use clap::{Parser, Subcommand};

/// Telegram assistant for the mobile-bank QA team.
#[derive(Parser, Debug)]
#[command(name = "docsbot")]
#[command(version = "0.1.0")]
#[command(about = "Documentation and process assistant for QA chats.", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the bot (default)
    Run,

    /// Check configuration and Telegram connectivity
    Doctor,

    /// Validate the link catalog and print its contents
    CheckLinks,
}
