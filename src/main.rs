#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

use anyhow::Result;
use clap::Parser;
use docsbot::directory::{Directory, Node, NodeKind};
use docsbot::telegram::TelegramClient;
use docsbot::{App, Config};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod cli;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let config = Config::load_or_init()?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config).await,
        Commands::Doctor => doctor(config).await,
        Commands::CheckLinks => check_links(&config),
    }
}

async fn run(config: Config) -> Result<()> {
    let app = App::new(config)?;
    app.run().await
}

/// Quick sanity pass over config, catalog and Telegram connectivity.
async fn doctor(config: Config) -> Result<()> {
    println!("config: {}", config.config_path.display());
    println!("data dir: {}", config.data_dir.display());

    match Directory::load(&config.data_dir) {
        Ok(directory) => println!("link catalog: ok ({} top-level entries)", directory.roots.len()),
        Err(e) => println!("link catalog: FAILED ({e})"),
    }

    match &config.openai.api_key {
        Some(_) => println!("openai key: set"),
        None => println!("openai key: not set (/search will be unavailable)"),
    }

    let Some(token) = config.bot_token.clone() else {
        println!("bot token: NOT SET (set BOT_TOKEN or edit config.toml)");
        return Ok(());
    };
    let telegram = TelegramClient::new(token);
    match telegram.get_me().await {
        Ok(me) => println!(
            "telegram: ok (@{})",
            me.username.unwrap_or_else(|| me.first_name.clone())
        ),
        Err(e) => println!("telegram: FAILED ({e})"),
    }
    Ok(())
}

/// Print the compiled link catalog as an indented tree.
fn check_links(config: &Config) -> Result<()> {
    let directory = Directory::load(&config.data_dir)?;
    for node in &directory.roots {
        print_node(node, 0);
    }
    Ok(())
}

fn print_node(node: &Node, depth: usize) {
    let indent = "  ".repeat(depth);
    match &node.kind {
        NodeKind::Leaf { url, patterns } => {
            println!("{indent}{} -> {url} ({} patterns)", node.name, patterns.len());
        }
        NodeKind::Container { children } => {
            println!("{indent}{}/", node.name);
            for child in children {
                print_node(child, depth + 1);
            }
        }
    }
}
