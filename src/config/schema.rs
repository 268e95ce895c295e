use anyhow::{Context, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

// ── Top-level config ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Data directory (roster, winner stores) - computed from home, not serialized
    #[serde(skip)]
    pub data_dir: PathBuf,
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Telegram bot token from BotFather
    pub bot_token: Option<String>,

    #[serde(default)]
    pub features: FeaturesConfig,

    #[serde(default)]
    pub openai: OpenAiConfig,
}

// ── Feature flags ────────────────────────────────────────────────

/// Per-command switches plus the two message-handling flags.
///
/// Everything defaults to on; a disabled command stays registered in code but
/// answers with a stub (or stays silent where the command is admin-plumbing).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturesConfig {
    /// Answer free-text messages with matching documentation links
    #[serde(default = "default_true")]
    pub keyword_responses: bool,
    /// Suppress re-sending a link to the same chat within the cooldown window
    #[serde(default = "default_true")]
    pub recency_cooldown: bool,
    /// Cooldown window in seconds
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,

    #[serde(default = "default_true")]
    pub docs: bool,
    #[serde(default = "default_true")]
    pub help: bool,
    #[serde(default = "default_true")]
    pub announce: bool,
    #[serde(default = "default_true")]
    pub search: bool,
    #[serde(default = "default_true")]
    pub add_chat: bool,
    #[serde(default = "default_true")]
    pub remove_chat: bool,
    #[serde(default = "default_true")]
    pub best_qa: bool,
    #[serde(default = "default_true")]
    pub best_qa_stat: bool,
}

fn default_true() -> bool {
    true
}

fn default_cooldown_secs() -> u64 {
    300
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            keyword_responses: true,
            recency_cooldown: true,
            cooldown_secs: default_cooldown_secs(),
            docs: true,
            help: true,
            announce: true,
            search: true,
            add_chat: true,
            remove_chat: true,
            best_qa: true,
            best_qa_stat: true,
        }
    }
}

impl FeaturesConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

// ── OpenAI (/search proxy) ───────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_openai_model")]
    pub model: String,
    #[serde(default = "default_openai_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_openai_temperature")]
    pub temperature: f64,
    /// System prompt sent before every /search query
    #[serde(default = "default_openai_system_prompt")]
    pub system_prompt: String,
}

fn default_openai_model() -> String {
    "gpt-3.5-turbo".into()
}

fn default_openai_max_tokens() -> u32 {
    500
}

fn default_openai_temperature() -> f64 {
    0.7
}

fn default_openai_system_prompt() -> String {
    "Ты помощник команды тестирования мобильного банка. \
     Отвечай кратко и по делу, на русском языке."
        .into()
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_openai_model(),
            max_tokens: default_openai_max_tokens(),
            temperature: default_openai_temperature(),
            system_prompt: default_openai_system_prompt(),
        }
    }
}

// ── Load / save ──────────────────────────────────────────────────

impl Config {
    pub fn load_or_init() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("Could not find home directory")?;
        let docsbot_dir = home.join(".docsbot");
        let config_path = docsbot_dir.join("config.toml");

        if !docsbot_dir.exists() {
            fs::create_dir_all(&docsbot_dir).context("Failed to create .docsbot directory")?;
            fs::create_dir_all(docsbot_dir.join("data"))
                .context("Failed to create data directory")?;
        }

        let mut config = if config_path.exists() {
            let contents =
                fs::read_to_string(&config_path).context("Failed to read config file")?;
            let mut config: Config =
                toml::from_str(&contents).context("Failed to parse config file")?;
            // Set computed paths that are skipped during serialization
            config.config_path.clone_from(&config_path);
            config.data_dir = docsbot_dir.join("data");
            config
        } else {
            let config = Self {
                config_path: config_path.clone(),
                data_dir: docsbot_dir.join("data"),
                ..Self::default()
            };
            config.save()?;
            config
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to config
    pub fn apply_env_overrides(&mut self) {
        // Bot token: DOCSBOT_BOT_TOKEN or BOT_TOKEN
        if let Ok(token) = std::env::var("DOCSBOT_BOT_TOKEN").or_else(|_| std::env::var("BOT_TOKEN"))
        {
            if !token.is_empty() {
                self.bot_token = Some(token);
            }
        }

        // OpenAI key: DOCSBOT_OPENAI_API_KEY or OPENAI_API_KEY
        if let Ok(key) =
            std::env::var("DOCSBOT_OPENAI_API_KEY").or_else(|_| std::env::var("OPENAI_API_KEY"))
        {
            if !key.is_empty() {
                self.openai.api_key = Some(key);
            }
        }

        // Data directory: DOCSBOT_DATA_DIR
        if let Ok(dir) = std::env::var("DOCSBOT_DATA_DIR") {
            if !dir.is_empty() {
                self.data_dir = PathBuf::from(dir);
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&self.config_path, toml_str).context("Failed to write config file")?;
        Ok(())
    }
}
