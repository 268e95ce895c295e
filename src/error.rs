use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for the bot.
///
/// Each subsystem defines its own error variant. Callers can match on these to
/// decide recovery strategy; internal code continues to use `anyhow::Result`
/// for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum BotError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Link directory ───────────────────────────────────────────────────
    #[error("directory: {0}")]
    Directory(#[from] DirectoryError),

    // ── JSON stores (roster, winners) ────────────────────────────────────
    #[error("store: {0}")]
    Store(#[from] StoreError),

    // ── Telegram Bot API ─────────────────────────────────────────────────
    #[error("telegram: {0}")]
    Telegram(#[from] TelegramError),

    // ── LLM proxy ────────────────────────────────────────────────────────
    #[error("llm: {0}")]
    Llm(#[from] LlmError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("bot token not set. Set BOT_TOKEN or edit config.toml.")]
    MissingBotToken,

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Link directory errors ──────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("failed to parse link directory: {0}")]
    Parse(String),

    #[error("directory is empty after validation")]
    Empty,
}

// ─── Store errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to write {path}: {message}")]
    Write { path: String, message: String },
}

// ─── Telegram errors ────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("{method} failed ({status}): {body}")]
    Api {
        method: String,
        status: u16,
        body: String,
    },

    #[error("request failed: {0}")]
    Request(String),
}

// ─── LLM errors ─────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("OpenAI request failed: {0}")]
    Request(String),

    #[error("OpenAI API key not set. Set OPENAI_API_KEY or edit config.toml.")]
    MissingKey,

    #[error("empty response from OpenAI")]
    EmptyResponse,
}

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, BotError>;
