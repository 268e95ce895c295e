mod types;

pub use types::{
    BotCommand, CallbackQuery, Chat, ChatMember, InlineKeyboardButton, InlineKeyboardMarkup,
    Message, Update, User,
};

#[cfg(test)]
mod tests;

use crate::error::TelegramError;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Thin client over the Telegram Bot API.
pub struct TelegramClient {
    bot_token: String,
    api_base: String,
    client: reqwest::Client,
}

/// Bot API response envelope: `{"ok": bool, "result": ..., "description": ...}`
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

/// An outbound `sendMessage` payload.
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    pub chat_id: i64,
    pub text: String,
    pub reply_to_message_id: Option<i64>,
    pub parse_mode: Option<&'static str>,
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl OutgoingMessage {
    pub fn text(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            reply_to_message_id: None,
            parse_mode: None,
            reply_markup: None,
        }
    }

    pub fn reply_to(mut self, message_id: i64) -> Self {
        self.reply_to_message_id = Some(message_id);
        self
    }

    pub fn html(mut self) -> Self {
        self.parse_mode = Some("HTML");
        self
    }

    pub fn with_markup(mut self, markup: InlineKeyboardMarkup) -> Self {
        self.reply_markup = Some(markup);
        self
    }

    fn into_body(self) -> Value {
        let mut body = json!({
            "chat_id": self.chat_id,
            "text": self.text,
        });
        if let Some(id) = self.reply_to_message_id {
            body["reply_to_message_id"] = json!(id);
        }
        if let Some(mode) = self.parse_mode {
            body["parse_mode"] = json!(mode);
        }
        if let Some(markup) = self.reply_markup {
            body["reply_markup"] = json!(markup);
        }
        body
    }
}

/// Scope for `setMyCommands`.
#[derive(Debug, Clone, Copy)]
pub enum CommandScope {
    Default,
    AllGroupChats,
}

impl CommandScope {
    fn as_value(self) -> Value {
        match self {
            Self::Default => json!({"type": "default"}),
            Self::AllGroupChats => json!({"type": "all_group_chats"}),
        }
    }
}

impl TelegramClient {
    pub fn new(bot_token: String) -> Self {
        Self {
            bot_token,
            api_base: DEFAULT_API_BASE.to_string(),
            client: reqwest::Client::builder()
                // Must sit above the long-poll timeout passed to getUpdates.
                .timeout(Duration::from_secs(60))
                .connect_timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    /// Point the client at a different API base (wiremock in tests).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.bot_token)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: Value,
    ) -> Result<T, TelegramError> {
        let response = self
            .client
            .post(self.api_url(method))
            .json(&body)
            .send()
            .await
            .map_err(|e| TelegramError::Request(e.to_string()))?;

        let status = response.status();
        let envelope: ApiEnvelope<T> = response
            .json()
            .await
            .map_err(|e| TelegramError::Request(format!("{method} decode failed: {e}")))?;

        if !envelope.ok {
            return Err(TelegramError::Api {
                method: method.to_string(),
                status: status.as_u16(),
                body: envelope
                    .description
                    .unwrap_or_else(|| "<no description>".into()),
            });
        }

        envelope.result.ok_or_else(|| TelegramError::Api {
            method: method.to_string(),
            status: status.as_u16(),
            body: "ok response without result".into(),
        })
    }

    // ── Methods the bot uses ─────────────────────────────────────

    pub async fn get_me(&self) -> Result<User, TelegramError> {
        self.call("getMe", json!({})).await
    }

    pub async fn delete_webhook(&self, drop_pending_updates: bool) -> Result<(), TelegramError> {
        let _: bool = self
            .call(
                "deleteWebhook",
                json!({"drop_pending_updates": drop_pending_updates}),
            )
            .await?;
        Ok(())
    }

    /// Long-poll for updates. `timeout_secs` is the server-side hold time.
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TelegramError> {
        self.call(
            "getUpdates",
            json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message", "callback_query"],
            }),
        )
        .await
    }

    pub async fn send_message(&self, message: OutgoingMessage) -> Result<Message, TelegramError> {
        self.call("sendMessage", message.into_body()).await
    }

    pub async fn forward_message(
        &self,
        chat_id: i64,
        from_chat_id: i64,
        message_id: i64,
    ) -> Result<Message, TelegramError> {
        self.call(
            "forwardMessage",
            json!({
                "chat_id": chat_id,
                "from_chat_id": from_chat_id,
                "message_id": message_id,
            }),
        )
        .await
    }

    pub async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        reply_markup: Option<&InlineKeyboardMarkup>,
    ) -> Result<(), TelegramError> {
        let mut body = json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": text,
        });
        if let Some(markup) = reply_markup {
            body["reply_markup"] = json!(markup);
        }
        // Result is the edited Message; the bot has no use for it.
        let _: Value = self.call("editMessageText", body).await?;
        Ok(())
    }

    pub async fn answer_callback_query(
        &self,
        callback_query_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<(), TelegramError> {
        let mut body = json!({
            "callback_query_id": callback_query_id,
            "show_alert": show_alert,
        });
        if let Some(text) = text {
            body["text"] = json!(text);
        }
        let _: bool = self.call("answerCallbackQuery", body).await?;
        Ok(())
    }

    pub async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), TelegramError> {
        let _: bool = self
            .call(
                "deleteMessage",
                json!({"chat_id": chat_id, "message_id": message_id}),
            )
            .await?;
        Ok(())
    }

    pub async fn get_chat_administrators(
        &self,
        chat_id: i64,
    ) -> Result<Vec<ChatMember>, TelegramError> {
        self.call("getChatAdministrators", json!({"chat_id": chat_id}))
            .await
    }

    pub async fn set_my_commands(
        &self,
        commands: &[BotCommand],
        scope: CommandScope,
    ) -> Result<(), TelegramError> {
        let _: bool = self
            .call(
                "setMyCommands",
                json!({"commands": commands, "scope": scope.as_value()}),
            )
            .await?;
        Ok(())
    }

    /// True if the invoking user is an administrator of the chat. Lookup
    /// failures are logged and treated as "not an admin".
    pub async fn is_chat_admin(&self, chat_id: i64, user_id: i64) -> bool {
        match self.get_chat_administrators(chat_id).await {
            Ok(admins) => admins.iter().any(|m| m.user.id == user_id),
            Err(e) => {
                tracing::error!(chat_id, user_id, "admin lookup failed: {e}");
                false
            }
        }
    }
}
