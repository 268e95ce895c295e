use crate::bestqa::{self, BestQaStore, Winner};
use crate::commands::{self, ChatScope, CommandSpec};
use crate::config::Config;
use crate::directory::Directory;
use crate::error::ConfigError;
use crate::llm::OpenAiClient;
use crate::menu::{self, MAIN_MENU_KEY};
use crate::recency::RecencyFilter;
use crate::roster::ChatRoster;
use crate::telegram::{
    CallbackQuery, CommandScope, Message, OutgoingMessage, TelegramClient, Update,
};
use crate::intake;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

const POLL_TIMEOUT_SECS: u64 = 30;
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

const DISABLED_STUB: &str = "Команда временно отключена.";
const MENU_HEADER: &str = "Вот какие ссылки я знаю.\nВыберите из меню ниже:";

/// The assembled bot: directory, stores, clients and the dispatch loop.
pub struct App {
    config: Config,
    directory: Directory,
    filter: Arc<RecencyFilter>,
    roster: ChatRoster,
    bestqa: BestQaStore,
    telegram: TelegramClient,
    llm: OpenAiClient,
    commands: Vec<CommandSpec>,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let bot_token = config
            .bot_token
            .clone()
            .ok_or(ConfigError::MissingBotToken)?;

        let directory = Directory::load(&config.data_dir)?;
        let commands = commands::command_table(&config.features);
        Ok(Self {
            directory,
            filter: RecencyFilter::new(),
            roster: ChatRoster::new(&config.data_dir),
            bestqa: BestQaStore::new(&config.data_dir),
            telegram: TelegramClient::new(bot_token),
            llm: OpenAiClient::new(&config.openai),
            commands,
            config,
        })
    }

    /// Long-poll for updates until the process is stopped.
    pub async fn run(&self) -> Result<()> {
        let me = self.telegram.get_me().await?;
        let bot_username = me.username.clone().unwrap_or_default();
        tracing::info!(bot = %bot_username, "bot started");

        self.telegram.delete_webhook(true).await?;
        self.register_commands().await?;

        let mut offset: i64 = 0;
        loop {
            let updates = match self.telegram.get_updates(offset, POLL_TIMEOUT_SECS).await {
                Ok(updates) => updates,
                Err(e) => {
                    tracing::warn!("poll error: {e}");
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                if let Err(e) = self.handle_update(update, &bot_username).await {
                    tracing::error!("update handling failed: {e:#}");
                }
            }
        }
    }

    async fn register_commands(&self) -> Result<()> {
        self.telegram
            .set_my_commands(
                &commands::commands_for_scope(&self.commands, ChatScope::Private),
                CommandScope::Default,
            )
            .await?;
        self.telegram
            .set_my_commands(
                &commands::commands_for_scope(&self.commands, ChatScope::Group),
                CommandScope::AllGroupChats,
            )
            .await?;
        Ok(())
    }

    async fn handle_update(&self, update: Update, bot_username: &str) -> Result<()> {
        if let Some(message) = update.message {
            self.handle_message(message, bot_username).await?;
        } else if let Some(callback) = update.callback_query {
            self.handle_callback(callback).await?;
        }
        Ok(())
    }

    async fn handle_message(&self, message: Message, bot_username: &str) -> Result<()> {
        let Some(text) = message.text.clone() else {
            tracing::debug!(chat_id = message.chat.id, "non-text message, skipped");
            return Ok(());
        };

        if let Some((command, args)) = parse_command(&text, bot_username) {
            return self.dispatch_command(&message, command, args).await;
        }

        if !self.config.features.keyword_responses {
            return Ok(());
        }
        let hits = intake::handle(
            &self.directory,
            &self.filter,
            &self.config.features,
            message.chat.id,
            &text,
        );
        if hits.is_empty() {
            return Ok(());
        }
        self.telegram
            .send_message(
                OutgoingMessage::text(message.chat.id, intake::format_reply(&hits))
                    .reply_to(message.message_id),
            )
            .await?;
        Ok(())
    }

    async fn dispatch_command(&self, message: &Message, command: &str, args: &str) -> Result<()> {
        match command {
            "start" => self.cmd_start(message).await,
            "help" => self.cmd_help(message).await,
            "docs" => self.cmd_docs(message).await,
            "announce" => self.cmd_announce(message, args).await,
            "search" => self.cmd_search(message, args).await,
            "add_chat" => self.cmd_add_chat(message).await,
            "remove_chat" => self.cmd_remove_chat(message).await,
            "best_qa" => self.cmd_best_qa(message).await,
            "best_qa_stat" => self.cmd_best_qa_stat(message).await,
            other => {
                tracing::debug!(chat_id = message.chat.id, command = other, "unknown command");
                Ok(())
            }
        }
    }

    async fn answer(&self, message: &Message, text: impl Into<String>) -> Result<()> {
        self.telegram
            .send_message(OutgoingMessage::text(message.chat.id, text))
            .await?;
        Ok(())
    }

    // ── /start and /help ─────────────────────────────────────────

    async fn cmd_start(&self, message: &Message) -> Result<()> {
        let keyboard = crate::telegram::InlineKeyboardMarkup {
            inline_keyboard: vec![vec![crate::telegram::InlineKeyboardButton::callback(
                "Список команд",
                "help",
            )]],
        };
        self.telegram
            .send_message(
                OutgoingMessage::text(
                    message.chat.id,
                    "Привет! Я бот, который поможет найти ссылки на полезную документацию \
                     или разобраться в процессах тестирования МБ СМБ.\n\
                     Выберите 'Список команд' что бы узнать что я умею",
                )
                .with_markup(keyboard),
            )
            .await?;
        Ok(())
    }

    async fn cmd_help(&self, message: &Message) -> Result<()> {
        if !self.config.features.help {
            return Ok(());
        }
        self.send_help(message.chat.id, chat_scope(message)).await
    }

    async fn send_help(&self, chat_id: i64, scope: ChatScope) -> Result<()> {
        let text = commands::help_text(&self.commands, scope)
            .unwrap_or_else(|| "Нет доступных команд для вашего чата.".into());
        self.telegram
            .send_message(OutgoingMessage::text(chat_id, text))
            .await?;
        Ok(())
    }

    // ── /docs menu ───────────────────────────────────────────────

    async fn cmd_docs(&self, message: &Message) -> Result<()> {
        if !self.config.features.docs {
            return self.answer(message, DISABLED_STUB).await;
        }
        let user_id = message.from.as_ref().map_or(0, |u| u.id);
        let keyboard = menu::main_menu(&self.directory, user_id);
        if keyboard.inline_keyboard.is_empty() {
            tracing::warn!("documentation menu is empty");
            return self
                .answer(
                    message,
                    "Меню временно недоступно. Обратитесь к администратору.",
                )
                .await;
        }
        self.telegram
            .send_message(
                OutgoingMessage::text(message.chat.id, MENU_HEADER).with_markup(keyboard),
            )
            .await?;
        Ok(())
    }

    // ── /announce ────────────────────────────────────────────────

    async fn cmd_announce(&self, message: &Message, args: &str) -> Result<()> {
        if !self.config.features.announce {
            return self.answer(message, DISABLED_STUB).await;
        }

        let chats = self.roster.active();
        if chats.is_empty() {
            return self.answer(message, "Нет активных чатов для отправки.").await;
        }

        let announce_text = (!args.is_empty()).then(|| args.to_string());
        let forwarded = message.reply_to_message.as_deref();
        if announce_text.is_none() && forwarded.is_none() {
            return self
                .answer(
                    message,
                    "Пожалуйста, укажите текст для рассылки или \
                     ответьте на сообщение для пересылки.\n\
                     Пример: /announce Текст рассылки или \
                     /announce в ответ на сообщение.",
                )
                .await;
        }

        for chat in &chats {
            if let Some(text) = &announce_text {
                if let Err(e) = self
                    .telegram
                    .send_message(OutgoingMessage::text(chat.id, text.clone()))
                    .await
                {
                    tracing::warn!(chat_id = chat.id, title = %chat.title, "announce failed: {e}");
                    continue;
                }
            }
            if let Some(original) = forwarded {
                if let Err(e) = self
                    .telegram
                    .forward_message(chat.id, original.chat.id, original.message_id)
                    .await
                {
                    tracing::warn!(chat_id = chat.id, title = %chat.title, "forward failed: {e}");
                }
            }
        }

        self.answer(message, "Сообщение отправлено во все активные чаты.")
            .await
    }

    // ── /search LLM proxy ────────────────────────────────────────

    async fn cmd_search(&self, message: &Message, args: &str) -> Result<()> {
        if !self.config.features.search {
            return self.answer(message, DISABLED_STUB).await;
        }
        if args.is_empty() {
            return self
                .answer(
                    message,
                    "Пожалуйста, укажите текст запроса.\n\
                     Пример: /search Как работает OpenAI?",
                )
                .await;
        }

        self.answer(message, "Обрабатываю ваш запрос...").await?;
        match self.llm.ask(args).await {
            Ok(text) => self.answer(message, text).await,
            Err(e) => {
                tracing::error!("search query failed: {e}");
                self.answer(
                    message,
                    "Произошла ошибка при обработке запроса. Попробуйте позже.",
                )
                .await
            }
        }
    }

    // ── roster management ────────────────────────────────────────

    /// Both roster commands are admin plumbing: the invoking message is
    /// deleted, a non-admin caller gets no reply at all.
    async fn roster_preamble(&self, message: &Message, enabled: bool) -> Result<Option<String>> {
        if let Err(e) = self
            .telegram
            .delete_message(message.chat.id, message.message_id)
            .await
        {
            tracing::error!(chat_id = message.chat.id, "failed to delete command message: {e}");
        }
        if !enabled {
            return Ok(None);
        }
        let Some(user) = message.from.as_ref() else {
            return Ok(None);
        };
        if !self.telegram.is_chat_admin(message.chat.id, user.id).await {
            tracing::debug!(chat_id = message.chat.id, user_id = user.id, "not an admin");
            return Ok(None);
        }
        Ok(Some(user.handle()))
    }

    async fn cmd_add_chat(&self, message: &Message) -> Result<()> {
        let Some(added_by) = self
            .roster_preamble(message, self.config.features.add_chat)
            .await?
        else {
            return Ok(());
        };
        let title = message.chat.title.clone().unwrap_or_else(|| "Личный чат".into());
        self.roster.add(message.chat.id, &title, &added_by)?;
        Ok(())
    }

    async fn cmd_remove_chat(&self, message: &Message) -> Result<()> {
        let Some(deleted_by) = self
            .roster_preamble(message, self.config.features.remove_chat)
            .await?
        else {
            return Ok(());
        };
        self.roster.remove(message.chat.id, &deleted_by)?;
        Ok(())
    }

    // ── best tester of the day ───────────────────────────────────

    async fn cmd_best_qa(&self, message: &Message) -> Result<()> {
        if !self.config.features.best_qa {
            return self.answer(message, DISABLED_STUB).await;
        }
        if message.chat.is_private() {
            return self
                .answer(
                    message,
                    "Выбор лучшего тестировщика возможен только в групповых чатах.",
                )
                .await;
        }

        if !self.bestqa.is_new_day(message.chat.id) {
            let Some(last) = self.bestqa.last_winner(message.chat.id) else {
                return self
                    .answer(
                        message,
                        "Данные о лучшем тестировщике отсутствуют. Попробуйте выбрать заново.",
                    )
                    .await;
            };
            let mention = bestqa::mention(last.winner.user_id, &last.winner.full_name);
            self.telegram
                .send_message(
                    OutgoingMessage::text(
                        message.chat.id,
                        format!("Сегодня лучший тестировщик уже выбран: {mention} 🎉"),
                    )
                    .html(),
                )
                .await?;
            return Ok(());
        }

        let members = self
            .telegram
            .get_chat_administrators(message.chat.id)
            .await?;
        let Some(picked) = bestqa::pick_random_participant(&members) else {
            return self.answer(message, "Не нашёл участников для выбора.").await;
        };

        let title = message.chat.title.clone().unwrap_or_else(|| "Личный чат".into());
        let winner = Winner {
            user_id: picked.id,
            full_name: picked.full_name(),
            username: picked.username.clone().unwrap_or_default(),
        };
        self.bestqa.record_winner(message.chat.id, &title, &winner)?;

        let mention = bestqa::mention(winner.user_id, &winner.full_name);
        self.telegram
            .send_message(
                OutgoingMessage::text(
                    message.chat.id,
                    format!("Сегодня лучший тестировщик {mention} 🎉"),
                )
                .html(),
            )
            .await?;
        Ok(())
    }

    async fn cmd_best_qa_stat(&self, message: &Message) -> Result<()> {
        if !self.config.features.best_qa_stat {
            return self.answer(message, DISABLED_STUB).await;
        }
        if message.chat.is_private() {
            return self
                .answer(message, "Статистика доступна только для групповых чатов.")
                .await;
        }

        match self.bestqa.stats(message.chat.id) {
            Some(stats) if !stats.winners.is_empty() => {
                self.answer(message, bestqa::format_stats(&stats)).await
            }
            _ => {
                self.answer(message, "Статистика по лучшим тестировщикам пока пуста.")
                    .await
            }
        }
    }

    // ── callback queries ─────────────────────────────────────────

    async fn handle_callback(&self, callback: CallbackQuery) -> Result<()> {
        let Some(data) = callback.data.clone() else {
            return Ok(());
        };

        if data == "help" {
            if let Some(origin) = &callback.message {
                self.send_help(origin.chat.id, chat_scope(origin)).await?;
            }
            self.telegram
                .answer_callback_query(&callback.id, None, false)
                .await?;
            return Ok(());
        }

        let Some(parsed) = menu::parse_callback(&data) else {
            tracing::error!(%data, "malformed callback data");
            self.telegram
                .answer_callback_query(&callback.id, Some("Некорректные данные кнопки."), false)
                .await?;
            return Ok(());
        };
        let Some(origin) = &callback.message else {
            return Ok(());
        };
        let user_id = parsed.user_id.parse().unwrap_or(callback.from.id);

        if parsed.key == MAIN_MENU_KEY {
            let keyboard = menu::main_menu(&self.directory, user_id);
            self.telegram
                .edit_message_text(origin.chat.id, origin.message_id, MENU_HEADER, Some(&keyboard))
                .await?;
        } else {
            match menu::submenu(&self.directory, &parsed.key, user_id) {
                Some((keyboard, section_name)) if !keyboard.inline_keyboard.is_empty() => {
                    self.telegram
                        .edit_message_text(
                            origin.chat.id,
                            origin.message_id,
                            &format!("Раздел: {section_name}:\nВыберите из меню ниже:"),
                            Some(&keyboard),
                        )
                        .await?;
                }
                _ => {
                    self.telegram
                        .answer_callback_query(&callback.id, Some("Этот раздел пуст."), true)
                        .await?;
                    return Ok(());
                }
            }
        }

        self.telegram
            .answer_callback_query(&callback.id, None, false)
            .await?;
        Ok(())
    }
}

fn chat_scope(message: &Message) -> ChatScope {
    if message.chat.is_private() {
        ChatScope::Private
    } else {
        ChatScope::Group
    }
}

/// Split `/command@bot args` into the command name and its argument tail.
/// Returns None for anything that is not a command addressed to this bot.
fn parse_command<'a>(text: &'a str, bot_username: &str) -> Option<(&'a str, &'a str)> {
    let text = text.trim();
    let rest = text.strip_prefix('/')?;

    let (head, args) = match rest.split_once(char::is_whitespace) {
        Some((head, args)) => (head, args.trim()),
        None => (rest, ""),
    };

    let command = match head.split_once('@') {
        Some((command, addressee)) => {
            if !bot_username.is_empty() && !addressee.eq_ignore_ascii_case(bot_username) {
                return None;
            }
            command
        }
        None => head,
    };

    if command.is_empty() {
        return None;
    }
    Some((command, args))
}
