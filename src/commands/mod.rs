use crate::config::FeaturesConfig;
use crate::telegram::BotCommand;

/// Which chat type a command list is being built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatScope {
    Private,
    Group,
}

/// One bot command with its registration and visibility rules.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub private_chat: bool,
    pub group_chat: bool,
    pub visible_in_help: bool,
}

impl CommandSpec {
    fn in_scope(&self, scope: ChatScope) -> bool {
        match scope {
            ChatScope::Private => self.private_chat,
            ChatScope::Group => self.group_chat,
        }
    }
}

/// The full command table for the current feature flags. Disabled commands are
/// absent: they are neither registered with Telegram nor listed in /help.
pub fn command_table(features: &FeaturesConfig) -> Vec<CommandSpec> {
    let mut commands = Vec::new();
    let mut add = |name, description, enabled, private_chat, group_chat, visible_in_help| {
        if enabled {
            commands.push(CommandSpec {
                name,
                description,
                private_chat,
                group_chat,
                visible_in_help,
            });
        }
    };

    add("help", "Получить справку", features.help, true, true, false);
    add(
        "docs",
        "Открыть документацию",
        features.docs,
        true,
        true,
        true,
    );
    add(
        "announce",
        "Сделать объявление",
        features.announce,
        true,
        false,
        true,
    );
    add(
        "search",
        "Спросить chatGPT о тестировании",
        features.search,
        true,
        true,
        true,
    );
    add(
        "add_chat",
        "Добавить чат в список рассылки анонсов",
        features.add_chat,
        false,
        false,
        false,
    );
    add(
        "remove_chat",
        "Удалить чат из списка рассылки анонсов",
        features.remove_chat,
        false,
        false,
        false,
    );
    add(
        "best_qa",
        "Выбрать лучшего тестировщика дня",
        features.best_qa,
        false,
        true,
        true,
    );
    add(
        "best_qa_stat",
        "Получить список победителей тестировщика дня",
        features.best_qa_stat,
        false,
        true,
        true,
    );
    commands
}

/// Commands to register with `setMyCommands` for the given scope.
pub fn commands_for_scope(table: &[CommandSpec], scope: ChatScope) -> Vec<BotCommand> {
    table
        .iter()
        .filter(|c| c.in_scope(scope))
        .map(|c| BotCommand {
            command: c.name.to_string(),
            description: c.description.to_string(),
        })
        .collect()
}

/// The /help text for the given chat type, or None when nothing is visible.
pub fn help_text(table: &[CommandSpec], scope: ChatScope) -> Option<String> {
    let visible: Vec<&CommandSpec> = table
        .iter()
        .filter(|c| c.in_scope(scope) && c.visible_in_help)
        .collect();
    if visible.is_empty() {
        return None;
    }

    let mut text = String::from("Привет! Вот список доступных команд:\n\n");
    for command in visible {
        text.push_str(&format!("/{} — {}\n", command.name, command.description));
    }
    Some(text)
}
