use crate::directory::{Directory, Node, NodeKind};
use crate::telegram::{InlineKeyboardButton, InlineKeyboardMarkup};

/// Callback key that returns to the top-level menu.
pub const MAIN_MENU_KEY: &str = "main";

/// A parsed `menu:{user_id}:{key}` callback payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuCallback {
    pub user_id: String,
    pub key: String,
}

pub fn callback_data(user_id: i64, key: &str) -> String {
    format!("menu:{user_id}:{key}")
}

pub fn parse_callback(data: &str) -> Option<MenuCallback> {
    let mut parts = data.splitn(3, ':');
    if parts.next() != Some("menu") {
        return None;
    }
    let user_id = parts.next()?.to_string();
    let key = parts.next()?.to_string();
    Some(MenuCallback { user_id, key })
}

/// Top-level menu: every root leaf becomes a url button, every root section
/// a callback button opening its submenu.
pub fn main_menu(directory: &Directory, user_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: rows(&directory.roots, user_id),
    }
}

/// Submenu for the section with the given key, or None if the key is unknown.
/// Returns the keyboard and the section's display name.
pub fn submenu(
    directory: &Directory,
    key: &str,
    user_id: i64,
) -> Option<(InlineKeyboardMarkup, String)> {
    let section = directory.find_section(key)?;
    let NodeKind::Container { children } = &section.kind else {
        return None;
    };

    let mut keyboard = rows(children, user_id);
    keyboard.push(vec![InlineKeyboardButton::callback(
        "⬅️ Назад",
        callback_data(user_id, MAIN_MENU_KEY),
    )]);
    Some((
        InlineKeyboardMarkup {
            inline_keyboard: keyboard,
        },
        section.name.clone(),
    ))
}

fn rows(nodes: &[Node], user_id: i64) -> Vec<Vec<InlineKeyboardButton>> {
    let mut rows = Vec::with_capacity(nodes.len());
    for node in nodes {
        match &node.kind {
            NodeKind::Leaf { url, .. } => {
                rows.push(vec![InlineKeyboardButton::url(node.name.clone(), url)]);
            }
            NodeKind::Container { .. } => match &node.key {
                Some(key) => rows.push(vec![InlineKeyboardButton::callback(
                    node.name.clone(),
                    callback_data(user_id, key),
                )]),
                None => {
                    tracing::warn!(section = %node.name, "section without key, skipped in menu");
                }
            },
        }
    }
    rows
}
