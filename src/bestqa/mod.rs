use crate::error::StoreError;
use crate::telegram::{ChatMember, User};
use chrono::{DateTime, Utc};
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// The stored "best tester of the day" for one chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastWinner {
    pub chat_title: String,
    pub last_datetime: DateTime<Utc>,
    pub winner: Winner,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Winner {
    pub user_id: i64,
    pub full_name: String,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChatStats {
    pub chat_title: String,
    pub winners: HashMap<String, WinnerStats>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WinnerStats {
    pub full_name: String,
    #[serde(default)]
    pub username: String,
    pub wins: u32,
}

/// JSON-backed winner history: `last_winner.json` holds the current day's
/// pick per chat, `best_qa_stats.json` accumulates win counts.
pub struct BestQaStore {
    last_winner_path: PathBuf,
    stats_path: PathBuf,
}

impl BestQaStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            last_winner_path: data_dir.join("last_winner.json"),
            stats_path: data_dir.join("best_qa_stats.json"),
        }
    }

    fn load_map<T: serde::de::DeserializeOwned>(path: &Path) -> HashMap<String, T> {
        let contents = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
            Err(e) => {
                tracing::error!("failed to read {}: {e}", path.display());
                return HashMap::new();
            }
        };
        match serde_json::from_str(&contents) {
            Ok(map) => map,
            Err(e) => {
                tracing::error!("corrupt store {}: {e}", path.display());
                HashMap::new()
            }
        }
    }

    fn save_map<T: Serialize>(path: &Path, map: &HashMap<String, T>) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::Write {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        }
        let json = serde_json::to_string_pretty(map).map_err(|e| StoreError::Write {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        fs::write(path, json).map_err(|e| StoreError::Write {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    pub fn last_winner(&self, chat_id: i64) -> Option<LastWinner> {
        Self::load_map::<LastWinner>(&self.last_winner_path).remove(&chat_id.to_string())
    }

    /// Whether the UTC date has rolled over since the chat's last pick.
    /// No record means a fresh day.
    pub fn is_new_day(&self, chat_id: i64) -> bool {
        match self.last_winner(chat_id) {
            Some(last) => Utc::now().date_naive() > last.last_datetime.date_naive(),
            None => true,
        }
    }

    pub fn record_winner(
        &self,
        chat_id: i64,
        chat_title: &str,
        winner: &Winner,
    ) -> Result<(), StoreError> {
        self.record_winner_at(chat_id, chat_title, winner, Utc::now())
    }

    pub fn record_winner_at(
        &self,
        chat_id: i64,
        chat_title: &str,
        winner: &Winner,
        when: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let key = chat_id.to_string();

        let mut last = Self::load_map::<LastWinner>(&self.last_winner_path);
        last.insert(
            key.clone(),
            LastWinner {
                chat_title: chat_title.to_string(),
                last_datetime: when,
                winner: winner.clone(),
            },
        );
        Self::save_map(&self.last_winner_path, &last)?;

        let mut stats = Self::load_map::<ChatStats>(&self.stats_path);
        let chat_stats = stats.entry(key).or_insert_with(|| ChatStats {
            chat_title: chat_title.to_string(),
            winners: HashMap::new(),
        });
        chat_stats.chat_title = chat_title.to_string();
        let entry = chat_stats
            .winners
            .entry(winner.user_id.to_string())
            .or_insert_with(|| WinnerStats {
                full_name: winner.full_name.clone(),
                username: winner.username.clone(),
                wins: 0,
            });
        entry.wins += 1;
        Self::save_map(&self.stats_path, &stats)
    }

    pub fn stats(&self, chat_id: i64) -> Option<ChatStats> {
        Self::load_map::<ChatStats>(&self.stats_path).remove(&chat_id.to_string())
    }
}

/// Pick a random non-bot user out of the chat's administrators.
pub fn pick_random_participant(members: &[ChatMember]) -> Option<&User> {
    let humans: Vec<&User> = members
        .iter()
        .map(|m| &m.user)
        .filter(|u| !u.is_bot)
        .collect();
    humans.choose(&mut rand::rng()).copied()
}

/// HTML mention that pings the user regardless of username visibility.
pub fn mention(user_id: i64, full_name: &str) -> String {
    format!(
        "<a href=\"tg://user?id={user_id}\">{}</a>",
        escape_html(full_name)
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Win-count summary for `/best_qa_stat`, most wins first.
pub fn format_stats(stats: &ChatStats) -> String {
    let mut winners: Vec<&WinnerStats> = stats.winners.values().collect();
    winners.sort_by(|a, b| b.wins.cmp(&a.wins).then(a.full_name.cmp(&b.full_name)));

    let mut lines = vec![format!(
        "Статистика победителей для чата: {}:",
        stats.chat_title
    )];
    for winner in winners {
        let username = if winner.username.is_empty() {
            String::new()
        } else {
            format!(" (@{})", winner.username)
        };
        lines.push(format!(
            "• {}{username}: {} побед(ы)",
            winner.full_name, winner.wins
        ));
    }
    lines.join("\n")
}
