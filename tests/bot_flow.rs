//! End-to-end flows over the public crate API: catalog loading, keyword
//! replies with the cooldown window, roster persistence and winner history.

use std::time::Duration;

use docsbot::bestqa::{self, BestQaStore, Winner};
use docsbot::commands::{self, ChatScope};
use docsbot::config::FeaturesConfig;
use docsbot::directory::Directory;
use docsbot::intake;
use docsbot::menu;
use docsbot::recency::RecencyFilter;
use docsbot::roster::{AddOutcome, ChatRoster};
use tempfile::tempdir;

const CHAT: i64 = -1_001_234;

#[tokio::test(start_paused = true)]
async fn keyword_reply_respects_cooldown_window() {
    let directory = Directory::builtin().unwrap();
    let filter = RecencyFilter::new();
    let features = FeaturesConfig::default();

    // First mention gets the Charles setup link.
    let hits = intake::handle(&directory, &filter, &features, CHAT, "как настроить чарльз?");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "Настройка Charles");

    let reply = intake::format_reply(&hits);
    assert!(reply.starts_with("Возможно это поможет разобраться:"));
    assert!(reply.contains(&hits[0].url));

    // Asking again inside the window stays silent.
    tokio::time::advance(Duration::from_secs(120)).await;
    assert!(intake::handle(&directory, &filter, &features, CHAT, "чарльз").is_empty());

    // A different chat is unaffected.
    assert_eq!(
        intake::handle(&directory, &filter, &features, CHAT + 1, "чарльз").len(),
        1
    );

    // After the window expires the link is offered again.
    tokio::time::advance(Duration::from_secs(300)).await;
    tokio::task::yield_now().await;
    assert_eq!(
        intake::handle(&directory, &filter, &features, CHAT, "чарльз").len(),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn multiple_matches_arrive_in_catalog_order() {
    let directory = Directory::builtin().unwrap();
    let filter = RecencyFilter::new();
    let features = FeaturesConfig::default();

    // Hits two entries of the "Доступы" section; the reply must follow
    // catalog order, not match quality.
    let hits = intake::handle(
        &directory,
        &filter,
        &features,
        CHAT,
        "тестовая учетка на препроде",
    );
    let names: Vec<&str> = hits.iter().map(|h| h.name.as_str()).collect();
    assert_eq!(
        names,
        [
            "Доступ на препрод (Ivanti Mobile)",
            "Создание учетной записи в домене TEST",
        ]
    );
}

#[test]
fn custom_catalog_overrides_builtin() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("links.toml"),
        r#"
[[sections]]
name = "Только один раздел"
key = "odin"

[[sections.children]]
name = "Запись"
url = "https://example.com"
patterns = ['\bзапись\b']
"#,
    )
    .unwrap();

    let directory = Directory::load(dir.path()).unwrap();
    assert_eq!(directory.roots.len(), 1);
    assert_eq!(directory.roots[0].name, "Только один раздел");

    let menu = menu::main_menu(&directory, 7);
    assert_eq!(menu.inline_keyboard.len(), 1);
    assert_eq!(
        menu.inline_keyboard[0][0].callback_data.as_deref(),
        Some("menu:7:odin")
    );
}

#[test]
fn roster_survives_reopening() {
    let dir = tempdir().unwrap();

    {
        let roster = ChatRoster::new(dir.path());
        assert_eq!(roster.add(CHAT, "QA чат", "anna_qa").unwrap(), AddOutcome::Added);
        roster.add(CHAT - 1, "Второй чат", "anna_qa").unwrap();
        roster.remove(CHAT - 1, "boris").unwrap();
    }

    // A fresh handle over the same directory sees the same state.
    let roster = ChatRoster::new(dir.path());
    let active = roster.active();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, CHAT);
    assert_eq!(active[0].title, "QA чат");

    // The removed chat is restorable, not gone.
    assert_eq!(
        roster.add(CHAT - 1, "Второй чат", "anna_qa").unwrap(),
        AddOutcome::Restored
    );
    assert_eq!(roster.active().len(), 2);
}

#[test]
fn winner_history_accumulates_and_formats() {
    let dir = tempdir().unwrap();
    let store = BestQaStore::new(dir.path());

    let anna = Winner {
        user_id: 1,
        full_name: "Анна".into(),
        username: "anna_qa".into(),
    };
    let boris = Winner {
        user_id: 2,
        full_name: "Борис".into(),
        username: String::new(),
    };

    store.record_winner(CHAT, "QA чат", &anna).unwrap();
    store.record_winner(CHAT, "QA чат", &anna).unwrap();
    store.record_winner(CHAT, "QA чат", &boris).unwrap();

    assert!(!store.is_new_day(CHAT));
    let last = store.last_winner(CHAT).unwrap();
    assert_eq!(last.winner.user_id, 2);

    let stats = store.stats(CHAT).unwrap();
    let text = bestqa::format_stats(&stats);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "Статистика победителей для чата: QA чат:");
    assert_eq!(lines[1], "• Анна (@anna_qa): 2 побед(ы)");
    assert_eq!(lines[2], "• Борис: 1 побед(ы)");
}

#[test]
fn help_text_matches_registered_commands() {
    let features = FeaturesConfig::default();
    let table = commands::command_table(&features);

    let group_help = commands::help_text(&table, ChatScope::Group).unwrap();
    for command in commands::commands_for_scope(&table, ChatScope::Group) {
        if command.command == "help" {
            continue; // hidden from its own listing
        }
        assert!(
            group_help.contains(&format!("/{}", command.command)),
            "group help missing /{}",
            command.command
        );
    }
}
