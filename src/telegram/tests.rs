use super::*;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn api_url_embeds_token_and_method() {
    let client = TelegramClient::new("123:ABC".into());
    assert_eq!(
        client.api_url("getMe"),
        "https://api.telegram.org/bot123:ABC/getMe"
    );
}

#[test]
fn api_url_respects_custom_base() {
    let client = TelegramClient::new("123:ABC".into()).with_api_base("http://localhost:9999");
    assert_eq!(
        client.api_url("getUpdates"),
        "http://localhost:9999/bot123:ABC/getUpdates"
    );
}

#[test]
fn outgoing_message_minimal_body() {
    let body = OutgoingMessage::text(42, "привет").into_body();
    assert_eq!(body["chat_id"], 42);
    assert_eq!(body["text"], "привет");
    assert!(body.get("reply_to_message_id").is_none());
    assert!(body.get("parse_mode").is_none());
}

#[test]
fn outgoing_message_full_body() {
    let markup = InlineKeyboardMarkup {
        inline_keyboard: vec![vec![InlineKeyboardButton::callback("x", "y")]],
    };
    let body = OutgoingMessage::text(42, "hi")
        .reply_to(7)
        .html()
        .with_markup(markup)
        .into_body();
    assert_eq!(body["reply_to_message_id"], 7);
    assert_eq!(body["parse_mode"], "HTML");
    assert_eq!(body["reply_markup"]["inline_keyboard"][0][0]["text"], "x");
}

#[tokio::test]
async fn get_me_parses_user() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:ABC/getMe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "result": {"id": 99, "is_bot": true, "first_name": "docsbot", "username": "qa_docs_bot"}
        })))
        .mount(&server)
        .await;

    let client = TelegramClient::new("123:ABC".into()).with_api_base(server.uri());
    let me = client.get_me().await.unwrap();
    assert_eq!(me.id, 99);
    assert!(me.is_bot);
    assert_eq!(me.username.as_deref(), Some("qa_docs_bot"));
}

#[tokio::test]
async fn send_message_posts_expected_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:ABC/sendMessage"))
        .and(body_partial_json(serde_json::json!({
            "chat_id": -100, "text": "объявление", "reply_to_message_id": 5
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "result": {
                "message_id": 11,
                "chat": {"id": -100, "type": "group", "title": "QA"},
                "text": "объявление"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = TelegramClient::new("123:ABC".into()).with_api_base(server.uri());
    let sent = client
        .send_message(OutgoingMessage::text(-100, "объявление").reply_to(5))
        .await
        .unwrap();
    assert_eq!(sent.message_id, 11);
}

#[tokio::test]
async fn api_error_carries_description() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:ABC/sendMessage"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "ok": false,
            "description": "Forbidden: bot was kicked from the group chat"
        })))
        .mount(&server)
        .await;

    let client = TelegramClient::new("123:ABC".into()).with_api_base(server.uri());
    let err = client
        .send_message(OutgoingMessage::text(1, "hi"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("sendMessage"));
    assert!(err.to_string().contains("kicked"));
}

#[tokio::test]
async fn get_updates_parses_batch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:ABC/getUpdates"))
        .and(body_partial_json(serde_json::json!({"offset": 10})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "result": [
                {"update_id": 10, "message": {
                    "message_id": 1,
                    "chat": {"id": 5, "type": "private"},
                    "text": "/start"
                }},
                {"update_id": 11, "callback_query": {
                    "id": "cb1",
                    "from": {"id": 5, "first_name": "Анна"},
                    "data": "help"
                }}
            ]
        })))
        .mount(&server)
        .await;

    let client = TelegramClient::new("123:ABC".into()).with_api_base(server.uri());
    let updates = client.get_updates(10, 0).await.unwrap();
    assert_eq!(updates.len(), 2);
    assert!(updates[0].message.is_some());
    assert!(updates[1].callback_query.is_some());
}

#[tokio::test]
async fn is_chat_admin_matches_user_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:ABC/getChatAdministrators"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "result": [
                {"user": {"id": 1, "first_name": "Админ"}},
                {"user": {"id": 2, "first_name": "Второй"}}
            ]
        })))
        .mount(&server)
        .await;

    let client = TelegramClient::new("123:ABC".into()).with_api_base(server.uri());
    assert!(client.is_chat_admin(-100, 2).await);
    assert!(!client.is_chat_admin(-100, 3).await);
}

#[tokio::test]
async fn admin_lookup_failure_means_not_admin() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:ABC/getChatAdministrators"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "ok": false,
            "description": "Bad Request: there are no administrators in the private chat"
        })))
        .mount(&server)
        .await;

    let client = TelegramClient::new("123:ABC".into()).with_api_base(server.uri());
    assert!(!client.is_chat_admin(5, 5).await);
}
