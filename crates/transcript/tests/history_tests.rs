use crate::core::test_support::TestTransport;
use crate::core::{ChatClientConfig, ChatError};
use crate::transcript::history::{load_history, reconcile_history};
use crate::transcript::normalize::normalize;
use crate::types::{HistoryRecord, NormalizedItem, ProductCard, Role};
use serde_json::json;

const PLACEHOLDER: &str = "[streaming…]";

fn record(role: Role, content: &str) -> HistoryRecord {
    HistoryRecord {
        role,
        content: content.to_string(),
    }
}

fn config() -> ChatClientConfig {
    ChatClientConfig::new("https://chat.example.com/", "acme")
}

#[test]
fn user_records_are_plain_text_even_when_json_like() {
    let out = reconcile_history(
        &[record(Role::User, r#"{"type":"button","label":"x"}"#)],
        PLACEHOLDER,
    );
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].role, Role::User);
    assert_eq!(out[0].text_content(), Some(r#"{"type":"button","label":"x"}"#));
}

#[test]
fn assistant_arrays_expand_to_one_message_per_item() {
    let out = reconcile_history(
        &[record(
            Role::Assistant,
            r#"[{"type":"text","content":"Ecco"},{"type":"button","label":"Vai","action":"/p"},{"type":"mystery"}]"#,
        )],
        PLACEHOLDER,
    );
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].text_content(), Some("Ecco"));
    assert_eq!(out[1].kind.kind_name(), "button");
    assert!(out.iter().all(|m| m.role == Role::Assistant));
}

#[test]
fn product_card_matches_live_normalizer() {
    let content = r#"{"type":"product_card","data":{"title":"X","price":"€10","imageUrl":"i","linkUrl":"l"}}"#;
    let stored = reconcile_history(&[record(Role::Assistant, content)], PLACEHOLDER);
    let live = normalize(content);

    assert_eq!(stored.len(), 1);
    assert_eq!(live.len(), 1);
    assert_eq!(stored[0].kind, live[0]);
    assert_eq!(
        stored[0].kind,
        NormalizedItem::ProductCard {
            data: ProductCard {
                title: "X".into(),
                price: "€10".into(),
                image_url: "i".into(),
                link_url: "l".into(),
                ..ProductCard::default()
            },
        }
    );
}

#[test]
fn stored_card_with_numeric_price_is_kept() {
    let content = r#"{"type":"product_card","data":{"title":"X","price":10,"badge":"new"}}"#;
    let out = reconcile_history(&[record(Role::Assistant, content)], PLACEHOLDER);

    assert_eq!(out.len(), 1);
    match &out[0].kind {
        NormalizedItem::ProductCard { data } => {
            assert_eq!(data.title, "X");
            assert_eq!(data.price, "10");
            assert_eq!(data.extra.get("badge"), Some(&json!("new")));
        }
        other => panic!("unexpected item: {other:?}"),
    }
}

#[test]
fn non_json_assistant_content_is_kept_verbatim() {
    let out = reconcile_history(&[record(Role::Assistant, "riga 1\n\nriga 2")], PLACEHOLDER);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].text_content(), Some("riga 1\n\nriga 2"));
}

#[test]
fn placeholder_records_are_filtered() {
    let out = reconcile_history(
        &[
            record(Role::User, "ciao"),
            record(Role::Assistant, PLACEHOLDER),
            record(Role::Assistant, "salve"),
        ],
        PLACEHOLDER,
    );
    let texts: Vec<_> = out.iter().filter_map(|m| m.text_content()).collect();
    assert_eq!(texts, vec!["ciao", "salve"]);
}

#[test]
fn stored_consecutive_texts_are_not_merged() {
    let out = reconcile_history(
        &[record(Role::Assistant, "a"), record(Role::Assistant, "b")],
        PLACEHOLDER,
    );
    assert_eq!(out.len(), 2);
}

#[tokio::test]
async fn load_history_fetches_and_maps() {
    let transport = TestTransport::default().with_history(json!({
        "chatLogs": [
            {"role": "user", "content": "ciao"},
            {"role": "assistant", "content": "{\"type\":\"text\",\"content\":\"Ciao!\"}"}
        ]
    }));
    let out = load_history(&transport, &config(), "sess 1").await.expect("history");
    assert_eq!(out.len(), 2);
    assert_eq!(out[1].text_content(), Some("Ciao!"));
    assert_eq!(
        transport.last_url().as_deref(),
        Some("https://chat.example.com/chat/sess%201")
    );
}

#[tokio::test]
async fn missing_history_is_empty_not_an_error() {
    let transport = TestTransport::default().with_history_status(404);
    let out = load_history(&transport, &config(), "s").await.expect("history");
    assert!(out.is_empty());
}

#[tokio::test]
async fn other_statuses_are_errors() {
    let transport = TestTransport::default().with_history_status(500);
    match load_history(&transport, &config(), "s").await {
        Err(err @ ChatError::Transport(_)) => assert_eq!(err.status(), Some(500)),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_history_body_is_a_serde_error() {
    let transport = TestTransport::default().with_history(json!({"chatLogs": "nope"}));
    assert!(matches!(
        load_history(&transport, &config(), "s").await,
        Err(ChatError::Serde(_))
    ));
}
