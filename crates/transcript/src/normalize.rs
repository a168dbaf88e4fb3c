//! Tagged payload parsing shared by the live stream and persisted history.

use crate::types::{MapCard, NormalizedItem, ProductCard};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::debug;

/// Reserved payload marking graceful stream completion.
pub const END_SENTINEL: &str = "[END]";

const DEFAULT_BUTTON_LABEL: &str = "Apri";
const DEFAULT_BUTTON_ACTION: &str = "#";

/// Interpretation of one `message` event payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// The end sentinel; never reaches the parser.
    End,
    /// Zero or more items to fold into the transcript.
    Items(Vec<NormalizedItem>),
}

/// Wire shape of one tagged object. Unknown tags fail to deserialize and are dropped.
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum TaggedObject {
    Text {
        #[serde(default)]
        content: JsonValue,
    },
    Button {
        #[serde(default)]
        label: JsonValue,
        #[serde(default)]
        action: JsonValue,
        #[serde(default)]
        class: JsonValue,
    },
    ProductCard {
        #[serde(default)]
        data: JsonValue,
    },
    MapCard {
        #[serde(default)]
        data: JsonValue,
    },
}

impl TaggedObject {
    fn into_item(self) -> Option<NormalizedItem> {
        match self {
            TaggedObject::Text { content } => Some(NormalizedItem::Text {
                content: scalar_to_string(&content, ""),
            }),
            TaggedObject::Button {
                label,
                action,
                class,
            } => {
                let class = scalar_to_string(&class, "");
                Some(NormalizedItem::Button {
                    label: scalar_to_string(&label, DEFAULT_BUTTON_LABEL),
                    action: scalar_to_string(&action, DEFAULT_BUTTON_ACTION),
                    style_class: (!class.is_empty()).then_some(class),
                })
            }
            TaggedObject::ProductCard { data } => {
                card_data::<ProductCard>(data, "product_card")
                    .map(|data| NormalizedItem::ProductCard { data })
            }
            TaggedObject::MapCard { data } => {
                card_data::<MapCard>(data, "map_card").map(|data| NormalizedItem::MapCard { data })
            }
        }
    }
}

/// Nested card data is passed through whenever it is present. Only a missing
/// or null `data` drops the card, as does a `data` that is not an object.
fn card_data<T: DeserializeOwned>(data: JsonValue, tag: &str) -> Option<T> {
    if data.is_null() {
        debug!(target: "chat_stream::normalize", tag, "card without data dropped");
        return None;
    }
    match serde_json::from_value(data) {
        Ok(card) => Some(card),
        Err(err) => {
            debug!(
                target: "chat_stream::normalize",
                tag,
                error = %err,
                "card data is not an object; dropped"
            );
            None
        }
    }
}

fn scalar_to_string(value: &JsonValue, default: &str) -> String {
    match value {
        JsonValue::Null => default.to_string(),
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Map one JSON object to an item; anything unrecognized yields `None`.
pub fn item_from_value(value: JsonValue) -> Option<NormalizedItem> {
    match serde_json::from_value::<TaggedObject>(value) {
        Ok(tagged) => tagged.into_item(),
        Err(err) => {
            debug!(
                target: "chat_stream::normalize",
                error = %err,
                "unrecognized payload object dropped"
            );
            None
        }
    }
}

/// Parse a tagged payload: a single object or an array of objects.
///
/// Returns `None` when the text is not JSON, or is JSON but neither an object
/// nor an array; callers decide the plain-text fallback. Returns `Some` with
/// possibly zero items otherwise.
pub fn parse_tagged(payload: &str) -> Option<Vec<NormalizedItem>> {
    let value: JsonValue = serde_json::from_str(payload).ok()?;
    match value {
        JsonValue::Array(elements) => {
            Some(elements.into_iter().filter_map(item_from_value).collect())
        }
        obj @ JsonValue::Object(_) => Some(item_from_value(obj).into_iter().collect()),
        _ => None,
    }
}

/// Remove every run of newlines from a plain-text payload.
pub fn strip_newlines(text: &str) -> String {
    text.chars().filter(|c| *c != '\n').collect()
}

/// Normalize a live `message` payload.
///
/// Non-JSON payloads become a single text item with newlines removed so the
/// content is never lost.
pub fn normalize(payload: &str) -> Vec<NormalizedItem> {
    match parse_tagged(payload) {
        Some(items) => items,
        None => {
            debug!(
                target: "chat_stream::normalize",
                bytes = payload.len(),
                "non-JSON payload rendered as text"
            );
            vec![NormalizedItem::text(strip_newlines(payload))]
        }
    }
}

/// Classify a live payload, intercepting the end sentinel before any parsing.
pub fn normalize_payload(payload: &str) -> Payload {
    if payload == END_SENTINEL {
        return Payload::End;
    }
    Payload::Items(normalize(payload))
}
