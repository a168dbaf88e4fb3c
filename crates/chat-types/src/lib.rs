//! Shared type definitions for the chat stream client
//!
//! These types describe the visible transcript (`DisplayMessage`), the decoded
//! form of one tagged payload object (`NormalizedItem`), the persisted history
//! records returned by the backend and the outbound chat request body.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// Author of a transcript entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    /// Any non-user role stored by the backend is rendered as the assistant.
    #[serde(other)]
    Assistant,
}

/// Client-side identifier attached to every transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Mint a fresh random identifier.
    pub fn fresh() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Nested data of a `product_card` payload.
///
/// Known fields are read leniently: numbers and booleans are kept as their
/// JSON text, a missing or null field is empty. Fields the client does not
/// know are carried in `extra` and serialized back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductCard {
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(deserialize_with = "lenient_string")]
    pub price: String,
    #[serde(deserialize_with = "lenient_string")]
    pub image_url: String,
    #[serde(deserialize_with = "lenient_string")]
    pub link_url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Nested data of a `map_card` payload. Read like [`ProductCard`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapCard {
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(deserialize_with = "lenient_string")]
    pub embed_url: String,
    #[serde(deserialize_with = "lenient_string")]
    pub link_url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

/// Decoded form of one tagged payload object.
///
/// This is the closed set of kinds a transcript entry can carry; anything the
/// backend sends outside of it is dropped at the normalization boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NormalizedItem {
    Text {
        content: String,
    },
    Button {
        label: String,
        action: String,
        #[serde(rename = "class", default, skip_serializing_if = "Option::is_none")]
        style_class: Option<String>,
    },
    ProductCard {
        data: ProductCard,
    },
    MapCard {
        data: MapCard,
    },
}

impl NormalizedItem {
    pub fn text(content: impl Into<String>) -> Self {
        NormalizedItem::Text {
            content: content.into(),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, NormalizedItem::Text { .. })
    }

    /// Short tag matching the wire `type` value.
    pub fn kind_name(&self) -> &'static str {
        match self {
            NormalizedItem::Text { .. } => "text",
            NormalizedItem::Button { .. } => "button",
            NormalizedItem::ProductCard { .. } => "product_card",
            NormalizedItem::MapCard { .. } => "map_card",
        }
    }
}

/// One entry of the visible transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayMessage {
    pub id: MessageId,
    pub role: Role,
    #[serde(flatten)]
    pub kind: NormalizedItem,
}

impl DisplayMessage {
    /// A locally echoed user message. User messages are always text.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::fresh(),
            role: Role::User,
            kind: NormalizedItem::text(content),
        }
    }

    pub fn assistant(kind: NormalizedItem) -> Self {
        Self {
            id: MessageId::fresh(),
            role: Role::Assistant,
            kind,
        }
    }

    /// Text content when this entry is a text message.
    pub fn text_content(&self) -> Option<&str> {
        match &self.kind {
            NormalizedItem::Text { content } => Some(content),
            _ => None,
        }
    }

    /// True for an assistant text entry, the only kind that may grow while streaming.
    pub fn is_assistant_text(&self) -> bool {
        self.role == Role::Assistant && self.kind.is_text()
    }
}

/// Persisted transcript record as returned by the history endpoint.
///
/// `content` is either plain text or a JSON-encoded tagged payload (one object
/// or an array of objects).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub role: Role,
    pub content: String,
}

/// Body of `GET /chat/{session_id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    #[serde(default)]
    pub chat_logs: Vec<HistoryRecord>,
}

/// Body of `POST /chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub client_slug: String,
    pub message: String,
    pub session_id: String,
    #[serde(rename = "pageContent", default, skip_serializing_if = "Option::is_none")]
    pub page_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}
