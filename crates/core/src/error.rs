use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl ChatError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        ChatError::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        ChatError::Config {
            message: message.into(),
        }
    }

    /// HTTP status of the underlying transport failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ChatError::Transport(te) => te.status(),
            _ => None,
        }
    }

    /// Format error details for logs without leaking upstream bodies.
    pub fn format_details(&self) -> String {
        match self {
            ChatError::Transport(TransportError::HttpStatus { status, body, .. }) => {
                format!("http status {}: {}", status, display_body_for_error(body))
            }
            ChatError::Transport(te) => format!("transport error: {}", te),
            ChatError::Serde(se) => format!("serde error: {}", se),
            ChatError::InvalidArgument { message } => format!("invalid argument: {}", message),
            ChatError::Config { message } => format!("configuration error: {}", message),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http status {status}: {sanitized}")]
    HttpStatus {
        status: u16,
        /// upstream body (should be treated as sensitive; only log sanitized)
        body: String,
        /// Sanitized message for display
        sanitized: String,
        /// Upstream response headers
        headers: Vec<(String, String)>,
    },
    #[error("network: {0}")]
    Network(String),
    #[error("connect timeout after {0:?}")]
    ConnectTimeout(Duration),
    #[error("idle read timeout after {0:?}")]
    IdleReadTimeout(Duration),
    #[error("body read error: {0}")]
    BodyRead(String),
    #[error("response has no readable body")]
    MissingBody,
    #[error("other: {0}")]
    Other(String),
}

impl TransportError {
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn sanitized_message(&self) -> String {
        match self {
            TransportError::HttpStatus { status, .. } => http_status_fallback_message(*status),
            _ => self.to_string(),
        }
    }
}

pub fn http_status_fallback_message(status: u16) -> String {
    format!("http status {status}")
}

pub fn build_http_status_transport_error(
    status: u16,
    body: String,
    headers: Vec<(String, String)>,
) -> TransportError {
    let sanitized = display_body_for_error(&body);
    TransportError::HttpStatus {
        status,
        body,
        sanitized,
        headers,
    }
}

pub fn display_body_for_error(body: &str) -> String {
    let trimmed = body.trim();
    let looks_like_json = trimmed.starts_with('{') || trimmed.starts_with('[');
    if looks_like_json {
        match serde_json::from_str::<Value>(trimmed) {
            Ok(v) => v.to_string(),
            Err(_) => format!("{} bytes", body.len()),
        }
    } else {
        format!("{} bytes", body.len())
    }
}
