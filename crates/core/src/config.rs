//! Client configuration for the chat backend.

use crate::core::error::ChatError;
use crate::core::transport::TransportConfig;

pub const ENV_API_BASE: &str = "CHAT_API_BASE";
pub const ENV_CLIENT_SLUG: &str = "CHAT_CLIENT_SLUG";

/// Notice appended to the transcript when a stream fails at the transport level.
pub const DEFAULT_NETWORK_ERROR_MESSAGE: &str = "⚠️ Errore di rete.";
/// Content the backend stores for an assistant turn that was still streaming when saved.
pub const DEFAULT_HISTORY_PLACEHOLDER: &str = "[streaming…]";
pub const DEFAULT_PAGE_CONTENT_MAX_CHARS: usize = 4000;

#[derive(Clone, Debug)]
pub struct ChatClientConfig {
    /// Backend base URL without trailing slashes.
    pub base_url: String,
    /// Recipient identity sent as `client_slug`.
    pub client_slug: String,
    /// Extra request headers.
    pub headers: Vec<(String, String)>,
    pub transport: TransportConfig,
    /// Value of the `stream` flag in the request body.
    pub stream: bool,
    pub network_error_message: String,
    pub history_placeholder: String,
    pub page_content_max_chars: usize,
}

impl ChatClientConfig {
    pub fn new(base_url: impl AsRef<str>, client_slug: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(base_url.as_ref()),
            client_slug: client_slug.into(),
            headers: Vec::new(),
            transport: TransportConfig::default(),
            stream: true,
            network_error_message: DEFAULT_NETWORK_ERROR_MESSAGE.to_string(),
            history_placeholder: DEFAULT_HISTORY_PLACEHOLDER.to_string(),
            page_content_max_chars: DEFAULT_PAGE_CONTENT_MAX_CHARS,
        }
    }

    /// Build a configuration from `CHAT_API_BASE` and `CHAT_CLIENT_SLUG`.
    pub fn from_env() -> Result<Self, ChatError> {
        let base = std::env::var(ENV_API_BASE)
            .map_err(|_| ChatError::config(format!("{ENV_API_BASE} is not set")))?;
        let slug = std::env::var(ENV_CLIENT_SLUG)
            .map_err(|_| ChatError::config(format!("{ENV_CLIENT_SLUG} is not set")))?;
        let cfg = Self::new(base, slug);
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_network_error_message(mut self, message: impl Into<String>) -> Self {
        self.network_error_message = message.into();
        self
    }

    pub fn with_history_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.history_placeholder = placeholder.into();
        self
    }

    pub fn with_page_content_max_chars(mut self, max: usize) -> Self {
        self.page_content_max_chars = max;
        self
    }

    /// Check that the base URL is set and parses as an absolute URL.
    pub fn validate(&self) -> Result<(), ChatError> {
        if self.base_url.is_empty() {
            return Err(ChatError::config("API base URL not set"));
        }
        url::Url::parse(&self.base_url)
            .map_err(|e| ChatError::config(format!("invalid base url '{}': {e}", self.base_url)))?;
        if self.client_slug.trim().is_empty() {
            return Err(ChatError::config("client slug not set"));
        }
        Ok(())
    }

    /// `POST` endpoint for streamed replies.
    pub fn chat_url(&self) -> Result<String, ChatError> {
        self.validate()?;
        Ok(format!("{}/chat", self.base_url))
    }

    /// `GET` endpoint for the persisted transcript of `session_id`.
    pub fn history_url(&self, session_id: &str) -> Result<String, ChatError> {
        self.validate()?;
        Ok(format!(
            "{}/chat/{}",
            self.base_url,
            urlencoding::encode(session_id)
        ))
    }

    /// Headers for the streaming request; callers may not override `accept`.
    pub fn stream_headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![
            ("content-type".to_string(), "application/json".to_string()),
            ("accept".to_string(), "text/event-stream".to_string()),
        ];
        for (k, v) in &self.headers {
            let kl = k.to_ascii_lowercase();
            if kl == "content-type" || kl == "accept" {
                continue;
            }
            headers.push((kl, v.clone()));
        }
        headers
    }

    /// Headers for the history request.
    pub fn history_headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![("accept".to_string(), "application/json".to_string())];
        for (k, v) in &self.headers {
            let kl = k.to_ascii_lowercase();
            if kl == "accept" {
                continue;
            }
            headers.push((kl, v.clone()));
        }
        headers
    }
}

fn normalize_base_url(base: &str) -> String {
    base.trim().trim_end_matches('/').to_string()
}
