use crate::core::error::TransportError;
use async_trait::async_trait;
use bytes::Bytes;
use futures_core::Stream;
use serde_json::Value;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, SystemTime};

/// Boxed byte stream produced by a streaming request.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

#[derive(Clone, Debug)]
pub struct TransportConfig {
    /// Overall request timeout (optional; if None, rely on connect + idle)
    pub request_timeout: Option<Duration>,
    /// TCP connect timeout
    pub connect_timeout: Duration,
    /// Per-chunk idle read timeout
    pub idle_read_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            request_timeout: None,
            connect_timeout: Duration::from_secs(10),
            idle_read_timeout: Duration::from_secs(45),
        }
    }
}

/// Body payload captured for transport observers.
#[derive(Debug, Clone)]
pub enum TransportBody {
    Json(Value),
    Text(String),
}

/// Structured event emitted by transport implementations.
#[derive(Debug, Clone)]
pub struct TransportEvent {
    pub started_at: SystemTime,
    pub latency: Option<Duration>,
    pub method: String,
    pub url: String,
    pub status: Option<u16>,
    pub request_headers: Vec<(String, String)>,
    pub response_headers: Vec<(String, String)>,
    pub request_body: Option<TransportBody>,
    pub response_body: Option<TransportBody>,
    pub response_size: Option<usize>,
    pub error: Option<String>,
    pub is_stream: bool,
}

/// Observer hook for transport events.
pub trait TransportObserver: Send + Sync {
    fn on_event(&self, event: TransportEvent);
}

static TRANSPORT_OBSERVER: OnceLock<Arc<dyn TransportObserver>> = OnceLock::new();

/// Register a transport observer (one-time).
pub fn set_transport_observer(observer: Arc<dyn TransportObserver>) -> bool {
    TRANSPORT_OBSERVER.set(observer).is_ok()
}

/// Emit a transport event if an observer is registered.
pub fn emit_transport_event(event: TransportEvent) {
    if let Some(observer) = TRANSPORT_OBSERVER.get() {
        observer.on_event(event);
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Response for a successful streaming HTTP request.
    /// Contains the response headers and the byte stream body.
    type StreamResponse: Send;

    /// Extract the underlying byte stream from the transport-specific response wrapper.
    fn into_stream(resp: Self::StreamResponse) -> (ByteStream, Vec<(String, String)>);

    /// POST a JSON body and return the response body as a chunked byte stream.
    ///
    /// Non-success statuses must be reported as `TransportError::HttpStatus`
    /// before any body bytes are yielded.
    async fn post_json_stream(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &Value,
        cfg: &TransportConfig,
    ) -> Result<Self::StreamResponse, TransportError>;

    /// Perform a GET request and return the parsed JSON body along with response headers.
    async fn get_json(
        &self,
        url: &str,
        headers: &[(String, String)],
        cfg: &TransportConfig,
    ) -> Result<(Value, Vec<(String, String)>), TransportError>;
}
