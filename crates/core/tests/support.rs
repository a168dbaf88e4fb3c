//! In-memory transport shared by the crate's tests.

use crate::core::error::{build_http_status_transport_error, TransportError};
use crate::core::transport::{ByteStream, HttpTransport, TransportConfig};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub(crate) struct TestTransport {
    chunks: Arc<Mutex<Vec<Result<Bytes, TransportError>>>>,
    stream_error: Arc<Mutex<Option<TransportError>>>,
    history: Arc<Mutex<Option<Result<serde_json::Value, TransportError>>>>,
    last_body: Arc<Mutex<Option<serde_json::Value>>>,
    last_url: Arc<Mutex<Option<String>>>,
    last_headers: Arc<Mutex<Option<Vec<(String, String)>>>>,
    stream_calls: Arc<Mutex<usize>>,
    history_calls: Arc<Mutex<usize>>,
}

impl TestTransport {
    pub(crate) fn new(chunks: Vec<&str>) -> Self {
        let transport = Self::default();
        *transport.chunks.lock().unwrap() = chunks
            .into_iter()
            .map(|c| Ok(Bytes::from(c.to_string())))
            .collect();
        transport
    }

    /// Replace the body served by the next stream request.
    pub(crate) fn queue_chunks(&self, chunks: Vec<&str>) {
        *self.chunks.lock().unwrap() = chunks
            .into_iter()
            .map(|c| Ok(Bytes::from(c.to_string())))
            .collect();
    }

    /// Append a mid-stream failure after the configured chunks.
    pub(crate) fn with_body_error(self, error: TransportError) -> Self {
        self.chunks.lock().unwrap().push(Err(error));
        self
    }

    /// Fail the request itself before any body is produced.
    pub(crate) fn with_stream_error(self, error: TransportError) -> Self {
        *self.stream_error.lock().unwrap() = Some(error);
        self
    }

    pub(crate) fn with_history(self, body: serde_json::Value) -> Self {
        *self.history.lock().unwrap() = Some(Ok(body));
        self
    }

    pub(crate) fn with_history_status(self, status: u16) -> Self {
        *self.history.lock().unwrap() = Some(Err(build_http_status_transport_error(
            status,
            String::new(),
            Vec::new(),
        )));
        self
    }

    pub(crate) fn last_body(&self) -> Option<serde_json::Value> {
        self.last_body.lock().unwrap().clone()
    }

    pub(crate) fn last_url(&self) -> Option<String> {
        self.last_url.lock().unwrap().clone()
    }

    pub(crate) fn last_headers(&self) -> Option<Vec<(String, String)>> {
        self.last_headers.lock().unwrap().clone()
    }

    pub(crate) fn stream_calls(&self) -> usize {
        *self.stream_calls.lock().unwrap()
    }

    pub(crate) fn history_calls(&self) -> usize {
        *self.history_calls.lock().unwrap()
    }
}

pub(crate) struct TestStreamResponse {
    chunks: Vec<Result<Bytes, TransportError>>,
}

#[async_trait]
impl HttpTransport for TestTransport {
    type StreamResponse = TestStreamResponse;

    fn into_stream(resp: Self::StreamResponse) -> (ByteStream, Vec<(String, String)>) {
        (Box::pin(stream::iter(resp.chunks)), Vec::new())
    }

    async fn post_json_stream(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &serde_json::Value,
        _cfg: &TransportConfig,
    ) -> Result<Self::StreamResponse, TransportError> {
        *self.stream_calls.lock().unwrap() += 1;
        *self.last_url.lock().unwrap() = Some(url.to_string());
        *self.last_headers.lock().unwrap() = Some(headers.to_vec());
        *self.last_body.lock().unwrap() = Some(body.clone());
        if let Some(err) = self.stream_error.lock().unwrap().take() {
            return Err(err);
        }
        let chunks = std::mem::take(&mut *self.chunks.lock().unwrap());
        Ok(TestStreamResponse { chunks })
    }

    async fn get_json(
        &self,
        url: &str,
        _headers: &[(String, String)],
        _cfg: &TransportConfig,
    ) -> Result<(serde_json::Value, Vec<(String, String)>), TransportError> {
        *self.history_calls.lock().unwrap() += 1;
        *self.last_url.lock().unwrap() = Some(url.to_string());
        match self.history.lock().unwrap().take() {
            Some(Ok(body)) => Ok((body, Vec::new())),
            Some(Err(err)) => Err(err),
            None => Ok((serde_json::json!({ "chatLogs": [] }), Vec::new())),
        }
    }
}
