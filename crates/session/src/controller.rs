//! One outstanding "send message" request and its lifecycle.

use crate::core::transport::HttpTransport;
use crate::core::{CancelHandle, ChatClientConfig, ChatError, TransportError};
use crate::streaming_sse::stream::BlockStreamExt;
use crate::streaming_sse::{EventKind, RawEventBlock};
use crate::transcript::{normalize_payload, reduce, Payload};
use crate::types::{ChatRequest, DisplayMessage};
use bytes::Bytes;
use futures_core::Stream;
use futures_util::StreamExt;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Streaming,
    Completed,
    Errored,
    Cancelled,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Completed | SessionState::Errored | SessionState::Cancelled
        )
    }

    /// True while a request is open (the send affordance should be disabled).
    pub fn is_busy(&self) -> bool {
        matches!(self, SessionState::Connecting | SessionState::Streaming)
    }
}

/// Lifecycle callbacks of a stream session.
///
/// Every handler is required so a session can never start with a missing
/// one. No callback fires once the session's cancel handle is closed.
pub trait SessionObserver: Send {
    /// The transcript changed; receives the full updated transcript.
    fn on_data(&mut self, transcript: &[DisplayMessage]);
    /// The backend assigned or renamed the session.
    fn on_session_id(&mut self, session_id: &str);
    /// The stream finished gracefully. Fires at most once.
    fn on_complete(&mut self);
    /// The transport failed. Fires at most once and never for cancellation.
    fn on_error(&mut self, error: &ChatError);
}

impl<O: SessionObserver + ?Sized> SessionObserver for &mut O {
    fn on_data(&mut self, transcript: &[DisplayMessage]) {
        (**self).on_data(transcript)
    }

    fn on_session_id(&mut self, session_id: &str) {
        (**self).on_session_id(session_id)
    }

    fn on_complete(&mut self) {
        (**self).on_complete()
    }

    fn on_error(&mut self, error: &ChatError) {
        (**self).on_error(error)
    }
}

/// Final state of a session together with what it produced.
#[derive(Debug)]
pub struct SessionOutcome {
    pub state: SessionState,
    /// Transcript as of the terminal transition; partial text is kept on error.
    pub transcript: Vec<DisplayMessage>,
    /// Last session id announced by a `sid` event.
    pub session_id: Option<String>,
    pub error: Option<ChatError>,
}

enum Flow {
    Continue,
    Stop,
}

/// Drives one request from `Connecting` to a terminal state.
///
/// The session owns its transcript copy; the reducer is only ever invoked
/// from its single read loop.
pub struct StreamSession<O> {
    state: SessionState,
    transcript: Vec<DisplayMessage>,
    observer: O,
    cancel: CancelHandle,
    completed: bool,
    session_id: Option<String>,
    error: Option<ChatError>,
}

impl<O: SessionObserver> StreamSession<O> {
    pub fn new(transcript: Vec<DisplayMessage>, observer: O) -> Self {
        Self {
            state: SessionState::Idle,
            transcript,
            observer,
            cancel: CancelHandle::new(),
            completed: false,
            session_id: None,
            error: None,
        }
    }

    /// Use an externally owned cancel handle.
    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn transcript(&self) -> &[DisplayMessage] {
        &self.transcript
    }

    /// Open the request and stream the reply into the transcript.
    pub async fn run<T: HttpTransport>(
        mut self,
        http: &T,
        cfg: &ChatClientConfig,
        request: &ChatRequest,
    ) -> SessionOutcome {
        self.state = SessionState::Connecting;
        if self.cancel.is_cancelled() {
            return self.into_cancelled();
        }

        let url = match cfg.chat_url() {
            Ok(url) => url,
            Err(err) => return self.into_failed(err),
        };
        let body = match serde_json::to_value(request) {
            Ok(body) => body,
            Err(err) => return self.into_failed(err.into()),
        };
        let headers = cfg.stream_headers();
        debug!(
            target: "chat_stream::session",
            %url,
            session_id = %request.session_id,
            "opening chat stream"
        );

        let cancel = self.cancel.clone();
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return self.into_cancelled(),
            res = http.post_json_stream(&url, &headers, &body, &cfg.transport) => res,
        };
        let response = match response {
            Ok(response) => response,
            Err(err) => return self.into_failed(err.into()),
        };
        let (bytes, _response_headers) = T::into_stream(response);
        self.drive(bytes).await
    }

    /// Pump an already open response body through framing, decoding,
    /// normalization and reduction.
    pub async fn drive<S>(mut self, bytes: S) -> SessionOutcome
    where
        S: Stream<Item = Result<Bytes, TransportError>> + Unpin,
    {
        self.state = SessionState::Streaming;
        let cancel = self.cancel.clone();
        let mut blocks = bytes.into_block_stream();

        loop {
            if cancel.is_cancelled() {
                return self.into_cancelled();
            }
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return self.into_cancelled(),
                next = blocks.next() => next,
            };
            match next {
                None => {
                    self.complete();
                    break;
                }
                Some(Err(err)) => return self.into_failed(err.into()),
                Some(Ok(block)) => {
                    if let Flow::Stop = self.handle_block(block) {
                        break;
                    }
                }
            }
        }

        self.into_outcome()
    }

    fn handle_block(&mut self, block: RawEventBlock) -> Flow {
        match block.kind() {
            EventKind::SessionId => {
                let sid = block.data;
                if !self.cancel.is_cancelled() {
                    self.observer.on_session_id(&sid);
                }
                self.session_id = Some(sid);
                Flow::Continue
            }
            EventKind::Message => {
                if block.data.is_empty() {
                    debug!(target: "chat_stream::session", "empty payload ignored");
                    return Flow::Continue;
                }
                match normalize_payload(&block.data) {
                    Payload::End => {
                        self.complete();
                        Flow::Stop
                    }
                    Payload::Items(items) if items.is_empty() => Flow::Continue,
                    Payload::Items(items) => {
                        self.transcript = reduce(&self.transcript, items);
                        if !self.cancel.is_cancelled() {
                            self.observer.on_data(&self.transcript);
                        }
                        Flow::Continue
                    }
                }
            }
        }
    }

    /// One-shot transition to `Completed`.
    fn complete(&mut self) {
        if self.completed {
            debug!(target: "chat_stream::session", "duplicate completion ignored");
            return;
        }
        self.completed = true;
        self.state = SessionState::Completed;
        if !self.cancel.is_cancelled() {
            self.observer.on_complete();
        }
    }

    fn into_failed(mut self, error: ChatError) -> SessionOutcome {
        if self.cancel.is_cancelled() {
            return self.into_cancelled();
        }
        warn!(
            target: "chat_stream::session",
            error = %error.format_details(),
            "chat stream failed"
        );
        self.state = SessionState::Errored;
        self.observer.on_error(&error);
        self.error = Some(error);
        self.into_outcome()
    }

    fn into_cancelled(mut self) -> SessionOutcome {
        debug!(target: "chat_stream::session", "chat stream cancelled");
        self.state = SessionState::Cancelled;
        self.into_outcome()
    }

    fn into_outcome(self) -> SessionOutcome {
        SessionOutcome {
            state: self.state,
            transcript: self.transcript,
            session_id: self.session_id,
            error: self.error,
        }
    }
}
