//! Conversation front: owns one transcript and sends messages against it.

use crate::core::transport::HttpTransport;
use crate::core::{normalize_page_content, CancelHandle, ChatClientConfig, ChatError};
use crate::session::controller::{SessionObserver, SessionState, StreamSession};
use crate::transcript::{history, push_notice, push_user};
use crate::types::{ChatRequest, DisplayMessage};
use tracing::debug;
use uuid::Uuid;

/// A chat conversation bound to one backend session.
///
/// `send` borrows the conversation mutably for the whole stream, so at most
/// one request can be in flight against a transcript.
pub struct Conversation<T: HttpTransport = crate::reqwest_transport::ReqwestTransport> {
    config: ChatClientConfig,
    http: T,
    session_id: String,
    transcript: Vec<DisplayMessage>,
    page_content: Option<String>,
    cancel: CancelHandle,
    mounted: bool,
}

impl Conversation<crate::reqwest_transport::ReqwestTransport> {
    /// Conversation over the default reqwest transport.
    pub fn with_reqwest(config: ChatClientConfig, session_id: impl Into<String>) -> Self {
        let http = crate::reqwest_transport::ReqwestTransport::new(&config.transport);
        Self::new(config, http, session_id)
    }
}

impl<T: HttpTransport> Conversation<T> {
    pub fn new(config: ChatClientConfig, http: T, session_id: impl Into<String>) -> Self {
        Self {
            config,
            http,
            session_id: session_id.into(),
            transcript: Vec::new(),
            page_content: None,
            cancel: CancelHandle::new(),
            mounted: false,
        }
    }

    /// Start a conversation under a freshly minted session id.
    pub fn with_new_session(config: ChatClientConfig, http: T) -> Self {
        Self::new(config, http, Uuid::new_v4().to_string())
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn config(&self) -> &ChatClientConfig {
        &self.config
    }

    pub fn transcript(&self) -> &[DisplayMessage] {
        &self.transcript
    }

    /// Handle aborting the in-flight send, or the next one if none is running.
    ///
    /// Each send consumes its handle; a fresh one is minted afterwards.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Attach page context to the next send. The snippet is normalized and
    /// consumed by that send; `None` clears it.
    pub fn set_page_content(&mut self, raw: Option<&str>) {
        self.page_content = raw
            .map(|raw| normalize_page_content(raw, self.config.page_content_max_chars))
            .filter(|text| !text.is_empty());
    }

    /// Switch to another session, discarding the current transcript.
    pub fn open_session(&mut self, session_id: impl Into<String>) {
        self.session_id = session_id.into();
        self.transcript.clear();
        self.page_content = None;
        self.cancel = CancelHandle::new();
        self.mounted = false;
    }

    /// Populate the transcript from persisted history.
    ///
    /// Runs at most once per session, before any message is sent; later calls
    /// return the current transcript without fetching. On failure the
    /// transcript is left untouched and the call may be retried.
    pub async fn load_history(&mut self) -> Result<&[DisplayMessage], ChatError> {
        if self.mounted {
            debug!(target: "chat_stream::history", "history already mounted; skipping fetch");
            return Ok(&self.transcript);
        }
        let messages = history::load_history(&self.http, &self.config, &self.session_id).await?;
        self.transcript = messages;
        self.mounted = true;
        Ok(&self.transcript)
    }

    /// Send `text` and stream the reply into the transcript.
    ///
    /// The user message is echoed locally before the request opens. Transport
    /// failures are reported once through `observer.on_error`, leave the
    /// partial reply in place and append the configured network notice; they
    /// are not returned as `Err`. `Err` is reserved for input and
    /// configuration problems detected before anything is sent.
    ///
    /// Besides the streamed updates, `observer.on_data` also receives the
    /// transcript after the echo and after the notice, unless the send was
    /// cancelled.
    pub async fn send<O: SessionObserver>(
        &mut self,
        text: &str,
        mut observer: O,
    ) -> Result<SessionState, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::invalid_argument("message is empty"));
        }
        self.config.validate()?;

        self.mounted = true;
        self.transcript = push_user(&self.transcript, text);
        if !self.cancel.is_cancelled() {
            observer.on_data(&self.transcript);
        }

        let request = ChatRequest {
            client_slug: self.config.client_slug.clone(),
            message: text.to_string(),
            session_id: self.session_id.clone(),
            page_content: self.page_content.take(),
            stream: Some(self.config.stream),
        };

        let session = StreamSession::new(self.transcript.clone(), &mut observer)
            .with_cancel_handle(self.cancel.clone());
        let outcome = session.run(&self.http, &self.config, &request).await;
        let cancel = std::mem::replace(&mut self.cancel, CancelHandle::new());

        self.transcript = outcome.transcript;
        if let Some(sid) = outcome.session_id {
            debug!(target: "chat_stream::session", %sid, "session id reassigned");
            self.session_id = sid;
        }
        if outcome.state == SessionState::Errored {
            self.transcript = push_notice(&self.transcript, &self.config.network_error_message);
            if !cancel.is_cancelled() {
                observer.on_data(&self.transcript);
            }
        }
        Ok(outcome.state)
    }
}
