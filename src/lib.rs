#[path = "../crates/chat-types/src/lib.rs"]
pub mod types;
#[path = "../crates/core/src/lib.rs"]
pub mod core;
#[path = "../crates/streaming-sse/src/lib.rs"]
pub mod streaming_sse;
#[path = "../crates/transcript/src/lib.rs"]
pub mod transcript;
#[cfg(feature = "stream")]
#[path = "../crates/session/src/lib.rs"]
pub mod session;
#[path = "../crates/transports/reqwest/src/lib.rs"]
pub mod transport_reqwest;

pub mod transports {
    pub use crate::transport_reqwest as reqwest;
}

pub(crate) use crate::transport_reqwest as reqwest_transport;

pub use crate::core::{CancelHandle, ChatClientConfig, ChatError, HttpTransport, TransportError};
#[cfg(feature = "stream")]
pub use crate::session::{
    Conversation, SessionObserver, SessionOutcome, SessionState, StreamSession,
};
pub use crate::types::{DisplayMessage, NormalizedItem, Role};
