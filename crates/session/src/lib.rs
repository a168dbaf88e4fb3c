//! Stream session controller and the conversation front built on it.

pub mod controller;
pub mod conversation;

pub use controller::{SessionObserver, SessionOutcome, SessionState, StreamSession};
pub use conversation::Conversation;

#[cfg(test)]
#[path = "../tests/controller_tests.rs"]
mod controller_tests;

#[cfg(test)]
#[path = "../tests/conversation_tests.rs"]
mod conversation_tests;
