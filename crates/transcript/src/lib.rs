//! Transcript reconstruction: payload normalization, the folding reducer and
//! the history reconciler. Live and stored messages share one parser so both
//! paths produce structurally identical display messages.

pub mod history;
pub mod normalize;
pub mod reducer;

pub use history::{fetch_history, load_history, reconcile_history};
pub use normalize::{normalize, normalize_payload, parse_tagged, Payload, END_SENTINEL};
pub use reducer::{push_notice, push_user, reduce};

#[cfg(test)]
#[path = "../tests/history_tests.rs"]
mod history_tests;
