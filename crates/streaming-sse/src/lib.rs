//! # Event-stream framing for the chat backend
//!
//! The backend answers `POST /chat` with a chunked body made of blocks
//! terminated by a blank line (`"\n\n"`). Each block carries an optional
//! `event:` line and one or more `data:` lines.
//!
//! This module provides:
//! - `BlockFramer`: incremental framer that buffers partial blocks across chunks
//! - `decode_block`: turns one block into a `RawEventBlock`
//! - `BlockStream`: adapter from a byte stream to a stream of decoded blocks

use std::collections::VecDeque;
use tracing::debug;

/// Terminator of one event block.
pub const BLOCK_TERMINATOR: &[u8] = b"\n\n";
/// Event name used when a block carries no (or an empty) `event:` line.
pub const DEFAULT_EVENT_NAME: &str = "message";
/// Event name carrying a backend-assigned session identifier.
pub const SESSION_ID_EVENT_NAME: &str = "sid";

/// Decoded event block, before any payload interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEventBlock {
    /// Event name; `"message"` unless the block named another one
    pub event_name: String,
    /// All `data:` values of the block, trimmed and concatenated without separator
    pub data: String,
}

impl RawEventBlock {
    pub fn message(data: impl Into<String>) -> Self {
        Self {
            event_name: DEFAULT_EVENT_NAME.to_string(),
            data: data.into(),
        }
    }

    pub fn kind(&self) -> EventKind {
        EventKind::from_name(&self.event_name)
    }
}

/// Event names the session controller reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Normal data path. Unknown names land here as well.
    Message,
    /// `sid`: the payload is a session identifier, not a message.
    SessionId,
}

impl EventKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            SESSION_ID_EVENT_NAME => EventKind::SessionId,
            _ => EventKind::Message,
        }
    }
}

/// Incremental framer that handles chunk boundaries correctly.
///
/// Bytes are buffered until a `"\n\n"` terminator shows up, so multi-byte
/// UTF-8 sequences split across chunks are only decoded once complete.
pub struct BlockFramer {
    /// Bytes of the current, not yet terminated block
    buffer: Vec<u8>,
    /// Completed blocks ready to be yielded
    block_queue: VecDeque<String>,
}

impl BlockFramer {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            block_queue: VecDeque::new(),
        }
    }

    /// Push a new chunk and get every block it completes, in arrival order.
    ///
    /// Blocks are returned with trailing whitespace trimmed. Empty blocks are
    /// yielded as empty strings; `decode_block` turns them into nothing.
    pub fn push(&mut self, chunk: &[u8]) -> impl Iterator<Item = String> + '_ {
        self.buffer.extend_from_slice(chunk);
        self.process_buffer();
        self.block_queue.drain(..)
    }

    fn process_buffer(&mut self) {
        let mut start = 0;
        while let Some(offset) = find_terminator(&self.buffer[start..]) {
            let end = start + offset;
            let block = String::from_utf8_lossy(&self.buffer[start..end]);
            self.block_queue.push_back(block.trim_end().to_string());
            start = end + BLOCK_TERMINATOR.len();
        }
        if start > 0 {
            self.buffer.drain(..start);
        }
    }

    /// True if an unterminated partial block is buffered.
    pub fn has_buffered_data(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Close the framer at end of transport.
    ///
    /// An unterminated residual can never become a complete block, so it is
    /// discarded. Returns the number of bytes dropped.
    pub fn finish(&mut self) -> usize {
        let dropped = self.buffer.len();
        if dropped > 0 {
            debug!(
                target: "chat_stream::framer",
                dropped_bytes = dropped,
                "discarding unterminated block at end of stream"
            );
        }
        self.buffer.clear();
        dropped
    }
}

impl Default for BlockFramer {
    fn default() -> Self {
        Self::new()
    }
}

fn find_terminator(buf: &[u8]) -> Option<usize> {
    buf.windows(BLOCK_TERMINATOR.len())
        .position(|w| w == BLOCK_TERMINATOR)
}

/// Decode one framed block.
///
/// `event:` sets the event name, `data:` lines are trimmed and appended
/// without separator so a payload split over several lines reassembles to the
/// original string. Other lines are ignored. Returns `None` when the block has
/// no `data:` line.
pub fn decode_block(block: &str) -> Option<RawEventBlock> {
    let mut event_name: Option<String> = None;
    let mut data = String::new();
    let mut has_data = false;

    for line in block.lines() {
        if let Some(rest) = line.strip_prefix("event:") {
            let name = rest.trim();
            event_name = if name.is_empty() {
                None
            } else {
                Some(name.to_string())
            };
        } else if let Some(rest) = line.strip_prefix("data:") {
            data.push_str(rest.trim());
            has_data = true;
        }
    }

    if !has_data {
        return None;
    }
    Some(RawEventBlock {
        event_name: event_name.unwrap_or_else(|| DEFAULT_EVENT_NAME.to_string()),
        data,
    })
}

/// Framer and decoder in one: push chunks, get decoded blocks.
#[derive(Default)]
pub struct EventDecoder {
    framer: BlockFramer,
}

impl EventDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<RawEventBlock> {
        self.framer
            .push(chunk)
            .filter_map(|block| decode_block(&block))
            .collect()
    }

    pub fn finish(&mut self) -> usize {
        self.framer.finish()
    }
}

#[cfg(feature = "stream")]
pub mod stream;

#[cfg(feature = "stream")]
pub use stream::{BlockStream, BlockStreamExt};

#[cfg(test)]
#[path = "../tests/framer_tests.rs"]
mod framer_tests;

#[cfg(test)]
#[path = "../tests/decoder_tests.rs"]
mod decoder_tests;

#[cfg(all(test, feature = "stream"))]
#[path = "../tests/stream_tests.rs"]
mod stream_tests;
