//! Async Stream support for block decoding

use crate::streaming_sse::{EventDecoder, RawEventBlock};
use bytes::Bytes;
use futures_core::Stream;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Adapter that turns a byte stream into a stream of decoded event blocks.
///
/// Blocks completed by one chunk are yielded one at a time, so a consumer can
/// stop between two blocks of the same chunk. Transport errors are passed
/// through unchanged. At end of input any unterminated residual is dropped.
pub struct BlockStream<S> {
    inner: S,
    decoder: EventDecoder,
    pending: VecDeque<RawEventBlock>,
    done: bool,
}

impl<S> BlockStream<S> {
    pub fn new(stream: S) -> Self {
        Self {
            inner: stream,
            decoder: EventDecoder::new(),
            pending: VecDeque::new(),
            done: false,
        }
    }
}

impl<S, E> Stream for BlockStream<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    type Item = Result<RawEventBlock, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if let Some(block) = self.pending.pop_front() {
                return Poll::Ready(Some(Ok(block)));
            }
            if self.done {
                return Poll::Ready(None);
            }

            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => {
                    let blocks = self.decoder.push(&chunk);
                    self.pending.extend(blocks);
                }
                Poll::Ready(Some(Err(e))) => return Poll::Ready(Some(Err(e))),
                Poll::Ready(None) => {
                    self.decoder.finish();
                    self.done = true;
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Extension trait for byte streams to easily convert to block streams
pub trait BlockStreamExt: Stream {
    fn into_block_stream(self) -> BlockStream<Self>
    where
        Self: Sized,
    {
        BlockStream::new(self)
    }
}

impl<S: Stream> BlockStreamExt for S {}
