//! Cancellation handle shared between a stream session and its caller.

use tokio_util::sync::CancellationToken;

/// A handle that can be used to abort an outstanding chat stream.
///
/// Cloning is cheap; all clones observe the same cancellation. Once cancelled
/// a handle stays cancelled, so a new send needs a fresh handle.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Request cancellation. Callbacks that have not fired yet are suppressed.
    pub fn close(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// A future that resolves when cancellation is requested.
    pub fn cancelled(&self) -> tokio_util::sync::WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }
}
