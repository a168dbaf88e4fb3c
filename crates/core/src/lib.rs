pub mod cancel;
pub mod config;
pub mod error;
pub mod page_content;
pub mod transport;

pub use crate::core::cancel::CancelHandle;
pub use crate::core::config::ChatClientConfig;
pub use crate::core::error::{ChatError, TransportError};
pub use crate::core::page_content::normalize_page_content;
pub use crate::core::transport::{ByteStream, HttpTransport, TransportConfig};

#[cfg(test)]
#[path = "../tests/support.rs"]
pub(crate) mod test_support;
