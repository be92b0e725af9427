//! Session driver for the Claude web chat endpoints.
//!
//! The crate resolves an organization and conversation lazily, posts a prompt
//! with a bounded retry loop that falls back from the primary to the secondary
//! model when the primary is rejected as invalid, and streams the generated
//! text back over a channel. Authentication is out of scope: cookies and other
//! credentials are plain caller headers in [`ClaudeWebConfig`].
//!
//! HTTP goes through the [`Transport`] trait. [`ReqwestTransport`] is the
//! default; tests and embedders can inject their own.

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod headers;
pub mod model_cache;
pub mod payload;
pub mod retry;
pub mod session;
pub mod sse;
pub mod transport;
pub mod url;

pub use client::{CancellationSignal, ClaudeWebClient, PartialResponseReceiver};
pub use config::ClaudeWebConfig;
pub use error::{ClaudeWebError, SessionError};
pub use events::{PartialResponse, StreamEvent};
pub use model_cache::ModelCache;
pub use payload::Attachment;
pub use session::Session;
pub use transport::{ReqwestTransport, Transport, TransportRequest, TransportResponse};
