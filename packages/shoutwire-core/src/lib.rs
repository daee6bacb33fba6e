//! Shoutwire Core - SHOUTcast/Icecast client library.
//!
//! Connects to an ICY streaming server, negotiates the handshake, and hands
//! back a session whose transport is positioned at the first audio byte.
//!
//! # Architecture
//!
//! - [`transport`]: Buffered, read-serialized wrapper around a duplex stream
//! - [`handshake`]: Request building, header-block reading, status
//!   classification, and header parsing
//! - [`metadata`]: Typed station and audio metadata
//! - [`session`]: The connected stream handed to callers
//! - [`error`]: Centralized error types
//!
//! # Example
//!
//! ```no_run
//! # async fn run() -> shoutwire_core::ShoutResult<()> {
//! use shoutwire_core::{ConnectionSettings, Connector, Url};
//!
//! let url = Url::parse("http://radio.example:8000/stream").unwrap();
//! let stream = Connector::new(ConnectionSettings::default()).connect(&url).await?;
//! stream.audio().ensure_playable()?;
//! let first_bytes = stream.read_raw(4096).await?;
//! # let _ = first_bytes;
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]

pub mod error;
pub mod handshake;
pub mod metadata;
pub mod protocol_constants;
pub mod session;
pub mod transport;

pub use error::{ErrorCode, ShoutError, ShoutResult};
pub use handshake::{
    connect, ConnectionOutcome, ConnectionSettings, Connector, HeaderEntry, HeaderMap,
    HeadersObserver, StatusLine,
};
pub use metadata::{AudioFormat, AudioInfo, StationInfo, StreamMetadata};
pub use session::ShoutcastStream;
pub use transport::{BufferedTransport, DisposeHook, ReadyGate};

pub use url::Url;
