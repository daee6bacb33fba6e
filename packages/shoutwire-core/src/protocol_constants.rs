//! Fixed protocol constants and connection defaults.
//!
//! Wire-format values are dictated by the SHOUTcast/Icecast handshake and
//! must not change. Limits below them are defaults that callers may override
//! through [`ConnectionSettings`](crate::handshake::ConnectionSettings).

// ─────────────────────────────────────────────────────────────────────────────
// Wire Format
// ─────────────────────────────────────────────────────────────────────────────

/// Port that is omitted from the `Host` header.
pub const DEFAULT_PORT: u16 = 80;

/// Status line protocol token used by SHOUTcast servers.
pub const ICY_PROTOCOL: &str = "ICY";

/// Status line protocol prefix used by Icecast and generic HTTP servers.
pub const HTTP_PROTOCOL_PREFIX: &str = "HTTP/";

// ─────────────────────────────────────────────────────────────────────────────
// Header Names (upper-case, as normalized by the parser)
// ─────────────────────────────────────────────────────────────────────────────

pub const HEADER_METAINT: &str = "ICY-METAINT";
pub const HEADER_NAME: &str = "ICY-NAME";
pub const HEADER_GENRE: &str = "ICY-GENRE";
pub const HEADER_DESCRIPTION: &str = "ICY-DESCRIPTION";
pub const HEADER_BITRATE: &str = "ICY-BR";
pub const HEADER_URL: &str = "ICY-URL";
pub const HEADER_PUBLIC: &str = "ICY-PUB";
pub const HEADER_CONTENT_TYPE: &str = "CONTENT-TYPE";

// ─────────────────────────────────────────────────────────────────────────────
// Connection Defaults
// ─────────────────────────────────────────────────────────────────────────────

/// User agent sent when the caller does not provide one.
pub const DEFAULT_USER_AGENT: &str =
    concat!("Shoutcast Player (shoutwire/", env!("CARGO_PKG_VERSION"), ")");

/// Maximum size of the response header block (bytes).
///
/// Real servers send well under 2 KiB of headers.
pub const MAX_HEADER_BLOCK_SIZE: usize = 16 * 1024;

/// Deadline for connect + request + header block (seconds).
pub const HANDSHAKE_TIMEOUT_SECS: u64 = 10;

/// Bytes requested from the socket per buffer fill.
pub const READ_CHUNK_SIZE: usize = 4 * 1024;
