//! ICY handshake engine.
//!
//! Sends the request, reads the response header block without consuming any
//! payload bytes, classifies the status line, and maps the headers into
//! [`StreamMetadata`]. On any failure the transport is disposed before the
//! error is returned, so no half-open session ever escapes.

pub mod headers;
pub mod request;
pub mod status;

pub use headers::{HeaderEntry, HeaderMap};
pub use request::{build_request, ConnectionSettings, ServerAddress};
pub use status::{ConnectionOutcome, StatusLine};

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use url::Url;

use crate::error::{ShoutError, ShoutResult};
use crate::metadata::StreamMetadata;
use crate::session::ShoutcastStream;
use crate::transport::BufferedTransport;

/// Session-level hook invoked once per successful handshake.
///
/// Runs after headers are parsed and before [`Connector::connect`] returns.
/// An error aborts the connection attempt.
#[async_trait]
pub trait HeadersObserver: Send + Sync {
    async fn headers_received(&self, metadata: &StreamMetadata) -> ShoutResult<()>;
}

/// Returns the index one past the blank line ending a header block.
///
/// Accepts CRLF and bare LF line endings.
pub(crate) fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.iter().enumerate().skip(1).find_map(|(i, &byte)| {
        if byte != b'\n' {
            return None;
        }
        let before = &buf[..i];
        (before.ends_with(b"\n") || before.ends_with(b"\n\r")).then_some(i + 1)
    })
}

/// Reads the header block, leaving the transport at the first payload byte.
pub async fn read_header_block<S>(
    transport: &BufferedTransport<S>,
    max_len: usize,
) -> ShoutResult<String>
where
    S: AsyncRead + AsyncWrite + Send,
{
    let block = transport.read_delimited(max_len, find_header_end).await?;
    Ok(String::from_utf8_lossy(&block).into_owned())
}

/// Opens SHOUTcast/Icecast connections with fixed settings.
#[derive(Clone, Default)]
pub struct Connector {
    settings: ConnectionSettings,
    observer: Option<Arc<dyn HeadersObserver>>,
}

impl Connector {
    #[must_use]
    pub fn new(settings: ConnectionSettings) -> Self {
        Self {
            settings,
            observer: None,
        }
    }

    /// Registers the hook run after headers are parsed.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn HeadersObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    #[must_use]
    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    /// Connects over TCP and performs the handshake.
    ///
    /// Socket errors are returned unchanged as [`ShoutError::Io`].
    pub async fn connect(&self, url: &Url) -> ShoutResult<ShoutcastStream<TcpStream>> {
        let address = ServerAddress::from_url(url)?;
        self.within_deadline(async {
            log::info!(
                "[Handshake] Connecting to {}:{}",
                address.host,
                address.port
            );
            let stream = TcpStream::connect((address.host.as_str(), address.port)).await?;
            self.handshake(stream, url, &address).await
        })
        .await
    }

    /// Performs the handshake over an already-open stream.
    ///
    /// `url` supplies the request path and `Host` header.
    pub async fn connect_over<S>(&self, stream: S, url: &Url) -> ShoutResult<ShoutcastStream<S>>
    where
        S: AsyncRead + AsyncWrite + Send,
    {
        let address = ServerAddress::from_url(url)?;
        self.within_deadline(self.handshake(stream, url, &address))
            .await
    }

    async fn within_deadline<T, F>(&self, fut: F) -> ShoutResult<T>
    where
        F: Future<Output = ShoutResult<T>>,
    {
        match self.settings.handshake_timeout {
            Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| {
                log::warn!("[Handshake] Timed out after {:?}", limit);
                ShoutError::HandshakeTimeout(limit)
            })?,
            None => fut.await,
        }
    }

    async fn handshake<S>(
        &self,
        stream: S,
        url: &Url,
        address: &ServerAddress,
    ) -> ShoutResult<ShoutcastStream<S>>
    where
        S: AsyncRead + AsyncWrite + Send,
    {
        let transport = BufferedTransport::new(stream);

        match self.negotiate(&transport, address).await {
            Ok(metadata) => {
                log::info!(
                    "[Handshake] Connected to '{}' ({:?}, {} kbps, metaint={})",
                    metadata.station.name,
                    metadata.audio.format,
                    metadata.audio.bit_rate,
                    metadata.metadata_interval
                );
                Ok(ShoutcastStream::new(
                    url.clone(),
                    self.settings.clone(),
                    transport,
                    metadata,
                ))
            }
            Err(e) => {
                log::warn!("[Handshake] Failed for {}: {}", url, e);
                transport.dispose().await;
                Err(e)
            }
        }
    }

    async fn negotiate<S>(
        &self,
        transport: &BufferedTransport<S>,
        address: &ServerAddress,
    ) -> ShoutResult<StreamMetadata>
    where
        S: AsyncRead + AsyncWrite + Send,
    {
        let request = build_request(address, &self.settings);
        log::debug!("[Handshake] Sending request:\n{}", request.trim_end());
        transport.write_all(request.as_bytes()).await?;

        let block = read_header_block(transport, self.settings.max_header_bytes).await?;
        let mut lines = block.lines();

        let status = StatusLine::parse(lines.next().unwrap_or_default())?;
        log::debug!(
            "[Handshake] Status {} {} -> {:?}",
            status.protocol,
            status.code,
            status.classify()
        );
        status.classify().into_result()?;

        let metadata = StreamMetadata::from_headers(HeaderMap::parse(lines))?;

        if let Some(observer) = &self.observer {
            observer.headers_received(&metadata).await?;
        }

        Ok(metadata)
    }
}

/// Connects with default settings.
pub async fn connect(url: &Url) -> ShoutResult<ShoutcastStream<TcpStream>> {
    Connector::default().connect(url).await
}
