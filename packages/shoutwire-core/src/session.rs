//! Live stream session returned by a successful handshake.

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite};
use url::Url;

use crate::error::ShoutResult;
use crate::handshake::ConnectionSettings;
use crate::metadata::{AudioInfo, StationInfo, StreamMetadata};
use crate::transport::BufferedTransport;

/// A connected stream positioned at the first byte after the header block.
///
/// Reads through [`transport`](Self::transport) return the raw payload,
/// including any metadata blocks the server interleaves every
/// [`metadata_interval`](Self::metadata_interval) bytes.
pub struct ShoutcastStream<S> {
    url: Url,
    settings: ConnectionSettings,
    transport: BufferedTransport<S>,
    metadata: StreamMetadata,
}

impl<S> ShoutcastStream<S>
where
    S: AsyncRead + AsyncWrite + Send,
{
    pub(crate) fn new(
        url: Url,
        settings: ConnectionSettings,
        transport: BufferedTransport<S>,
        metadata: StreamMetadata,
    ) -> Self {
        Self {
            url,
            settings,
            transport,
            metadata,
        }
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Settings used for the handshake, kept for reconnecting callers.
    #[must_use]
    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    #[must_use]
    pub fn station(&self) -> &StationInfo {
        &self.metadata.station
    }

    #[must_use]
    pub fn audio(&self) -> &AudioInfo {
        &self.metadata.audio
    }

    #[must_use]
    pub fn metadata_interval(&self) -> u32 {
        self.metadata.metadata_interval
    }

    #[must_use]
    pub fn metadata(&self) -> &StreamMetadata {
        &self.metadata
    }

    #[must_use]
    pub fn transport(&self) -> &BufferedTransport<S> {
        &self.transport
    }

    /// Reads exactly `len` raw payload bytes.
    pub async fn read_raw(&self, len: usize) -> ShoutResult<Bytes> {
        self.transport.read_buffer(len).await
    }

    /// Splits the session into its transport and negotiated metadata.
    #[must_use]
    pub fn into_parts(self) -> (BufferedTransport<S>, StreamMetadata) {
        (self.transport, self.metadata)
    }

    /// Disposes the underlying transport.
    pub async fn close(self) {
        self.transport.dispose().await;
    }
}
