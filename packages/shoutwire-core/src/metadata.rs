//! Typed station and audio metadata extracted from handshake headers.

use serde::Serialize;

use crate::error::{ShoutError, ShoutResult};
use crate::handshake::HeaderMap;
use crate::protocol_constants::{
    HEADER_BITRATE, HEADER_CONTENT_TYPE, HEADER_DESCRIPTION, HEADER_GENRE, HEADER_METAINT,
    HEADER_NAME, HEADER_PUBLIC, HEADER_URL,
};

/// Audio encoding advertised by the server's `Content-Type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AudioFormat {
    Mp3,
    Aac,
    /// AAC+ carried in ADTS frames (`audio/aacp`).
    AacAdts,
    Unknown,
}

impl AudioFormat {
    /// Maps a content type by exact, case-insensitive match.
    #[must_use]
    pub fn from_content_type(content_type: &str) -> Self {
        match content_type.trim().to_ascii_lowercase().as_str() {
            "audio/mpeg" => Self::Mp3,
            "audio/aac" => Self::Aac,
            "audio/aacp" => Self::AacAdts,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub fn is_playable(self) -> bool {
        self != Self::Unknown
    }
}

/// Station identity as announced by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationInfo {
    pub name: String,
    pub genre: String,
    pub description: Option<String>,
    /// Station homepage (`icy-url`).
    pub url: Option<String>,
    /// Whether the station is listed in public directories (`icy-pub`).
    pub public: Option<bool>,
}

/// Encoding parameters of the audio payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioInfo {
    /// Nominal bit rate in kbit/s.
    pub bit_rate: u32,
    pub format: AudioFormat,
    /// Raw `Content-Type` value the format was derived from.
    pub content_type: String,
}

impl AudioInfo {
    /// Rejects streams whose format could not be recognized.
    ///
    /// Must be checked before handing the stream to a decoder.
    pub fn ensure_playable(&self) -> ShoutResult<()> {
        if self.format.is_playable() {
            Ok(())
        } else {
            Err(ShoutError::UnsupportedFormat(self.content_type.clone()))
        }
    }
}

/// Everything negotiated during a successful handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamMetadata {
    pub station: StationInfo,
    pub audio: AudioInfo,
    /// Audio bytes between in-stream metadata blocks. Zero disables them.
    pub metadata_interval: u32,
    #[serde(skip)]
    pub headers: HeaderMap,
}

impl StreamMetadata {
    /// Maps parsed headers into typed metadata.
    ///
    /// `icy-metaint`, `icy-name`, `icy-genre`, `icy-br` and `content-type` are
    /// required; their absence is an error rather than a default.
    pub fn from_headers(headers: HeaderMap) -> ShoutResult<Self> {
        let metadata_interval = headers.required_parsed::<u32>(HEADER_METAINT)?;

        let station = StationInfo {
            name: headers.required(HEADER_NAME)?.to_string(),
            genre: headers.required(HEADER_GENRE)?.to_string(),
            description: headers.optional(HEADER_DESCRIPTION).map(str::to_string),
            url: headers.optional(HEADER_URL).map(str::to_string),
            public: headers.optional(HEADER_PUBLIC).and_then(|v| match v {
                "1" => Some(true),
                "0" => Some(false),
                _ => None,
            }),
        };

        let bit_rate = headers.required_parsed::<u32>(HEADER_BITRATE)?;
        let content_type = headers.required(HEADER_CONTENT_TYPE)?.to_string();
        let audio = AudioInfo {
            bit_rate,
            format: AudioFormat::from_content_type(&content_type),
            content_type,
        };

        Ok(Self {
            station,
            audio,
            metadata_interval,
            headers,
        })
    }

    /// Returns true when the stream interleaves metadata blocks.
    #[must_use]
    pub fn metadata_enabled(&self) -> bool {
        self.metadata_interval > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: [&str; 7] = [
        "icy-metaint: 16000",
        "icy-name: Foo FM",
        "icy-genre: Jazz",
        "icy-description: Smooth all day",
        "icy-br: 128",
        "icy-pub: 1",
        "content-type: audio/mpeg",
    ];

    fn headers_without(skip: &str) -> HeaderMap {
        HeaderMap::parse(FULL.iter().copied().filter(|l| !l.starts_with(skip)))
    }

    #[test]
    fn maps_all_fields() {
        let meta = StreamMetadata::from_headers(HeaderMap::parse(FULL)).unwrap();
        assert_eq!(meta.metadata_interval, 16000);
        assert!(meta.metadata_enabled());
        assert_eq!(meta.station.name, "Foo FM");
        assert_eq!(meta.station.genre, "Jazz");
        assert_eq!(meta.station.description.as_deref(), Some("Smooth all day"));
        assert_eq!(meta.station.public, Some(true));
        assert_eq!(meta.station.url, None);
        assert_eq!(meta.audio.bit_rate, 128);
        assert_eq!(meta.audio.format, AudioFormat::Mp3);
    }

    #[test]
    fn description_is_optional() {
        let meta = StreamMetadata::from_headers(headers_without("icy-description")).unwrap();
        assert_eq!(meta.station.description, None);
    }

    #[test]
    fn missing_metaint_is_fatal() {
        let err = StreamMetadata::from_headers(headers_without("icy-metaint")).unwrap_err();
        assert!(matches!(err, ShoutError::MissingHeader("ICY-METAINT")));
    }

    #[test]
    fn missing_bitrate_is_fatal() {
        let err = StreamMetadata::from_headers(headers_without("icy-br")).unwrap_err();
        assert!(matches!(err, ShoutError::MissingHeader("ICY-BR")));
    }

    #[test]
    fn zero_interval_disables_metadata() {
        let mut lines: Vec<&str> = FULL.to_vec();
        lines[0] = "icy-metaint: 0";
        let meta = StreamMetadata::from_headers(HeaderMap::parse(lines)).unwrap();
        assert!(!meta.metadata_enabled());
    }

    #[test]
    fn content_type_mapping() {
        assert_eq!(AudioFormat::from_content_type("audio/mpeg"), AudioFormat::Mp3);
        assert_eq!(AudioFormat::from_content_type("  AUDIO/AAC "), AudioFormat::Aac);
        assert_eq!(AudioFormat::from_content_type("audio/aacp"), AudioFormat::AacAdts);
        assert_eq!(AudioFormat::from_content_type("audio/ogg"), AudioFormat::Unknown);
        assert_eq!(
            AudioFormat::from_content_type("audio/mpeg; charset=x"),
            AudioFormat::Unknown
        );
    }

    #[test]
    fn unknown_format_must_be_rejected() {
        let mut lines: Vec<&str> = FULL.to_vec();
        lines[6] = "content-type: text/html";
        let meta = StreamMetadata::from_headers(HeaderMap::parse(lines)).unwrap();
        assert_eq!(meta.audio.format, AudioFormat::Unknown);
        assert!(matches!(
            meta.audio.ensure_playable(),
            Err(ShoutError::UnsupportedFormat(ref ct)) if ct == "text/html"
        ));
    }

    #[test]
    fn serializes_without_raw_headers() {
        let meta = StreamMetadata::from_headers(HeaderMap::parse(FULL)).unwrap();
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["station"]["name"], "Foo FM");
        assert_eq!(json["audio"]["format"], "Mp3");
        assert!(json.get("headers").is_none());
    }
}
