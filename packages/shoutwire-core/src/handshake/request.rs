//! Connection settings and outbound request construction.

use std::time::Duration;

use url::{Host, Url};

use crate::error::{ShoutError, ShoutResult};
use crate::protocol_constants::{
    DEFAULT_PORT, DEFAULT_USER_AGENT, HANDSHAKE_TIMEOUT_SECS, MAX_HEADER_BLOCK_SIZE,
};

/// Per-attempt connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    /// Appended verbatim to the URL path in the request line.
    pub relative_path: String,
    pub user_agent: String,
    /// Upper bound on the response header block (bytes).
    pub max_header_bytes: usize,
    /// Deadline for connect + request + header block. `None` waits forever.
    pub handshake_timeout: Option<Duration>,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            relative_path: String::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_header_bytes: MAX_HEADER_BLOCK_SIZE,
            handshake_timeout: Some(Duration::from_secs(HANDSHAKE_TIMEOUT_SECS)),
        }
    }
}

impl ConnectionSettings {
    #[must_use]
    pub fn with_relative_path(mut self, relative_path: impl Into<String>) -> Self {
        self.relative_path = relative_path.into();
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub fn with_max_header_bytes(mut self, max_header_bytes: usize) -> Self {
        self.max_header_bytes = max_header_bytes;
        self
    }

    #[must_use]
    pub fn with_handshake_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.handshake_timeout = timeout;
        self
    }
}

/// Connection target derived from a server URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress {
    /// Host to dial (IPv6 literals without brackets).
    pub host: String,
    pub port: u16,
    /// Host as written in the `Host` header (IPv6 literals bracketed).
    pub host_header: String,
    pub path: String,
}

impl ServerAddress {
    /// Extracts host, port, and path from `url`.
    ///
    /// The port falls back to the scheme default, then to 80.
    pub fn from_url(url: &Url) -> ShoutResult<Self> {
        let host = match url.host() {
            Some(Host::Domain(domain)) => domain.to_string(),
            Some(Host::Ipv4(ip)) => ip.to_string(),
            Some(Host::Ipv6(ip)) => ip.to_string(),
            None => return Err(ShoutError::InvalidUrl(format!("{url} has no host"))),
        };
        let host_header = url.host_str().unwrap_or(&host).to_string();

        Ok(Self {
            host,
            port: url.port_or_known_default().unwrap_or(DEFAULT_PORT),
            host_header,
            path: url.path().to_string(),
        })
    }
}

/// Builds the handshake request text.
///
/// The `Host` header carries the port only when it differs from 80.
#[must_use]
pub fn build_request(address: &ServerAddress, settings: &ConnectionSettings) -> String {
    let host = if address.port == DEFAULT_PORT {
        address.host_header.clone()
    } else {
        format!("{}:{}", address.host_header, address.port)
    };

    format!(
        "GET {}{} HTTP/1.1\r\n\
         Icy-MetaData: 1\r\n\
         Host: {}\r\n\
         Connection: Keep-Alive\r\n\
         User-Agent: {}\r\n\r\n",
        address.path, settings.relative_path, host, settings.user_agent
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(url: &str) -> ServerAddress {
        ServerAddress::from_url(&Url::parse(url).unwrap()).unwrap()
    }

    #[test]
    fn request_includes_port_when_not_80() {
        let settings = ConnectionSettings::default()
            .with_relative_path(";")
            .with_user_agent("TestAgent/1.0");
        let request = build_request(&address("http://radio.example:8000/live"), &settings);

        assert_eq!(
            request,
            "GET /live; HTTP/1.1\r\n\
             Icy-MetaData: 1\r\n\
             Host: radio.example:8000\r\n\
             Connection: Keep-Alive\r\n\
             User-Agent: TestAgent/1.0\r\n\
             \r\n"
        );
    }

    #[test]
    fn request_omits_default_port() {
        let request = build_request(
            &address("http://radio.example/stream"),
            &ConnectionSettings::default(),
        );
        assert!(request.contains("Host: radio.example\r\n"));
        assert!(request.starts_with("GET /stream HTTP/1.1\r\n"));
        assert!(request.ends_with("\r\n\r\n"));
    }

    #[test]
    fn default_user_agent_names_the_player() {
        let settings = ConnectionSettings::default();
        assert!(settings.user_agent.starts_with("Shoutcast Player ("));
        assert!(settings.relative_path.is_empty());
    }

    #[test]
    fn ipv6_hosts_are_bracketed_only_in_header() {
        let addr = address("http://[::1]:8000/");
        assert_eq!(addr.host, "::1");
        assert_eq!(addr.host_header, "[::1]");
        assert_eq!(addr.port, 8000);
    }

    #[test]
    fn unknown_scheme_defaults_to_port_80() {
        let addr = address("icy://radio.example/stream");
        assert_eq!(addr.port, 80);
    }

    #[test]
    fn url_without_host_is_rejected() {
        let url = Url::parse("file:///tmp/stream").unwrap();
        assert!(matches!(
            ServerAddress::from_url(&url),
            Err(ShoutError::InvalidUrl(_))
        ));
    }
}
