//! Status line parsing and response classification.
//!
//! SHOUTcast servers answer with `ICY 200 OK`; Icecast and generic HTTP
//! servers answer with `HTTP/1.x <code> <reason>`. Only a handful of
//! combinations have defined handling; everything else is unclassified.

use crate::error::{ShoutError, ShoutResult};
use crate::protocol_constants::{HTTP_PROTOCOL_PREFIX, ICY_PROTOCOL};

/// Parsed first line of a handshake response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    /// Protocol token, upper-cased (`ICY`, `HTTP/1.0`, ...).
    pub protocol: String,
    pub code: i32,
    pub reason: Option<String>,
}

/// How a handshake response should be handled.
///
/// Redirects are not followed; a 3xx currently classifies as
/// [`Unclassified`](ConnectionOutcome::Unclassified).
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConnectionOutcome {
    Success,
    Fail { code: i32 },
    Unclassified { protocol: String, code: i32 },
}

impl ConnectionOutcome {
    /// Converts non-success outcomes into their errors.
    pub fn into_result(self) -> ShoutResult<()> {
        match self {
            Self::Success => Ok(()),
            Self::Fail { code } => Err(ShoutError::StatusFailure { code }),
            Self::Unclassified { protocol, code } => {
                Err(ShoutError::Unclassified { protocol, code })
            }
        }
    }
}

impl StatusLine {
    /// Parses a status line of the form `<protocol> <code>[ <reason>]`.
    ///
    /// The line is split on its first two spaces only, so the reason phrase
    /// may itself contain spaces. Any integer code is accepted; codes with no
    /// defined handling classify as unclassified.
    pub fn parse(line: &str) -> ShoutResult<Self> {
        let line = line.trim();
        if line.is_empty() {
            return Err(ShoutError::EmptyStatusLine);
        }

        let mut parts = line.splitn(3, ' ');
        let protocol = parts.next().unwrap_or_default().to_ascii_uppercase();
        let code_token = parts
            .next()
            .ok_or_else(|| ShoutError::MalformedStatusLine(line.to_string()))?;
        let code = code_token
            .parse::<i32>()
            .map_err(|_| ShoutError::InvalidStatusCode(code_token.to_string()))?;
        let reason = parts.next().map(str::to_string);

        Ok(Self {
            protocol,
            code,
            reason,
        })
    }

    /// Classifies the response per dialect.
    #[must_use]
    pub fn classify(&self) -> ConnectionOutcome {
        match (self.protocol.as_str(), self.code) {
            (ICY_PROTOCOL, 200) => ConnectionOutcome::Success,
            (p, 200) if p.starts_with(HTTP_PROTOCOL_PREFIX) => ConnectionOutcome::Success,
            (p, 404) if p.starts_with(HTTP_PROTOCOL_PREFIX) => {
                ConnectionOutcome::Fail { code: 404 }
            }
            _ => ConnectionOutcome::Unclassified {
                protocol: self.protocol.clone(),
                code: self.code,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(line: &str) -> ConnectionOutcome {
        StatusLine::parse(line).unwrap().classify()
    }

    #[test]
    fn parses_three_tokens() {
        let status = StatusLine::parse("HTTP/1.1 404 Not Found").unwrap();
        assert_eq!(status.protocol, "HTTP/1.1");
        assert_eq!(status.code, 404);
        assert_eq!(status.reason.as_deref(), Some("Not Found"));
    }

    #[test]
    fn reason_is_optional() {
        let status = StatusLine::parse("ICY 200").unwrap();
        assert_eq!(status.reason, None);
    }

    #[test]
    fn icy_and_http_200_succeed_regardless_of_case() {
        assert_eq!(classify("ICY 200 OK"), ConnectionOutcome::Success);
        assert_eq!(classify("icy 200 OK"), ConnectionOutcome::Success);
        assert_eq!(classify("HTTP/1.0 200 OK"), ConnectionOutcome::Success);
        assert_eq!(classify("http/1.1 200 OK"), ConnectionOutcome::Success);
    }

    #[test]
    fn http_404_is_classified_failure() {
        assert_eq!(
            classify("HTTP/1.1 404 Not Found"),
            ConnectionOutcome::Fail { code: 404 }
        );
    }

    #[test]
    fn other_combinations_are_unclassified() {
        for line in ["ICY 404 Not Found", "HTTP/1.1 302 Found", "RTSP/1.0 200 OK"] {
            assert!(
                matches!(classify(line), ConnectionOutcome::Unclassified { .. }),
                "{line} should be unclassified"
            );
        }
    }

    #[test]
    fn unparseable_code_is_protocol_error() {
        let err = StatusLine::parse("ICY abc OK").unwrap_err();
        assert!(matches!(err, ShoutError::InvalidStatusCode(ref t) if t == "abc"));
        assert!(err.is_protocol_error());
    }

    #[test]
    fn out_of_range_integer_code_is_unclassified() {
        let status = StatusLine::parse("ICY 70000 Weird").unwrap();
        assert_eq!(status.code, 70000);
        assert_eq!(
            status.classify(),
            ConnectionOutcome::Unclassified {
                protocol: "ICY".to_string(),
                code: 70000,
            }
        );
        assert!(matches!(
            StatusLine::parse("HTTP/1.1 -1 Odd").unwrap().classify(),
            ConnectionOutcome::Unclassified { code: -1, .. }
        ));
    }

    #[test]
    fn blank_and_single_token_lines_are_rejected() {
        assert!(matches!(
            StatusLine::parse("   "),
            Err(ShoutError::EmptyStatusLine)
        ));
        assert!(matches!(
            StatusLine::parse("ICY"),
            Err(ShoutError::MalformedStatusLine(_))
        ));
    }

    #[test]
    fn outcome_maps_to_distinct_errors() {
        let fail = ConnectionOutcome::Fail { code: 404 }.into_result().unwrap_err();
        assert!(matches!(fail, ShoutError::StatusFailure { code: 404 }));

        let unclassified = classify("ICY 401 Unauthorized").into_result().unwrap_err();
        assert!(matches!(
            unclassified,
            ShoutError::Unclassified { code: 401, .. }
        ));
    }
}
