//! Response header parsing.
//!
//! Keys are normalized to upper case on insertion. Entries keep their arrival
//! order and duplicates are preserved, so lookups always return the first
//! occurrence.

use std::str::FromStr;

use crate::error::{ShoutError, ShoutResult};

/// A single response header with an upper-cased key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderEntry {
    pub key: String,
    pub value: String,
}

/// Ordered collection of response headers with first-match lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<HeaderEntry>,
}

impl HeaderMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses header lines, splitting each on its first colon.
    ///
    /// Lines without a colon (including blank lines) are skipped.
    pub fn parse<'a, I>(lines: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut map = Self::new();
        for line in lines {
            match line.split_once(':') {
                Some((key, value)) => map.push(key, value),
                None if line.trim().is_empty() => {}
                None => log::debug!("[Handshake] Skipping header line without colon: {:?}", line),
            }
        }
        map
    }

    /// Appends an entry, trimming both parts and upper-casing the key.
    pub fn push(&mut self, key: &str, value: &str) {
        self.entries.push(HeaderEntry {
            key: key.trim().to_ascii_uppercase(),
            value: value.trim().to_string(),
        });
    }

    /// Returns the first value for `name` (case-insensitive), if present.
    #[must_use]
    pub fn optional(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.key.eq_ignore_ascii_case(name))
            .map(|entry| entry.value.as_str())
    }

    /// Returns the first value for `name`, or [`ShoutError::MissingHeader`].
    pub fn required(&self, name: &'static str) -> ShoutResult<&str> {
        self.optional(name).ok_or(ShoutError::MissingHeader(name))
    }

    /// Returns the first value for `name` parsed as `T`.
    ///
    /// Fails with [`ShoutError::MissingHeader`] when absent and
    /// [`ShoutError::InvalidHeaderValue`] when the value does not parse.
    pub fn required_parsed<T: FromStr>(&self, name: &'static str) -> ShoutResult<T> {
        let value = self.required(name)?;
        value.parse().map_err(|_| ShoutError::InvalidHeaderValue {
            header: name,
            value: value.to_string(),
        })
    }

    /// Iterates over entries in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = &HeaderEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_normalizes_keys_and_trims_values() {
        let map = HeaderMap::parse(["icy-name:  Foo FM ", "Content-Type:audio/mpeg"]);
        let keys: Vec<_> = map.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, ["ICY-NAME", "CONTENT-TYPE"]);
        assert_eq!(map.optional("ICY-NAME"), Some("Foo FM"));
    }

    #[test]
    fn lookups_are_case_insensitive() {
        let lower = HeaderMap::parse(["icy-name: Foo"]);
        let upper = HeaderMap::parse(["ICY-NAME: Foo"]);
        assert_eq!(lower.optional("icy-name"), upper.optional("ICY-NAME"));
        assert_eq!(lower.optional("Icy-Name"), Some("Foo"));
    }

    #[test]
    fn value_keeps_everything_after_first_colon() {
        let map = HeaderMap::parse(["icy-url: http://example.com:8000/"]);
        assert_eq!(map.optional("ICY-URL"), Some("http://example.com:8000/"));
    }

    #[test]
    fn lines_without_colon_are_skipped() {
        let map = HeaderMap::parse(["garbage line", "", "icy-br: 128"]);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn duplicates_resolve_to_first_match() {
        let map = HeaderMap::parse(["icy-br: 128", "ICY-BR: 64"]);
        assert_eq!(map.len(), 2);
        assert_eq!(map.required_parsed::<u32>("ICY-BR").unwrap(), 128);
    }

    #[test]
    fn required_reports_missing_header() {
        let map = HeaderMap::new();
        assert!(matches!(
            map.required("ICY-METAINT"),
            Err(ShoutError::MissingHeader("ICY-METAINT"))
        ));
    }

    #[test]
    fn required_parsed_reports_bad_value() {
        let map = HeaderMap::parse(["icy-br: fast"]);
        match map.required_parsed::<u32>("ICY-BR") {
            Err(ShoutError::InvalidHeaderValue { header, value }) => {
                assert_eq!(header, "ICY-BR");
                assert_eq!(value, "fast");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
