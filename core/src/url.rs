//! Absolute URL decomposition.
//!
//! Only `http` and `https` are understood. The input is taken as already
//! being in transmittable form: nothing is percent-decoded or normalized.

use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

const SCHEME_DELIMITER: &str = "://";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    pub fn default_port(self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }

    pub fn is_secure(self) -> bool {
        self == Scheme::Https
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = ParseError;

    /// Case-sensitive: `HTTP://` is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            other => Err(ParseError::UnsupportedScheme(other.to_string())),
        }
    }
}

/// A URL split into the pieces a transport needs to open a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
    /// Request target, always starting with `/`. May carry a query.
    pub path: String,
}

impl ParsedUrl {
    /// Split `scheme://host[:port][/path]`.
    ///
    /// The host runs up to the first `/` after the delimiter. A `:` inside
    /// the host segment introduces an explicit port.
    pub fn parse(url: &str) -> Result<Self, ParseError> {
        if url.is_empty() {
            return Err(ParseError::Empty);
        }
        let (scheme, rest) = url
            .split_once(SCHEME_DELIMITER)
            .ok_or(ParseError::MissingSchemeDelimiter)?;
        let scheme: Scheme = scheme.parse()?;

        let (authority, path) = match rest.find('/') {
            Some(idx) => rest.split_at(idx),
            None => (rest, "/"),
        };

        let (host, port) = match authority.split_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| ParseError::InvalidPort(port.to_string()))?;
                (host, port)
            }
            None => (authority, scheme.default_port()),
        };
        if host.is_empty() {
            return Err(ParseError::EmptyHost);
        }

        Ok(Self {
            scheme,
            host: host.to_string(),
            port,
            path: path.to_string(),
        })
    }

    /// Append an encoded query string to the path. An empty query is a no-op.
    pub fn with_query(mut self, query: &str) -> Self {
        if !query.is_empty() {
            let separator = if self.path.contains('?') { '&' } else { '?' };
            self.path.push(separator);
            self.path.push_str(query);
        }
        self
    }

    /// `scheme://host:port`, with the port always spelled out.
    pub fn origin(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }
}

impl FromStr for ParsedUrl {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn https_defaults_to_443_and_root_path() {
        let url = ParsedUrl::parse("https://example.com").unwrap();
        assert_eq!(url.scheme, Scheme::Https);
        assert_eq!(url.host, "example.com");
        assert_eq!(url.port, 443);
        assert_eq!(url.path, "/");
    }

    #[test]
    fn http_defaults_to_80() {
        let url = ParsedUrl::parse("http://localhost/items/1").unwrap();
        assert_eq!(url.scheme, Scheme::Http);
        assert_eq!(url.port, 80);
        assert_eq!(url.path, "/items/1");
    }

    #[test]
    fn explicit_port_overrides_default() {
        let url = ParsedUrl::parse("https://api.local:8443/v1/items").unwrap();
        assert_eq!(url.host, "api.local");
        assert_eq!(url.port, 8443);
        assert_eq!(url.path, "/v1/items");
    }

    #[test]
    fn path_keeps_existing_query() {
        let url = ParsedUrl::parse("http://h/search?q=1").unwrap();
        assert_eq!(url.path, "/search?q=1");
    }

    #[test]
    fn empty_url_is_rejected() {
        assert_eq!(ParsedUrl::parse(""), Err(ParseError::Empty));
    }

    #[test]
    fn missing_delimiter_is_rejected() {
        assert_eq!(
            ParsedUrl::parse("example.com/path"),
            Err(ParseError::MissingSchemeDelimiter)
        );
    }

    #[test]
    fn unsupported_scheme_is_rejected() {
        assert_eq!(
            ParsedUrl::parse("ftp://example.com"),
            Err(ParseError::UnsupportedScheme("ftp".to_string()))
        );
        assert!(matches!(
            ParsedUrl::parse("HTTPS://example.com"),
            Err(ParseError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn non_numeric_port_is_rejected() {
        assert_eq!(
            ParsedUrl::parse("http://example.com:abc/"),
            Err(ParseError::InvalidPort("abc".to_string()))
        );
        assert!(matches!(
            ParsedUrl::parse("http://example.com:70000/"),
            Err(ParseError::InvalidPort(_))
        ));
    }

    #[test]
    fn empty_host_is_rejected() {
        assert_eq!(ParsedUrl::parse("http:///path"), Err(ParseError::EmptyHost));
        assert_eq!(ParsedUrl::parse("http://:8080/"), Err(ParseError::EmptyHost));
    }

    #[test]
    fn with_query_picks_separator() {
        let url = ParsedUrl::parse("https://example.com/items").unwrap();
        assert_eq!(url.clone().with_query("").path, "/items");
        assert_eq!(url.with_query("id=42").path, "/items?id=42");

        let url = ParsedUrl::parse("https://example.com/items?a=1").unwrap();
        assert_eq!(url.with_query("b=2").path, "/items?a=1&b=2");
    }

    #[test]
    fn origin_spells_out_port() {
        let url: ParsedUrl = "https://example.com/x".parse().unwrap();
        assert_eq!(url.origin(), "https://example.com:443");
    }
}
