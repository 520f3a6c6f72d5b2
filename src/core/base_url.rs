// src/core/base_url.rs

//! Derives the mirror's own base URL from an inbound request.

use std::fmt;
use url::Url;

/// Hostname used when a request carries no usable `Host` header.
pub const FALLBACK_HOST: &str = "localhost";

/// The `http://<host>:<port>` origin that rewritten tarball URLs point at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl(Url);

impl BaseUrl {
    /// Builds the base URL for a request whose `Host` header is `host_header`,
    /// served on `port`. Any port in the header is ignored in favour of the
    /// mirror's listening port.
    pub fn for_request(host_header: Option<&str>, port: u16) -> Self {
        host_header
            .and_then(hostname_of)
            .and_then(|host| Self::from_parts(host, port))
            .or_else(|| Self::from_parts(FALLBACK_HOST, port))
            .unwrap_or_else(|| {
                // `localhost` with any u16 port always parses.
                Self(Url::parse("http://localhost/").expect("static URL is valid"))
            })
    }

    fn from_parts(host: &str, port: u16) -> Option<Self> {
        let url = Url::parse(&format!("http://{host}:{port}/")).ok()?;
        if url.host_str().is_none() || url.path() != "/" {
            return None;
        }
        Some(Self(url))
    }

    /// Returns a URL on this origin carrying the given absolute path and query.
    pub fn with_path(&self, path: &str, query: Option<&str>) -> Url {
        let mut url = self.0.clone();
        url.set_path(path);
        url.set_query(query);
        url
    }

    /// The base URL as a string without a trailing slash.
    pub fn origin(&self) -> String {
        self.0.as_str().trim_end_matches('/').to_string()
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.origin())
    }
}

/// Extracts the hostname from a `Host` header value, dropping any port.
/// Returns `None` for empty or structurally invalid values.
fn hostname_of(header: &str) -> Option<&str> {
    let header = header.trim();
    if header.is_empty()
        || header
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#' | '@' | '\\'))
    {
        return None;
    }

    // Bracketed IPv6 literal, e.g. `[::1]:8080`.
    if header.starts_with('[') {
        let end = header.find(']')?;
        let rest = &header[end + 1..];
        if !(rest.is_empty() || rest.starts_with(':')) {
            return None;
        }
        return Some(&header[..=end]);
    }

    let host = match header.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host,
        Some(_) => return None,
        None => header,
    };
    if host.is_empty() || host.contains(':') {
        return None;
    }
    Some(host)
}
