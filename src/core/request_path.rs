// src/core/request_path.rs

//! Normalization of inbound URL paths into cache keys and store lookups.

use super::errors::MirrorError;
use std::fmt;

/// A normalized, percent-decoded request path such as `/@scope/name`.
///
/// Two requests that normalize to the same `RequestPath` ask for the same
/// logical document. A `RequestPath` never contains `..`, `.`, or empty
/// segments, so it can be joined under the output directory safely.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestPath(String);

impl RequestPath {
    /// Parses the path component of a request URI (without the query string).
    pub fn parse(raw: &str) -> Result<Self, MirrorError> {
        let decoded = urlencoding::decode(raw)
            .map_err(|_| MirrorError::NotFound(raw.to_string()))?;

        if decoded.contains('\0') || decoded.contains('\\') {
            return Err(MirrorError::NotFound(raw.to_string()));
        }

        let mut normalized = String::with_capacity(decoded.len() + 1);
        for segment in decoded.split('/') {
            match segment {
                "" | "." => continue,
                ".." => return Err(MirrorError::NotFound(raw.to_string())),
                s => {
                    normalized.push('/');
                    normalized.push_str(s);
                }
            }
        }
        if normalized.is_empty() {
            normalized.push('/');
        }
        Ok(Self(normalized))
    }

    /// The normalized path, always starting with `/`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The path without its leading slash, for joining onto a directory.
    pub fn relative(&self) -> &str {
        self.0.trim_start_matches('/')
    }

    /// True for the registry root `/`.
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }
}

impl fmt::Display for RequestPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
