// src/core/rewrite.rs

//! Rewrites distribution URLs embedded in package metadata so that clients
//! fetch tarballs from this mirror instead of the upstream registry.
//!
//! Package documents carry one entry per published version, each with a
//! `dist.tarball` URL:
//!
//! ```json
//! { "versions": { "1.0.0": { "dist": { "tarball": "https://registry.example.com/left-pad/-/left-pad-1.0.0.tgz" } } } }
//! ```
//!
//! The tarball's path and query are kept; its origin is replaced by the
//! mirror's [`BaseUrl`]. Nothing else in the document is touched.

use super::base_url::BaseUrl;
use serde_json::Value;
use url::Url;

/// Returns a copy of `document` with every tarball URL pointed at `base`.
pub fn rewrite(mut document: Value, base: &BaseUrl) -> Value {
    rewrite_in_place(&mut document, base);
    document
}

/// Rewrites tarball URLs in place and returns how many were replaced.
pub fn rewrite_in_place(document: &mut Value, base: &BaseUrl) -> usize {
    let Some(versions) = document.get_mut("versions").and_then(Value::as_object_mut) else {
        return 0;
    };

    let mut rewritten = 0;
    for version in versions.values_mut() {
        let Some(tarball) = version
            .get_mut("dist")
            .and_then(|dist| dist.get_mut("tarball"))
        else {
            continue;
        };
        if let Some(new_url) = tarball.as_str().map(|url| relocate(url, base)) {
            *tarball = Value::String(new_url);
            rewritten += 1;
        }
    }
    rewritten
}

/// Moves a single tarball URL onto the mirror's origin.
fn relocate(tarball: &str, base: &BaseUrl) -> String {
    match Url::parse(tarball) {
        Ok(upstream) => base.with_path(upstream.path(), upstream.query()).into(),
        // Relative references resolve against the mirror root.
        Err(_) => match base.as_url().join(tarball) {
            Ok(joined) => joined.into(),
            Err(_) => format!("{}/{}", base.origin(), tarball.trim_start_matches('/')),
        },
    }
}
