//! URL helpers shared by the canonicalizer, validator, and image resolver

use url::Url;

/// Normalize a URL to its origin (scheme + host + optional port).
///
/// Falls back to trimming trailing slashes if the input cannot be parsed.
pub fn normalize_origin(input: &str) -> String {
    match Url::parse(input) {
        Ok(parsed) => parsed
            .origin()
            .ascii_serialization()
            .trim_end_matches('/')
            .to_string(),
        Err(_) => input.trim_end_matches('/').to_string(),
    }
}

/// Whether an id is an absolute URL outside the canonical origin.
///
/// External references cannot be verified locally, so integrity checks
/// exempt them. Origins are compared component-wise (scheme, host,
/// port); a plain string-prefix test would claim hosts that merely
/// extend the origin's text. With no origin supplied, any absolute URL
/// counts as external.
pub fn is_external(id: &str, origin: Option<&str>) -> bool {
    let Ok(parsed) = Url::parse(id) else {
        return false;
    };
    match origin {
        Some(origin) => match Url::parse(origin) {
            Ok(origin_url) => parsed.origin() != origin_url.origin(),
            Err(_) => true,
        },
        None => true,
    }
}

/// Last non-empty path segment of a URL, e.g. the item slug of a detail page
pub fn last_path_segment(input: &str) -> Option<String> {
    let parsed = Url::parse(input).ok()?;
    parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .next_back()
        .map(str::to_string)
}

/// Whether `candidate` lives on the canonical asset host (the origin's
/// host, ignoring a `www.` prefix on either side).
pub fn is_canonical_asset_host(candidate: &Url, origin: &str) -> bool {
    let origin_host = match Url::parse(origin).ok().and_then(|u| u.host_str().map(str::to_string)) {
        Some(h) => h,
        None => return false,
    };
    let origin_host = origin_host.trim_start_matches("www.").to_string();

    match candidate.host_str() {
        Some(host) => {
            let host = host.trim_start_matches("www.");
            host == origin_host || host.ends_with(&format!(".{origin_host}"))
        }
        None => false,
    }
}
