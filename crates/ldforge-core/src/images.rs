//! Image candidate extraction and ranking
//!
//! Pulls candidate URLs out of raw page markup (social-preview meta tags
//! first, inline images last), unwraps the image-optimizer rewrite, drops
//! known-dead asset paths, and selects a hero and a logo through explicit
//! priority chains. The chains live here as ordered fallbacks so the
//! ranking itself is a single reviewable artifact.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::trace;
use url::Url;

use crate::types::{CandidateSource, ImageCandidate, ResolvedImages};
use crate::url_utils::is_canonical_asset_host;

/// Path of the image-optimizer endpoint whose `url` query parameter
/// carries the true source URL
const PROXY_PATH: &str = "/_next/image";

static HERO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)hero|masthead|banner").expect("invalid hero regex"));
static LOGO_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)logo").expect("invalid logo regex"));
static PACK_SHOT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)bottle|pack").expect("invalid pack-shot regex"));

/// Asset paths with a high historical dead-link rate
static BLOCKED_PATHS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)/themes/",
        r"(?i)/assets/(19|20)\d{2}/",
        r"(?i)/icons?/",
        r"(?i)sprite",
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).expect("invalid block-list regex"))
    .collect()
});

/// Legacy CMS uploads; dead unless served through the optimizer
static LEGACY_CMS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)/sites/default/files/").expect("invalid legacy path regex"));

/// A candidate plus the unwrapped asset URL used for ranking only
struct Candidate {
    public: ImageCandidate,
    asset_url: String,
}

/// Resolve the best hero and logo image for a named entity out of raw HTML.
///
/// Pure over its inputs; candidates are discarded after selection.
pub fn resolve_images(raw_html: &str, entity_name: &str, origin: &str) -> ResolvedImages {
    let candidates = collect_candidates(raw_html, origin);
    let entity = slug(entity_name);

    ResolvedImages {
        hero: pick_hero(&candidates, &entity).map(|c| c.public.clone()),
        logo: pick_logo(&candidates, &entity).map(|c| c.public.clone()),
    }
}

/// Collect raw candidate URLs in priority order of trust:
/// og:image, twitter:image, then inline `<img>` elements.
fn collect_candidates(raw_html: &str, origin: &str) -> Vec<Candidate> {
    let document = Html::parse_document(raw_html);
    let mut raw: Vec<(String, CandidateSource)> = Vec::new();

    for content in select_attr(&document, "meta[property=\"og:image\"]", "content") {
        raw.push((content, CandidateSource::MetaPrimary));
    }
    for content in select_attr(&document, "meta[name=\"twitter:image\"]", "content") {
        raw.push((content, CandidateSource::MetaSecondary));
    }
    for src in select_attr(&document, "img[src]", "src") {
        raw.push((src, CandidateSource::Inline));
    }

    raw.into_iter()
        .filter_map(|(url, source)| build_candidate(&url, origin, source))
        .collect()
}

fn select_attr(document: &Html, selector_str: &str, attr: &str) -> Vec<String> {
    match Selector::parse(selector_str) {
        Ok(selector) => document
            .select(&selector)
            .filter_map(|el| el.value().attr(attr))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect(),
        Err(_) => Vec::new(),
    }
}

fn build_candidate(url: &str, origin: &str, source: CandidateSource) -> Option<Candidate> {
    let base = Url::parse(origin).ok()?;
    let absolute = base.join(url).ok()?;
    let display_url = absolute.to_string();

    let inner = unwrap_proxy(&absolute, &base);
    let is_wrapped = inner.is_some();
    let asset_url = inner.clone().unwrap_or_else(|| display_url.clone());

    if BLOCKED_PATHS.iter().any(|re| re.is_match(&asset_url)) {
        trace!(url = %asset_url, "image candidate rejected by block-list");
        return None;
    }
    if !is_wrapped && LEGACY_CMS_RE.is_match(&asset_url) {
        trace!(url = %asset_url, "image candidate rejected: legacy CMS path");
        return None;
    }

    // Persist the unwrapped URL only when it points at our own asset host;
    // anything else keeps the original (possibly wrapped) URL.
    let resolved_url = match &inner {
        Some(inner_url) => match Url::parse(inner_url) {
            Ok(parsed) if is_canonical_asset_host(&parsed, origin) => inner_url.clone(),
            _ => display_url.clone(),
        },
        None => display_url.clone(),
    };

    Some(Candidate {
        public: ImageCandidate {
            display_url,
            resolved_url,
            is_wrapped,
            source,
        },
        asset_url,
    })
}

/// Unwrap the optimizer rewrite. The `url` query value comes back from
/// `query_pairs` already percent-decoded exactly once; it is kept as-is
/// and never re-encoded, since double-encoding corrupts inner URLs that
/// were encoded to begin with.
fn unwrap_proxy(url: &Url, base: &Url) -> Option<String> {
    if url.path() != PROXY_PATH {
        return None;
    }
    let inner = url
        .query_pairs()
        .find(|(key, _)| key == "url")
        .map(|(_, value)| value.into_owned())?;

    if inner.starts_with('/') {
        let origin = base.origin().ascii_serialization();
        Some(format!("{}{}", origin.trim_end_matches('/'), inner))
    } else {
        Some(inner)
    }
}

/// Hero priority, first match wins
fn pick_hero<'a>(candidates: &'a [Candidate], entity: &str) -> Option<&'a Candidate> {
    let hero = |c: &Candidate| HERO_RE.is_match(&c.asset_url);
    let named = |c: &Candidate| filename_has_entity(c, entity);

    find(candidates, |c| c.public.source == CandidateSource::MetaPrimary && hero(c))
        .or_else(|| find(candidates, |c| c.public.is_wrapped && hero(c)))
        .or_else(|| find(candidates, |c| hero(c)))
        .or_else(|| find(candidates, |c| c.public.is_wrapped && named(c)))
        .or_else(|| find(candidates, |c| named(c)))
        .or_else(|| find(candidates, |c| PACK_SHOT_RE.is_match(filename(&c.asset_url)) && named(c)))
        .or_else(|| find(candidates, |c| c.public.source == CandidateSource::MetaPrimary))
}

/// Logo priority, first match wins
fn pick_logo<'a>(candidates: &'a [Candidate], entity: &str) -> Option<&'a Candidate> {
    let logo = |c: &Candidate| LOGO_RE.is_match(&c.asset_url);
    let named = |c: &Candidate| filename_has_entity(c, entity);

    find(candidates, |c| c.public.is_wrapped && named(c) && logo(c))
        .or_else(|| find(candidates, |c| named(c) && logo(c)))
        .or_else(|| find(candidates, |c| c.public.is_wrapped && logo(c)))
        .or_else(|| find(candidates, |c| logo(c)))
}

fn find<'a>(
    candidates: &'a [Candidate],
    pred: impl Fn(&Candidate) -> bool,
) -> Option<&'a Candidate> {
    candidates.iter().find(|c| pred(c))
}

fn filename_has_entity(candidate: &Candidate, entity: &str) -> bool {
    !entity.is_empty() && slug(filename(&candidate.asset_url)).contains(entity)
}

/// Last path segment, query and fragment stripped
fn filename(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/').next().unwrap_or(path)
}

/// Lowercased alphanumeric form, so "Glen Ardach" matches
/// "glen-ardach-bottle.jpg"
fn slug(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}
