//! Source locator validation and normalization.
//!
//! Every accepted target is rewritten to `https://www.youtube.com/watch?v=<id>`
//! before it reaches the queue, so the same video submitted through a short
//! link, an embed link or a watch link is the same target string.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use crate::error::ControlError;

const CANONICAL_PREFIX: &str = "https://www.youtube.com/watch?v=";

/// Hosts recognized as the source platform (subdomains included).
const SOURCE_HOSTS: &[&str] = &["youtube.com", "youtu.be", "youtube-nocookie.com"];

/// Ordered extraction rules; the first capture group is the 11-character video id.
static ID_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^(?:https?://)?(?:www\.|m\.|music\.)?youtube\.com/watch\?(?:[^#]*&)?v=([A-Za-z0-9_-]{11})",
        r"^(?:https?://)?youtu\.be/([A-Za-z0-9_-]{11})",
        r"^(?:https?://)?(?:www\.|m\.)?youtube(?:-nocookie)?\.com/(?:embed|shorts|live|v)/([A-Za-z0-9_-]{11})",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("static locator pattern"))
    .collect()
});

/// Video id embedded in `raw`, if any rule matches.
pub fn extract_video_id(raw: &str) -> Option<&str> {
    let raw = raw.trim();
    ID_RULES
        .iter()
        .find_map(|rule| rule.captures(raw))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Canonical locator for `raw`; unmatched input passes through unchanged.
pub fn normalize(raw: &str) -> String {
    match extract_video_id(raw) {
        Some(id) => format!("{CANONICAL_PREFIX}{id}"),
        None => raw.to_string(),
    }
}

/// True if `raw` parses as a URL on one of the source platform's hosts.
/// A missing scheme is tolerated (`youtu.be/...`).
pub fn is_source_locator(raw: &str) -> bool {
    let raw = raw.trim();
    let parsed = Url::parse(raw).or_else(|_| Url::parse(&format!("https://{raw}")));
    let Ok(url) = parsed else {
        return false;
    };
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();
    SOURCE_HOSTS
        .iter()
        .any(|h| host == *h || host.ends_with(&format!(".{h}")))
}

/// Enqueue-time check: non-empty, recognized platform. Returns the canonical locator.
pub fn validate(raw: &str) -> Result<String, ControlError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ControlError::InvalidInput("target is empty".into()));
    }
    if !is_source_locator(trimmed) {
        return Err(ControlError::InvalidInput(format!(
            "not a recognized source locator: {trimmed}"
        )));
    }
    Ok(normalize(trimmed))
}
