//! Small text and URL helpers shared by strategies
//!
//! Every helper returns `Option` for "not found"; none of them fail.

use percent_encoding::percent_decode_str;
use url::Url;

/// Value of a `Label : value` row when the label matches case-insensitively.
///
/// `value_after_label("Name : foo.mkv", "name")` yields `Some("foo.mkv")`.
#[must_use]
pub fn value_after_label(text: &str, label: &str) -> Option<String> {
    let (head, tail) = text.split_once(':')?;
    if !head.trim().eq_ignore_ascii_case(label.trim()) {
        return None;
    }
    let value = tail.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Everything after the first occurrence of `marker`.
#[must_use]
pub fn substring_after<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    text.find(marker).map(|idx| &text[idx + marker.len()..])
}

/// Everything after `?{param}=` or `&{param}=` in a URL, percent-decoded when
/// the value is an encoded URL.
///
/// The value runs to the end of the URL so unencoded nested query strings
/// stay intact.
#[must_use]
pub fn param_value(url: &str, param: &str) -> Option<String> {
    let raw = ['?', '&']
        .into_iter()
        .find_map(|sep| substring_after(url, &format!("{sep}{param}=")))?;
    if raw.is_empty() {
        return None;
    }
    if raw.contains("://") {
        Some(raw.to_string())
    } else {
        Some(percent_decode_str(raw).decode_utf8_lossy().into_owned())
    }
}

/// `scheme://host[:port]` of a URL.
#[must_use]
pub fn origin(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed.host_str()?;
    Some(parsed.origin().ascii_serialization())
}

/// Resolve `href` against `base`. Absolute hrefs are returned as-is.
#[must_use]
pub fn absolutize(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    if let Ok(url) = Url::parse(href) {
        return Some(url.to_string());
    }
    Url::parse(base).ok()?.join(href).ok().map(|u| u.to_string())
}

/// True for parseable `http`/`https` URLs with a host.
#[must_use]
pub fn is_absolute_http(url: &str) -> bool {
    Url::parse(url)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}

/// Collapse runs of whitespace (including newlines from markup) to one space.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode the handful of entities and JS escapes that show up inside
/// attribute values and script string literals.
#[must_use]
pub fn unescape_link(link: &str) -> String {
    link.replace("\\/", "/")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}
