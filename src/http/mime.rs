//! Media range module
//!
//! Normalizes `type/subtype` masks from an Accept header and matches
//! concrete media types against them.

/// Media types that indicate the client renders HTML
pub const HTML_TYPES: [&str; 4] = [
    "text/html",
    "application/xhtml+xml",
    "application/xml",
    "text/xml",
];

/// Normalize an Accept mask to lowercase `major/minor`
///
/// Returns `None` for masks the MIME negotiator cannot use: no `/`, or a
/// wildcard major type with a concrete minor type. A bare `*` is read as
/// `*/*`.
///
/// # Examples
/// ```
/// use yarhs_conditional::http::mime::normalize_media_range;
/// assert_eq!(normalize_media_range("Text/HTML").as_deref(), Some("text/html"));
/// assert_eq!(normalize_media_range("*").as_deref(), Some("*/*"));
/// assert_eq!(normalize_media_range("*/html"), None);
/// assert_eq!(normalize_media_range("html"), None);
/// ```
pub fn normalize_media_range(mask: &str) -> Option<String> {
    if mask == "*" {
        return Some("*/*".to_string());
    }
    let (major, minor) = mask.split_once('/')?;
    if major.is_empty() || minor.is_empty() || minor.contains('/') {
        return None;
    }
    if major == "*" && minor != "*" {
        return None;
    }
    Some(format!(
        "{}/{}",
        major.to_ascii_lowercase(),
        minor.to_ascii_lowercase()
    ))
}

/// Check whether a concrete media type falls inside a normalized mask
///
/// Parameters on the offer (`text/html; charset=utf-8`) are ignored.
pub fn media_range_matches(mask: &str, offer: &str) -> bool {
    if mask == "*/*" {
        return true;
    }
    let offer = offer.split(';').next().unwrap_or_default().trim();
    let (Some((mask_major, mask_minor)), Some((offer_major, offer_minor))) =
        (mask.split_once('/'), offer.split_once('/'))
    else {
        return false;
    };

    mask_major.eq_ignore_ascii_case(offer_major)
        && (mask_minor == "*" || mask_minor.eq_ignore_ascii_case(offer_minor))
}
