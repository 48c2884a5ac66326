//! URL and referrer rewriting shared by all reporters.
//!
//! Multi-domain mirroring reports one page load under several site
//! identities: the mirrored report replaces the hostname segment of the
//! current URL (and referrer) with the target domain while keeping scheme,
//! path, query, and fragment intact.

use chrono::Utc;

/// Reported URLs are cut to this many characters before transmission.
pub const MAX_REPORT_URL_LEN: usize = 1800;

/// Rewrite the full page URL for a target domain. No override returns the
/// URL verbatim; an override replaces the first occurrence of the current
/// hostname.
pub fn rewrite_hostname(href: &str, current_hostname: &str, target: Option<&str>) -> String {
    match target {
        None | Some("") => href.to_string(),
        Some(target) => href.replacen(current_hostname, target, 1),
    }
}

/// Rewrite the referrer the same way, so a mirrored report carries an
/// internal referrer under the mirror's own identity.
pub fn rewrite_referrer(referrer: &str, current_hostname: &str, target: Option<&str>) -> String {
    match target {
        None | Some("") => referrer.to_string(),
        Some(target) => referrer.replacen(current_hostname, target, 1),
    }
}

/// Truncate a URL at its first `?`.
pub fn strip_query(url: &str) -> &str {
    match url.find('?') {
        Some(idx) => &url[..idx],
        None => url,
    }
}

/// Cap a URL at [`MAX_REPORT_URL_LEN`] characters, on a character boundary.
pub fn cap_length(url: &str) -> &str {
    match url.char_indices().nth(MAX_REPORT_URL_LEN) {
        Some((idx, _)) => &url[..idx],
        None => url,
    }
}

/// Cache-buster value for GET reports: current epoch milliseconds.
pub fn cache_buster() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_override_is_identity() {
        let href = "https://a.com/x?y=1#frag";
        assert_eq!(rewrite_hostname(href, "a.com", None), href);
        assert_eq!(rewrite_hostname(href, "a.com", Some("")), href);
    }

    #[test]
    fn test_override_replaces_hostname_only() {
        assert_eq!(
            rewrite_hostname("https://a.com/x?y=1", "a.com", Some("b.com")),
            "https://b.com/x?y=1"
        );
        assert_eq!(
            rewrite_hostname("https://a.com/x?y=1#frag", "a.com", Some("b.com")),
            "https://b.com/x?y=1#frag"
        );
    }

    #[test]
    fn test_override_replaces_first_occurrence() {
        // Hostname repeated in the path: only the authority is rewritten.
        assert_eq!(
            rewrite_hostname("https://a.com/link/a.com", "a.com", Some("b.com")),
            "https://b.com/link/a.com"
        );
    }

    #[test]
    fn test_referrer_rewrite() {
        assert_eq!(
            rewrite_referrer("https://a.com/landing", "a.com", Some("b.com")),
            "https://b.com/landing"
        );
        assert_eq!(rewrite_referrer("https://other.com/", "a.com", Some("b.com")), "https://other.com/");
        assert_eq!(rewrite_referrer("", "a.com", Some("b.com")), "");
    }

    #[test]
    fn test_strip_query() {
        assert_eq!(strip_query("https://a.com/x?y=1"), "https://a.com/x");
        assert_eq!(strip_query("https://a.com/x"), "https://a.com/x");
        assert_eq!(strip_query("https://a.com/x?a=1?b=2"), "https://a.com/x");
    }

    #[test]
    fn test_cap_length() {
        let long = format!("https://a.com/{}", "p".repeat(3000));
        let capped = cap_length(&long);
        assert_eq!(capped.chars().count(), MAX_REPORT_URL_LEN);

        let short = "https://a.com/x";
        assert_eq!(cap_length(short), short);

        let exact = "x".repeat(MAX_REPORT_URL_LEN);
        assert_eq!(cap_length(&exact), exact);
    }

    #[test]
    fn test_cap_length_multibyte_boundary() {
        let long = "ü".repeat(2000);
        let capped = cap_length(&long);
        assert_eq!(capped.chars().count(), MAX_REPORT_URL_LEN);
    }
}
