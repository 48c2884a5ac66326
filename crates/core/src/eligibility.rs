//! The eligibility gate — decided exactly once per page load, before any
//! reporter is installed. Privacy signals are checked first and the whole
//! chain is fail-safe: a malformed user-supplied pattern degrades to
//! "no match" instead of taking the page down.

use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::config::TagConfig;
use crate::context::PageContext;

/// Matches `localhost` with arbitrary suffix and loopback IPv4 addresses.
const LOCALHOST_PATTERN: &str = r"(?i)^localhost(.*)$|^127(\.[0-9]{1,3}){3}$";

fn localhost_regex() -> &'static Regex {
    static LOCALHOST: OnceLock<Regex> = OnceLock::new();
    LOCALHOST.get_or_init(|| Regex::new(LOCALHOST_PATTERN).expect("localhost pattern is valid"))
}

/// Decide whether tracking is permitted for this page load.
///
/// Evaluation order: opt-out → localhost → include-mismatch → exclude-match.
/// The predicates are independent, so the order only affects which one gets
/// to short-circuit, not the outcome.
pub fn is_eligible(ctx: &dyn PageContext, config: &TagConfig) -> bool {
    if opted_out(ctx) {
        debug!("tracking disabled by opt-out or Do-Not-Track");
        return false;
    }

    if on_localhost(ctx, config.dev_mode) {
        warn!(
            hostname = %ctx.hostname(),
            "ignoring tracking on localhost; add the data-dev attribute to enable it"
        );
        return false;
    }

    let path = ctx.pathname();

    if !include_matches(&config.include_patterns, &path) {
        debug!(path = %path, "page matches no include pattern");
        return false;
    }

    if exclude_matches(&config.exclude_patterns, &path) {
        debug!(path = %path, "page matches an exclude pattern");
        return false;
    }

    true
}

fn opted_out(ctx: &dyn PageContext) -> bool {
    ctx.do_not_track() || ctx.opt_out()
}

fn on_localhost(ctx: &dyn PageContext, dev_mode: bool) -> bool {
    if dev_mode {
        return false;
    }
    localhost_regex().is_match(&ctx.hostname()) || ctx.protocol() == "file:"
}

/// An empty include list includes everything. A malformed pattern never
/// includes; the rest of the list is still consulted.
fn include_matches(patterns: &[String], path: &str) -> bool {
    if patterns.is_empty() {
        return true;
    }
    patterns
        .iter()
        .any(|source| compile(source).is_some_and(|re| re.is_match(path)))
}

/// A malformed pattern never excludes; the rest of the list is still
/// consulted.
fn exclude_matches(patterns: &[String], path: &str) -> bool {
    patterns
        .iter()
        .any(|source| compile(source).is_some_and(|re| re.is_match(path)))
}

fn compile(source: &str) -> Option<Regex> {
    match Regex::new(source) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(pattern = %source, error = %e, "ignoring malformed path pattern");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReporterKind;
    use crate::context::StaticContext;

    fn config() -> TagConfig {
        TagConfig::defaults(ReporterKind::Hit)
    }

    #[test]
    fn test_do_not_track_suppresses() {
        let ctx = StaticContext::new().with_do_not_track(true);
        assert!(!is_eligible(&ctx, &config()));
    }

    #[test]
    fn test_opt_out_suppresses() {
        let ctx = StaticContext::new().with_opt_out(true);
        assert!(!is_eligible(&ctx, &config()));
    }

    #[test]
    fn test_localhost_suppresses_without_dev_mode() {
        for url in [
            "https://localhost/page",
            "https://localhost:3000/page",
            "http://127.0.0.1/page",
            "http://127.0.0.1:8080/",
        ] {
            let ctx = StaticContext::new().with_url(url);
            assert!(!is_eligible(&ctx, &config()), "url {url}");
        }
    }

    #[test]
    fn test_localhost_match_is_case_insensitive() {
        let mut ctx = StaticContext::new();
        ctx.hostname = "LOCALHOST".to_string();
        assert!(!is_eligible(&ctx, &config()));
    }

    #[test]
    fn test_dev_mode_allows_localhost() {
        let mut config = config();
        config.dev_mode = true;
        for url in ["https://localhost:3000/page", "http://127.0.0.1/page"] {
            let ctx = StaticContext::new().with_url(url);
            assert!(is_eligible(&ctx, &config), "url {url}");
        }
    }

    #[test]
    fn test_file_protocol_suppresses() {
        let ctx = StaticContext::new().with_url("file:///home/user/index.html");
        assert!(!is_eligible(&ctx, &config()));

        let mut dev = config();
        dev.dev_mode = true;
        assert!(is_eligible(&ctx, &dev));
    }

    #[test]
    fn test_public_hostname_not_mistaken_for_localhost() {
        for url in [
            "https://example.com/",
            "https://127of.example.com/",
            "https://mylocalhost.example.com/",
        ] {
            let ctx = StaticContext::new().with_url(url);
            assert!(is_eligible(&ctx, &config()), "url {url}");
        }
    }

    #[test]
    fn test_include_mismatch_suppresses() {
        let mut config = config();
        config.include_patterns = vec!["^/blog/.*".to_string()];
        let ctx = StaticContext::new().with_url("https://example.com/shop/cart");
        assert!(!is_eligible(&ctx, &config));
    }

    #[test]
    fn test_include_match_passes() {
        let mut config = config();
        config.include_patterns = vec!["^/docs/.*".to_string(), "^/blog/.*".to_string()];
        let ctx = StaticContext::new().with_url("https://example.com/blog/post-1");
        assert!(is_eligible(&ctx, &config));
    }

    #[test]
    fn test_exclude_match_suppresses() {
        let mut config = config();
        config.exclude_patterns = vec!["^/admin".to_string()];
        let ctx = StaticContext::new().with_url("https://example.com/admin/users");
        assert!(!is_eligible(&ctx, &config));
    }

    #[test]
    fn test_exclude_beats_include() {
        let mut config = config();
        config.include_patterns = vec![".*".to_string()];
        config.exclude_patterns = vec!["^/private".to_string()];
        let ctx = StaticContext::new().with_url("https://example.com/private/x");
        assert!(!is_eligible(&ctx, &config));
    }

    #[test]
    fn test_malformed_include_never_includes() {
        let mut config = config();
        config.include_patterns = vec!["[broken".to_string()];
        let ctx = StaticContext::new().with_url("https://example.com/page");
        // The only include pattern is malformed, so nothing is included.
        assert!(!is_eligible(&ctx, &config));
    }

    #[test]
    fn test_malformed_include_does_not_poison_list() {
        let mut config = config();
        config.include_patterns = vec!["[broken".to_string(), "^/page".to_string()];
        let ctx = StaticContext::new().with_url("https://example.com/page");
        assert!(is_eligible(&ctx, &config));
    }

    #[test]
    fn test_malformed_exclude_never_excludes() {
        let mut config = config();
        config.exclude_patterns = vec!["[broken".to_string()];
        let ctx = StaticContext::new().with_url("https://example.com/page");
        assert!(is_eligible(&ctx, &config));
    }
}
