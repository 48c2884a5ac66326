//! Page context capability — the read-only view of the embedding page that
//! every reporter consumes: current URL, title, referrer, screen size, and
//! the user's privacy signals.
//!
//! The client never touches a host global itself. Embedders implement
//! [`PageContext`] over whatever environment they run in (a real browser
//! bridge, a server-side renderer, a test fixture) and hand it in at install
//! time. Navigation changes reach the hit reporter as [`PageEvent`]s over a
//! channel the embedder feeds, replacing the old pattern of wrapping the
//! host's history primitive.

/// Read-only view of the embedding page.
///
/// All accessors return owned values; implementations are free to snapshot
/// or to read live state on every call. The privacy accessors are only
/// consulted once, during the eligibility decision at install time.
pub trait PageContext: Send + Sync {
    /// Full current URL, including query and fragment.
    fn href(&self) -> String;

    /// Hostname segment of the current URL.
    fn hostname(&self) -> String;

    /// Path segment of the current URL, used for include/exclude matching.
    fn pathname(&self) -> String;

    /// URL scheme with trailing colon, e.g. `"https:"` or `"file:"`.
    fn protocol(&self) -> String;

    /// Page title.
    fn title(&self) -> String;

    /// Raw document referrer; empty when there is none.
    fn referrer(&self) -> String;

    fn screen_width(&self) -> u32;

    fn screen_height(&self) -> u32;

    /// Browser-level Do-Not-Track signal.
    fn do_not_track(&self) -> bool;

    /// Persisted site-local opt-out flag.
    fn opt_out(&self) -> bool;

    /// Whether the page content model is ready. When `false` at install
    /// time, the initial page view is deferred until the embedder delivers
    /// [`PageEvent::ContentReady`].
    fn content_ready(&self) -> bool {
        true
    }
}

/// Navigation lifecycle events delivered by the embedder to the hit
/// reporter's observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    /// The page content model became ready; releases a deferred initial hit.
    ContentReady,
    /// A single-page-app navigation occurred (programmatic or back/forward).
    Navigated,
}

/// Fixed-value [`PageContext`] for embedders with a static view of the page,
/// and for tests.
#[derive(Debug, Clone)]
pub struct StaticContext {
    pub href: String,
    pub hostname: String,
    pub pathname: String,
    pub protocol: String,
    pub title: String,
    pub referrer: String,
    pub screen_width: u32,
    pub screen_height: u32,
    pub do_not_track: bool,
    pub opt_out: bool,
    pub content_ready: bool,
}

impl Default for StaticContext {
    fn default() -> Self {
        Self {
            href: "https://example.com/".to_string(),
            hostname: "example.com".to_string(),
            pathname: "/".to_string(),
            protocol: "https:".to_string(),
            title: String::new(),
            referrer: String::new(),
            screen_width: 1920,
            screen_height: 1080,
            do_not_track: false,
            opt_out: false,
            content_ready: true,
        }
    }
}

impl StaticContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the full URL and derive hostname, path, and protocol from it.
    /// Falls back to storing the raw string verbatim when it does not parse.
    pub fn with_url(mut self, href: &str) -> Self {
        self.href = href.to_string();
        if let Ok(parsed) = url::Url::parse(href) {
            if let Some(host) = parsed.host_str() {
                self.hostname = host.to_string();
            }
            self.pathname = parsed.path().to_string();
            self.protocol = format!("{}:", parsed.scheme());
        }
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn with_referrer(mut self, referrer: &str) -> Self {
        self.referrer = referrer.to_string();
        self
    }

    pub fn with_screen(mut self, width: u32, height: u32) -> Self {
        self.screen_width = width;
        self.screen_height = height;
        self
    }

    pub fn with_do_not_track(mut self, do_not_track: bool) -> Self {
        self.do_not_track = do_not_track;
        self
    }

    pub fn with_opt_out(mut self, opt_out: bool) -> Self {
        self.opt_out = opt_out;
        self
    }

    pub fn with_content_ready(mut self, content_ready: bool) -> Self {
        self.content_ready = content_ready;
        self
    }
}

impl PageContext for StaticContext {
    fn href(&self) -> String {
        self.href.clone()
    }

    fn hostname(&self) -> String {
        self.hostname.clone()
    }

    fn pathname(&self) -> String {
        self.pathname.clone()
    }

    fn protocol(&self) -> String {
        self.protocol.clone()
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn referrer(&self) -> String {
        self.referrer.clone()
    }

    fn screen_width(&self) -> u32 {
        self.screen_width
    }

    fn screen_height(&self) -> u32 {
        self.screen_height
    }

    fn do_not_track(&self) -> bool {
        self.do_not_track
    }

    fn opt_out(&self) -> bool {
        self.opt_out
    }

    fn content_ready(&self) -> bool {
        self.content_ready
    }
}
