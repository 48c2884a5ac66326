//! Tag configuration reader — turns the declarative `data-*` attribute set of
//! an embedding tag into a typed, immutable [`TagConfig`].
//!
//! Recognized attributes: `data-endpoint`, `data-client-id`, `data-domain`
//! (comma-separated), `data-dev`, `data-include` / `data-exclude`
//! (comma-separated regex sources), `data-disable-query`,
//! `data-disable-referrer`, `data-disable-resolution`, `data-interval-ms`,
//! and the `data-param-*` namespace collected into custom query parameters.

use tracing::{error, warn};

use crate::error::{PulseError, PulseResult};

/// Attribute-name namespace collected into [`TagConfig::custom_params`],
/// prefix stripped.
pub const PARAM_PREFIX: &str = "data-param-";

const DEFAULT_INTERVAL_MS: u64 = 60_000;

/// Capability view of the embedding tag: attribute lookup by name, presence
/// check, and name enumeration for the `data-param-*` scan.
pub trait TagSource {
    fn attr(&self, name: &str) -> Option<String>;

    fn has_attr(&self, name: &str) -> bool;

    /// Attribute names in declaration order.
    fn attr_names(&self) -> Vec<String>;
}

/// Ordered-attribute [`TagSource`] for embedders that assemble the tag
/// programmatically, and for tests.
#[derive(Debug, Clone, Default)]
pub struct AttrTag {
    attrs: Vec<(String, String)>,
}

impl AttrTag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a valued attribute.
    pub fn set(mut self, name: &str, value: &str) -> Self {
        self.attrs.push((name.to_string(), value.to_string()));
        self
    }

    /// Add a bare (valueless) attribute such as `data-dev`.
    pub fn flag(mut self, name: &str) -> Self {
        self.attrs.push((name.to_string(), String::new()));
        self
    }
}

impl TagSource for AttrTag {
    fn attr(&self, name: &str) -> Option<String> {
        self.attrs
            .iter()
            .find(|(attr_name, _)| attr_name == name)
            .map(|(_, value)| value.clone())
    }

    fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|(attr_name, _)| attr_name == name)
    }

    fn attr_names(&self) -> Vec<String> {
        self.attrs.iter().map(|(name, _)| name.clone()).collect()
    }
}

/// Which of the three reporters a configuration is being read for. Decides
/// the default endpoint path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReporterKind {
    Hit,
    Event,
    Session,
}

impl ReporterKind {
    pub fn default_endpoint(self) -> &'static str {
        match self {
            Self::Hit => "/hit",
            Self::Event => "/event",
            Self::Session => "/session",
        }
    }
}

/// Immutable reporter configuration, parsed once at initialization.
#[derive(Debug, Clone)]
pub struct TagConfig {
    pub kind: ReporterKind,
    /// Collection URL the reports go to.
    pub endpoint: String,
    /// Identifies the tracked site. Hit and session reports serialize `0`
    /// when absent; the event body serializes JSON `null`.
    pub client_id: Option<String>,
    /// Additional hostnames to mirror each report to, in declared order.
    pub domains: Vec<String>,
    /// Disables localhost suppression.
    pub dev_mode: bool,
    /// Non-empty means the current path must match at least one.
    pub include_patterns: Vec<String>,
    /// Any match suppresses tracking.
    pub exclude_patterns: Vec<String>,
    pub disable_query_params: bool,
    pub disable_referrer: bool,
    pub disable_resolution: bool,
    /// Fixed extra query parameters, hit reporter only, declaration order.
    pub custom_params: Vec<(String, String)>,
    /// Session keep-alive period.
    pub interval_ms: u64,
}

impl TagConfig {
    /// Defaults for a reporter kind, as if read from a bare tag.
    pub fn defaults(kind: ReporterKind) -> Self {
        Self {
            kind,
            endpoint: kind.default_endpoint().to_string(),
            client_id: None,
            domains: Vec::new(),
            dev_mode: false,
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            disable_query_params: false,
            disable_referrer: false,
            disable_resolution: false,
            custom_params: Vec::new(),
            interval_ms: DEFAULT_INTERVAL_MS,
        }
    }

    /// Parse a configuration from a located tag. Unknown attributes are
    /// ignored; absent ones fall back to defaults.
    pub fn from_tag(kind: ReporterKind, tag: &dyn TagSource) -> Self {
        let mut config = Self::defaults(kind);

        if let Some(endpoint) = non_empty(tag.attr("data-endpoint")) {
            config.endpoint = endpoint;
        }
        config.client_id = non_empty(tag.attr("data-client-id"));
        config.domains = split_list(tag.attr("data-domain"));
        config.dev_mode = tag.has_attr("data-dev");
        config.include_patterns = split_list(tag.attr("data-include"));
        config.exclude_patterns = split_list(tag.attr("data-exclude"));
        config.disable_query_params = tag.has_attr("data-disable-query");
        config.disable_referrer = tag.has_attr("data-disable-referrer");
        config.disable_resolution = tag.has_attr("data-disable-resolution");
        config.interval_ms = parse_interval(tag.attr("data-interval-ms"));

        for name in tag.attr_names() {
            if name.to_ascii_lowercase().starts_with(PARAM_PREFIX) {
                let key = name[PARAM_PREFIX.len()..].to_string();
                let value = tag.attr(&name).unwrap_or_default();
                config.custom_params.push((key, value));
            }
        }

        config
    }

    /// Parse a configuration from a tag lookup that may have failed. A
    /// missing tag is logged and surfaced as a configuration error so the
    /// embedder can disable the feature; it must never take the host down.
    pub fn locate(kind: ReporterKind, tag: Option<&dyn TagSource>) -> PulseResult<Self> {
        match tag {
            Some(tag) => Ok(Self::from_tag(kind, tag)),
            None => {
                error!(kind = ?kind, "reporting tag not found, tracking disabled");
                Err(PulseError::Config("reporting tag not found".to_string()))
            }
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Split a comma-separated attribute value, trimming entries and dropping
/// empty ones.
fn split_list(value: Option<String>) -> Vec<String> {
    match value {
        Some(value) => value
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    }
}

/// A malformed or zero interval falls back to the default rather than
/// breaking the session loop.
fn parse_interval(value: Option<String>) -> u64 {
    match value {
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(ms) if ms > 0 => ms,
            _ => {
                warn!(value = %raw, default_ms = DEFAULT_INTERVAL_MS, "invalid data-interval-ms, using default");
                DEFAULT_INTERVAL_MS
            }
        },
        None => DEFAULT_INTERVAL_MS,
    }
}
