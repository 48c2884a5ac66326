//! Outbound report payloads and their wire serialization.
//!
//! Hit and session reports travel as GET query strings; event reports travel
//! as a JSON body. Each report is built fresh per send and discarded after
//! dispatch.

use std::collections::HashMap;

use serde::Serialize;
use url::form_urlencoded;

/// Page-view report. GET query: `nc`, `client_id`, `url`, `t`, `ref`, `w`,
/// `h`, then any custom params in declared order.
#[derive(Debug, Clone)]
pub struct HitReport {
    pub client_id: Option<String>,
    pub url: String,
    pub title: String,
    pub referrer: String,
    /// `None` when resolution reporting is disabled; serialized as empty
    /// `w`/`h` values so the key set stays stable.
    pub screen: Option<(u32, u32)>,
    pub custom_params: Vec<(String, String)>,
}

impl HitReport {
    pub fn query(&self, cache_buster: i64) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("nc", &cache_buster.to_string());
        query.append_pair("client_id", self.client_id.as_deref().unwrap_or("0"));
        query.append_pair("url", &self.url);
        query.append_pair("t", &self.title);
        query.append_pair("ref", &self.referrer);
        match self.screen {
            Some((width, height)) => {
                query.append_pair("w", &width.to_string());
                query.append_pair("h", &height.to_string());
            }
            None => {
                query.append_pair("w", "");
                query.append_pair("h", "");
            }
        }
        for (key, value) in &self.custom_params {
            query.append_pair(key, value);
        }
        query.finish()
    }

    pub fn request_url(&self, endpoint: &str, cache_buster: i64) -> String {
        format!("{}?{}", endpoint, self.query(cache_buster))
    }
}

/// Custom-event report, POSTed (or beaconed) as a JSON body.
///
/// Screen fields are `0` when redacted, never absent, so the collector-side
/// schema stays stable. An absent client id serializes as JSON `null`.
#[derive(Debug, Clone, Serialize)]
pub struct EventReport {
    pub client_id: Option<String>,
    pub url: String,
    pub title: String,
    pub referrer: String,
    pub screen_width: u32,
    pub screen_height: u32,
    pub event_name: String,
    pub event_duration: u64,
    pub event_meta: HashMap<String, String>,
}

/// Session-extension ping. GET query: `nc`, `client_id`, `url` only.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub client_id: Option<String>,
    pub url: String,
}

impl SessionReport {
    pub fn query(&self, cache_buster: i64) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("nc", &cache_buster.to_string());
        query.append_pair("client_id", self.client_id.as_deref().unwrap_or("0"));
        query.append_pair("url", &self.url);
        query.finish()
    }

    pub fn request_url(&self, endpoint: &str, cache_buster: i64) -> String {
        format!("{}?{}", endpoint, self.query(cache_buster))
    }
}
