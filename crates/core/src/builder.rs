//! Report construction — composes page context, tag configuration, and the
//! rewriting helpers into one fresh report per target domain.
//!
//! Building for one domain never depends on another domain's report, so a
//! failed dispatch for one target cannot corrupt the rest of the fan-out.

use std::collections::HashMap;

use crate::config::TagConfig;
use crate::context::PageContext;
use crate::report::{EventReport, HitReport, SessionReport};
use crate::rewrite::{cap_length, rewrite_hostname, rewrite_referrer, strip_query};

/// Target domains for one reporting invocation: the primary (no override)
/// first, then each configured mirror in declared order.
pub fn target_domains(config: &TagConfig) -> impl Iterator<Item = Option<&str>> {
    std::iter::once(None).chain(config.domains.iter().map(|domain| Some(domain.as_str())))
}

/// The rewritten, optionally query-stripped, length-capped page URL.
fn page_url(ctx: &dyn PageContext, config: &TagConfig, target: Option<&str>) -> String {
    let rewritten = rewrite_hostname(&ctx.href(), &ctx.hostname(), target);
    let stripped = if config.disable_query_params {
        strip_query(&rewritten)
    } else {
        rewritten.as_str()
    };
    cap_length(stripped).to_string()
}

fn referrer(ctx: &dyn PageContext, config: &TagConfig, target: Option<&str>) -> String {
    if config.disable_referrer {
        String::new()
    } else {
        rewrite_referrer(&ctx.referrer(), &ctx.hostname(), target)
    }
}

pub fn build_hit(ctx: &dyn PageContext, config: &TagConfig, target: Option<&str>) -> HitReport {
    HitReport {
        client_id: config.client_id.clone(),
        url: page_url(ctx, config, target),
        title: ctx.title(),
        referrer: referrer(ctx, config, target),
        screen: if config.disable_resolution {
            None
        } else {
            Some((ctx.screen_width(), ctx.screen_height()))
        },
        custom_params: config.custom_params.clone(),
    }
}

pub fn build_event(
    ctx: &dyn PageContext,
    config: &TagConfig,
    target: Option<&str>,
    name: &str,
    duration: u64,
    meta: &HashMap<String, String>,
) -> EventReport {
    let (screen_width, screen_height) = if config.disable_resolution {
        (0, 0)
    } else {
        (ctx.screen_width(), ctx.screen_height())
    };
    EventReport {
        client_id: config.client_id.clone(),
        url: page_url(ctx, config, target),
        title: ctx.title(),
        referrer: referrer(ctx, config, target),
        screen_width,
        screen_height,
        event_name: name.to_string(),
        event_duration: duration,
        event_meta: meta.clone(),
    }
}

/// Session pings carry the rewritten URL untouched by query stripping.
pub fn build_session(ctx: &dyn PageContext, config: &TagConfig, target: Option<&str>) -> SessionReport {
    let rewritten = rewrite_hostname(&ctx.href(), &ctx.hostname(), target);
    SessionReport {
        client_id: config.client_id.clone(),
        url: cap_length(&rewritten).to_string(),
    }
}
