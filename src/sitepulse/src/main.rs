//! SitePulse CLI — fire test reports at a collection endpoint from the
//! terminal.
//!
//! Flags mirror the embedding tag's `data-*` attributes and are fed through
//! the real tag configuration reader, so the CLI exercises the same
//! parsing, eligibility, and dispatch pipeline an embedder gets.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;

use sitepulse_core::config::{AttrTag, ReporterKind, TagConfig};
use sitepulse_core::context::StaticContext;
use sitepulse_reporters::{EventOptions, EventReporter, HitReporter, SessionReporter};
use sitepulse_transport::{BeaconTransport, CallbackHttpTransport, Transport};

#[derive(Parser, Debug)]
#[command(name = "sitepulse")]
#[command(about = "Fire page-view, event, and session reports at a collection endpoint")]
#[command(version)]
struct Cli {
    /// Collection endpoint URL (data-endpoint)
    #[arg(long, env = "SITEPULSE__ENDPOINT")]
    endpoint: String,

    /// Client id of the tracked site (data-client-id)
    #[arg(long, env = "SITEPULSE__CLIENT_ID")]
    client_id: Option<String>,

    /// Comma-separated mirror domains (data-domain)
    #[arg(long)]
    domain: Option<String>,

    /// Allow tracking on localhost (data-dev)
    #[arg(long, default_value_t = false)]
    dev: bool,

    /// Comma-separated include path patterns (data-include)
    #[arg(long)]
    include: Option<String>,

    /// Comma-separated exclude path patterns (data-exclude)
    #[arg(long)]
    exclude: Option<String>,

    /// Strip the query string from the reported URL (data-disable-query)
    #[arg(long, default_value_t = false)]
    disable_query: bool,

    /// Omit the referrer (data-disable-referrer)
    #[arg(long, default_value_t = false)]
    disable_referrer: bool,

    /// Redact the screen resolution (data-disable-resolution)
    #[arg(long, default_value_t = false)]
    disable_resolution: bool,

    /// Extra fixed query parameter as key=value, repeatable (data-param-*)
    #[arg(long = "param")]
    params: Vec<String>,

    /// Session keep-alive period in milliseconds (data-interval-ms)
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Send through the fire-and-forget beacon transport instead of waiting
    /// for the endpoint's response
    #[arg(long, default_value_t = false)]
    beacon: bool,

    /// Page URL to report
    #[arg(long, default_value = "https://example.com/")]
    url: String,

    /// Page title to report
    #[arg(long, default_value = "")]
    title: String,

    /// Referrer to report
    #[arg(long, default_value = "")]
    referrer: String,

    /// Reported screen width
    #[arg(long, default_value_t = 1920)]
    width: u32,

    /// Reported screen height
    #[arg(long, default_value_t = 1080)]
    height: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send one page-view report
    Hit,
    /// Send one custom event
    Event {
        /// Event name (must be non-empty)
        name: String,

        /// Event duration
        #[arg(long)]
        duration: Option<u64>,

        /// Event metadata as key=value, repeatable
        #[arg(long = "meta")]
        meta: Vec<String>,
    },
    /// Run the keep-alive loop for a number of ticks, then stop
    Session {
        #[arg(long, default_value_t = 3)]
        ticks: u64,
    },
}

impl Cli {
    fn reporter_kind(&self) -> ReporterKind {
        match self.command {
            Command::Hit => ReporterKind::Hit,
            Command::Event { .. } => ReporterKind::Event,
            Command::Session { .. } => ReporterKind::Session,
        }
    }

    /// Assemble the flags into the attribute set an embedding tag would
    /// carry, so configuration goes through the real reader.
    fn tag(&self) -> anyhow::Result<AttrTag> {
        let mut tag = AttrTag::new().set("data-endpoint", &self.endpoint);
        if let Some(client_id) = &self.client_id {
            tag = tag.set("data-client-id", client_id);
        }
        if let Some(domain) = &self.domain {
            tag = tag.set("data-domain", domain);
        }
        if self.dev {
            tag = tag.flag("data-dev");
        }
        if let Some(include) = &self.include {
            tag = tag.set("data-include", include);
        }
        if let Some(exclude) = &self.exclude {
            tag = tag.set("data-exclude", exclude);
        }
        if self.disable_query {
            tag = tag.flag("data-disable-query");
        }
        if self.disable_referrer {
            tag = tag.flag("data-disable-referrer");
        }
        if self.disable_resolution {
            tag = tag.flag("data-disable-resolution");
        }
        if let Some(interval_ms) = self.interval_ms {
            tag = tag.set("data-interval-ms", &interval_ms.to_string());
        }
        for param in &self.params {
            let (key, value) = param
                .split_once('=')
                .with_context(|| format!("--param {param:?} is not key=value"))?;
            tag = tag.set(&format!("data-param-{key}"), value);
        }
        Ok(tag)
    }

    fn context(&self) -> StaticContext {
        StaticContext::new()
            .with_url(&self.url)
            .with_title(&self.title)
            .with_referrer(&self.referrer)
            .with_screen(self.width, self.height)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sitepulse=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config = TagConfig::from_tag(cli.reporter_kind(), &cli.tag()?);
    let ctx = Arc::new(cli.context());
    let transport: Arc<dyn Transport> = if cli.beacon {
        Arc::new(BeaconTransport::new())
    } else {
        Arc::new(CallbackHttpTransport::new())
    };

    info!(
        endpoint = %config.endpoint,
        domains = config.domains.len(),
        url = %cli.url,
        "dispatching"
    );

    match &cli.command {
        Command::Hit => {
            let Some(reporter) = HitReporter::install(config, ctx, transport) else {
                info!("page not eligible, nothing sent");
                return Ok(());
            };
            reporter.hit().await?;
            info!("page view sent");
        }
        Command::Event {
            name,
            duration,
            meta,
        } => {
            let mut options = EventOptions::new();
            if let Some(duration) = duration {
                options = options.with_duration(*duration);
            }
            for entry in meta {
                let Some((key, value)) = entry.split_once('=') else {
                    bail!("--meta {entry:?} is not key=value");
                };
                options = options.with_meta(key, serde_json::Value::String(value.to_string()));
            }

            let reporter = EventReporter::install(config, ctx, transport);
            if reporter.is_stub() {
                info!("page not eligible, event will only be logged");
            }
            reporter.event(name, options).await?;
            info!(name = %name, "event sent");
        }
        Command::Session { ticks } => {
            let interval_ms = config.interval_ms;
            let Some(handle) = SessionReporter::start(config, ctx, transport) else {
                info!("page not eligible, no session started");
                return Ok(());
            };
            tokio::time::sleep(Duration::from_millis(interval_ms * ticks + interval_ms / 2)).await;
            handle.stopped().await;
            info!(ticks = ticks, "session pings sent");
        }
    }

    if cli.beacon {
        // Queued is all a beacon send acknowledges; give the queue a moment
        // to drain before the process exits.
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    Ok(())
}
