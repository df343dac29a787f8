use std::env;
use std::time::Duration;

use anyhow::Context;
use tracing::{debug, warn};
use url::Url;
use vf_core::AddressResolver;

pub const ENV_API_URL: &str = "VIDFORGE_API_URL";
pub const ENV_LOOPBACK_URL: &str = "VIDFORGE_LOOPBACK_URL";
pub const ENV_LAN_URL: &str = "VIDFORGE_LAN_URL";
pub const ENV_REQUEST_TIMEOUT: &str = "VIDFORGE_REQUEST_TIMEOUT_SECS";
pub const ENV_STAGE_INTERVAL: &str = "VIDFORGE_STAGE_INTERVAL_SECS";

const DEFAULT_LOOPBACK_URL: &str = "http://localhost:8000";
const DEFAULT_LAN_URL: &str = "http://192.168.1.169:8000";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 600;
const DEFAULT_STAGE_INTERVAL_SECS: u64 = 15;

#[derive(Debug, Clone)]
pub struct GenBackendConfig {
    pub api_url: Option<Url>,
    pub loopback_url: Url,
    pub lan_url: Url,
    /// `None` waits for the service indefinitely
    pub request_timeout: Option<Duration>,
    pub stage_interval: Duration,
}

impl GenBackendConfig {
    pub fn load() -> anyhow::Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => debug!("loaded environment from {}", path.display()),
            Err(err) => debug!("no .env loaded: {err}"),
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_url = value(ENV_API_URL).and_then(|raw| parse_url_or_warn(ENV_API_URL, &raw));
        let loopback_url = match value(ENV_LOOPBACK_URL)
            .and_then(|raw| parse_url_or_warn(ENV_LOOPBACK_URL, &raw))
        {
            Some(url) => url,
            None => Url::parse(DEFAULT_LOOPBACK_URL)?,
        };
        let lan_url = match value(ENV_LAN_URL).and_then(|raw| parse_url_or_warn(ENV_LAN_URL, &raw)) {
            Some(url) => url,
            None => Url::parse(DEFAULT_LAN_URL)?,
        };

        let timeout_secs = match value(ENV_REQUEST_TIMEOUT) {
            Some(raw) => parse_secs(ENV_REQUEST_TIMEOUT, &raw)?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };
        let interval_secs = match value(ENV_STAGE_INTERVAL) {
            Some(raw) => parse_secs(ENV_STAGE_INTERVAL, &raw)?,
            None => DEFAULT_STAGE_INTERVAL_SECS,
        };

        Ok(Self {
            api_url,
            loopback_url,
            lan_url,
            request_timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
            stage_interval: Duration::from_secs(interval_secs.max(1)),
        })
    }

    /// A command-line address takes the place of `VIDFORGE_API_URL`. One
    /// that does not parse is reported and leaves the config untouched.
    pub fn override_api_url(&mut self, raw: &str) {
        if let Some(url) = parse_url_or_warn("--api-url", raw) {
            self.api_url = Some(url);
        }
    }

    pub fn resolver(&self) -> AddressResolver {
        AddressResolver::new(self.loopback_url.clone(), self.lan_url.clone())
            .with_override(self.api_url.clone())
    }
}

/// Addresses are best effort: a bad one is reported and skipped.
fn parse_url_or_warn(key: &str, raw: &str) -> Option<Url> {
    match Url::parse(raw.trim()) {
        Ok(url) => Some(url),
        Err(err) => {
            warn!("ignoring {key}={raw}: {err}");
            None
        }
    }
}

fn parse_secs(key: &str, raw: &str) -> anyhow::Result<u64> {
    raw.trim().parse().with_context(|| format!("{key} must be a whole number of seconds"))
}
