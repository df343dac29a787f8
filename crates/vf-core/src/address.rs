//! Picks the base address of the generation service for the requesting
//! device and rewrites artifact URLs so they stay reachable from it.
//!
//! During development the service binds to loopback, which a phone on the
//! same network cannot reach, so handsets are pointed at a LAN address
//! instead and loopback URLs handed back by the service are moved onto the
//! address the request actually went to.

use tracing::debug;
use url::{Host, Url};

const MOBILE_MARKERS: &[&str] =
    &["android", "webos", "iphone", "ipad", "ipod", "blackberry", "iemobile", "opera mini"];

/// Where the client runs, as far as address selection cares
pub trait NetworkEnvironment {
    fn is_mobile(&self) -> bool;

    fn describe(&self) -> String {
        if self.is_mobile() { "mobile".into() } else { "desktop".into() }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Desktop;

impl NetworkEnvironment for Desktop {
    fn is_mobile(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Mobile;

impl NetworkEnvironment for Mobile {
    fn is_mobile(&self) -> bool {
        true
    }
}

/// Detection from a device/platform identifier such as a User-Agent header
#[derive(Debug, Clone)]
pub struct UserAgent(String);

impl UserAgent {
    pub fn new(agent: impl Into<String>) -> Self {
        Self(agent.into())
    }
}

impl NetworkEnvironment for UserAgent {
    fn is_mobile(&self) -> bool {
        let agent = self.0.to_ascii_lowercase();
        MOBILE_MARKERS.iter().any(|marker| agent.contains(marker))
    }

    fn describe(&self) -> String {
        let kind = if self.is_mobile() { "mobile" } else { "desktop" };
        format!("{kind} ({})", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct AddressResolver {
    override_url: Option<Url>,
    loopback: Url,
    lan: Url,
}

impl AddressResolver {
    pub fn new(loopback: Url, lan: Url) -> Self {
        Self { override_url: None, loopback, lan }
    }

    /// An explicit address always wins over device detection.
    pub fn with_override(mut self, override_url: Option<Url>) -> Self {
        self.override_url = override_url;
        self
    }

    pub fn resolve(&self, environment: &dyn NetworkEnvironment) -> Url {
        if let Some(url) = &self.override_url {
            debug!(%url, "using configured service address");
            return url.clone();
        }
        let url = if environment.is_mobile() { &self.lan } else { &self.loopback };
        debug!(%url, environment = %environment.describe(), "resolved service address");
        url.clone()
    }
}

pub fn is_loopback_host(host: &Host<&str>) -> bool {
    match host {
        Host::Domain(domain) => domain.eq_ignore_ascii_case("localhost"),
        Host::Ipv4(ip) => ip.is_loopback(),
        Host::Ipv6(ip) => ip.is_loopback(),
    }
}

/// Moves a loopback artifact URL onto `base`, keeping path, query and
/// fragment. Anything else is returned as is.
pub fn rewrite_artifact_url(raw: &str, base: &Url) -> String {
    let Ok(mut url) = Url::parse(raw) else {
        return raw.to_string();
    };
    if !url.host().is_some_and(|host| is_loopback_host(&host)) {
        return raw.to_string();
    }

    let rewritten = url.set_scheme(base.scheme()).is_ok()
        && url.set_host(base.host_str()).is_ok()
        && url.set_port(base.port()).is_ok();
    if rewritten { url.to_string() } else { raw.to_string() }
}
