use std::env;
use std::time::Duration;

use tracing::info;

use crate::error::QuakeError;
use crate::types::{CapabilityProfile, ExtractionLimits};

pub const DEFAULT_TARGET_URL: &str = "https://ultimosismo.igp.gob.pe/ultimo-sismo/sismos-reportados";

/// Structured-data endpoints the IGP site has exposed at one time or another.
pub const DEFAULT_PROBE_ENDPOINTS: &[&str] = &[
    "https://ultimosismo.igp.gob.pe/ultimo-sismo/ajax/sismos/reportados",
    "https://ultimosismo.igp.gob.pe/ultimo-sismo/api/sismos",
    "https://ultimosismo.igp.gob.pe/api/sismos-reportados",
    "https://ultimosismo.igp.gob.pe/ultimo-sismo/sismos-reportados/data",
    "https://ultimosismo.igp.gob.pe/ultimo-sismo/sismos-reportados?format=json",
    "https://ultimosismo.igp.gob.pe/api/ultimo-sismo/sismos-reportados",
    "https://ultimosismo.igp.gob.pe/ultimo-sismo/data/sismos.json",
];

const DEFAULT_SOURCE_LABEL: &str = "IGP - Instituto Geofísico del Perú";

/// Per-profile fetch timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTimeouts {
    pub plain: Duration,
    pub probe: Duration,
    pub proxy: Duration,
    pub browser: Duration,
}

impl Default for FetchTimeouts {
    fn default() -> Self {
        Self {
            plain: Duration::from_secs(30),
            probe: Duration::from_secs(15),
            proxy: Duration::from_secs(60),
            browser: Duration::from_secs(45),
        }
    }
}

impl FetchTimeouts {
    pub fn for_profile(&self, profile: CapabilityProfile) -> Duration {
        match profile {
            CapabilityProfile::Plain => self.plain,
            CapabilityProfile::JsRenderedProxy => self.proxy,
            CapabilityProfile::HeadlessBrowser => self.browser,
        }
    }
}

/// Scout configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ScoutConfig {
    pub target_url: String,
    pub profile: CapabilityProfile,
    pub probe_endpoints: Vec<String>,

    // Rendering backends
    pub browserless_url: Option<String>,
    pub browserless_token: Option<String>,
    pub chrome_bin: String,
    pub render_wait_ms: Option<u64>,
    pub render_wait_selector: Option<String>,

    // Snapshot store
    pub database_url: Option<String>,

    pub source_label: String,
    pub timeouts: FetchTimeouts,
    pub limits: ExtractionLimits,
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            target_url: DEFAULT_TARGET_URL.to_string(),
            profile: CapabilityProfile::Plain,
            probe_endpoints: DEFAULT_PROBE_ENDPOINTS.iter().map(|s| s.to_string()).collect(),
            browserless_url: None,
            browserless_token: None,
            chrome_bin: "chromium".to_string(),
            render_wait_ms: Some(5_000),
            render_wait_selector: None,
            database_url: None,
            source_label: DEFAULT_SOURCE_LABEL.to_string(),
            timeouts: FetchTimeouts::default(),
            limits: ExtractionLimits::default(),
        }
    }
}

impl ScoutConfig {
    /// Load configuration from environment variables. Every variable is optional.
    pub fn from_env() -> Result<Self, QuakeError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, QuakeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let profile = match get("FETCH_PROFILE") {
            Some(raw) => raw.parse()?,
            None => defaults.profile,
        };

        let probe_endpoints = match get("PROBE_ENDPOINTS") {
            Some(raw) if raw.eq_ignore_ascii_case("none") => Vec::new(),
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            None => defaults.probe_endpoints,
        };

        let timeouts = FetchTimeouts {
            plain: secs(&get, "PLAIN_TIMEOUT_SECS")?.unwrap_or(defaults.timeouts.plain),
            probe: secs(&get, "PROBE_TIMEOUT_SECS")?.unwrap_or(defaults.timeouts.probe),
            proxy: secs(&get, "PROXY_TIMEOUT_SECS")?.unwrap_or(defaults.timeouts.proxy),
            browser: secs(&get, "BROWSER_TIMEOUT_SECS")?.unwrap_or(defaults.timeouts.browser),
        };

        let render_wait_ms = match get("RENDER_WAIT_MS") {
            Some(raw) => Some(parse_number(&raw, "RENDER_WAIT_MS")?),
            None => defaults.render_wait_ms,
        };

        Ok(Self {
            target_url: get("TARGET_URL").unwrap_or(defaults.target_url),
            profile,
            probe_endpoints,
            browserless_url: get("BROWSERLESS_URL"),
            browserless_token: get("BROWSERLESS_TOKEN"),
            chrome_bin: get("CHROME_BIN").unwrap_or(defaults.chrome_bin),
            render_wait_ms,
            render_wait_selector: get("RENDER_WAIT_SELECTOR"),
            database_url: get("DATABASE_URL"),
            source_label: get("SOURCE_LABEL").unwrap_or(defaults.source_label),
            timeouts,
            limits: defaults.limits,
        })
    }

    /// Log the effective configuration without credentials.
    pub fn log_redacted(&self) {
        info!(
            target_url = self.target_url.as_str(),
            profile = %self.profile,
            probe_endpoints = self.probe_endpoints.len(),
            browserless = self.browserless_url.is_some(),
            browserless_token = self.browserless_token.is_some(),
            fetch_timeout_secs = self.timeouts.for_profile(self.profile).as_secs(),
            chrome_bin = self.chrome_bin.as_str(),
            database = self.database_url.is_some(),
            plain_timeout_secs = self.timeouts.plain.as_secs(),
            proxy_timeout_secs = self.timeouts.proxy.as_secs(),
            browser_timeout_secs = self.timeouts.browser.as_secs(),
            "Scout configuration loaded"
        );
    }
}

fn secs<G>(get: &G, key: &str) -> Result<Option<Duration>, QuakeError>
where
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|raw| parse_number(&raw, key).map(Duration::from_secs))
        .transpose()
}

fn parse_number(raw: &str, key: &str) -> Result<u64, QuakeError> {
    raw.parse()
        .map_err(|_| QuakeError::Config(format!("{key} must be a number, got {raw:?}")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = ScoutConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.target_url, DEFAULT_TARGET_URL);
        assert_eq!(config.profile, CapabilityProfile::Plain);
        assert_eq!(config.probe_endpoints.len(), DEFAULT_PROBE_ENDPOINTS.len());
        assert!(config.database_url.is_none());
        assert_eq!(config.limits.max_records, 10);
    }

    #[test]
    fn probe_endpoints_can_be_disabled() {
        let config = ScoutConfig::from_lookup(lookup(&[("PROBE_ENDPOINTS", "none")])).unwrap();
        assert!(config.probe_endpoints.is_empty());
    }

    #[test]
    fn probe_endpoints_are_split_and_trimmed() {
        let config = ScoutConfig::from_lookup(lookup(&[(
            "PROBE_ENDPOINTS",
            "https://a.example/api, https://b.example/data ,",
        )]))
        .unwrap();
        assert_eq!(
            config.probe_endpoints,
            vec!["https://a.example/api", "https://b.example/data"]
        );
    }

    #[test]
    fn timeouts_and_profile_are_overridable() {
        let config = ScoutConfig::from_lookup(lookup(&[
            ("FETCH_PROFILE", "js-rendered-proxy"),
            ("PROXY_TIMEOUT_SECS", "90"),
            ("BROWSERLESS_URL", "https://chrome.example.com"),
        ]))
        .unwrap();
        assert_eq!(config.profile, CapabilityProfile::JsRenderedProxy);
        assert_eq!(config.timeouts.for_profile(config.profile), Duration::from_secs(90));
        assert_eq!(config.browserless_url.as_deref(), Some("https://chrome.example.com"));
    }

    #[test]
    fn invalid_numbers_are_config_errors() {
        let err = ScoutConfig::from_lookup(lookup(&[("PLAIN_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, QuakeError::Config(_)));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = ScoutConfig::from_lookup(lookup(&[("DATABASE_URL", "  ")])).unwrap();
        assert!(config.database_url.is_none());
    }
}
