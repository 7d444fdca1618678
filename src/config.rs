//! Site configuration.
//!
//! Values are baked in at build time from `BUILDBOARD_*` environment
//! variables (the static site build sets them), and the host page may
//! override them at runtime through `init_config`. The current config lives in
//! a `thread_local!` like the rest of the module state.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;

const DEFAULT_API_URL: &str = "http://localhost:8080";
const DEFAULT_REFRESH_INTERVAL_SECS: u32 = 30;

/// Public site configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Base URL of the build/channel REST API, without a trailing slash.
    pub api_base_url: String,
    /// Identity pool used by the host for anonymous analytics credentials.
    pub identity_pool_id: String,
    /// Analytics application id. Passed through to the host bridge only.
    pub analytics_app_id: String,
    /// How often the channel page re-fetches its builds.
    pub refresh_interval_secs: u32,
    /// Twitch OAuth client id.
    pub twitch_client_id: String,
    /// OAuth redirect target. Empty means "the page origin".
    pub redirect_uri: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            identity_pool_id: String::new(),
            analytics_app_id: String::new(),
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            twitch_client_id: String::new(),
            redirect_uri: String::new(),
        }
    }
}

impl Config {
    /// Load the configuration compiled into this build.
    pub fn from_build_env() -> Self {
        Self::from_lookup(|key| match key {
            "BUILDBOARD_API_URL" => option_env!("BUILDBOARD_API_URL"),
            "BUILDBOARD_IDENTITY_POOL_ID" => option_env!("BUILDBOARD_IDENTITY_POOL_ID"),
            "BUILDBOARD_ANALYTICS_APP_ID" => option_env!("BUILDBOARD_ANALYTICS_APP_ID"),
            "BUILDBOARD_REFRESH_INTERVAL" => option_env!("BUILDBOARD_REFRESH_INTERVAL"),
            "BUILDBOARD_TWITCH_CLIENT_ID" => option_env!("BUILDBOARD_TWITCH_CLIENT_ID"),
            "BUILDBOARD_REDIRECT_URI" => option_env!("BUILDBOARD_REDIRECT_URI"),
            _ => None,
        })
    }

    /// Build a config from a variable lookup, falling back to defaults for
    /// anything missing or unparsable.
    pub fn from_lookup<'a>(lookup: impl Fn(&str) -> Option<&'a str>) -> Self {
        let defaults = Self::default();
        let text = |key: &str, default: String| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
        };

        let refresh_interval_secs = match lookup("BUILDBOARD_REFRESH_INTERVAL") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(value = raw, "invalid BUILDBOARD_REFRESH_INTERVAL, using default");
                defaults.refresh_interval_secs
            }),
            None => defaults.refresh_interval_secs,
        };

        Self {
            api_base_url: text("BUILDBOARD_API_URL", defaults.api_base_url)
                .trim_end_matches('/')
                .to_string(),
            identity_pool_id: text("BUILDBOARD_IDENTITY_POOL_ID", defaults.identity_pool_id),
            analytics_app_id: text("BUILDBOARD_ANALYTICS_APP_ID", defaults.analytics_app_id),
            refresh_interval_secs,
            twitch_client_id: text("BUILDBOARD_TWITCH_CLIENT_ID", defaults.twitch_client_id),
            redirect_uri: text("BUILDBOARD_REDIRECT_URI", defaults.redirect_uri),
        }
    }

    /// Parse a runtime override. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let mut config: Config =
            serde_json::from_str(json).map_err(|e| format!("Invalid config JSON: {}", e))?;
        config.api_base_url = config.api_base_url.trim_end_matches('/').to_string();
        Ok(config)
    }

    /// Config as JSON for the host bridge.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

thread_local! {
    static CONFIG: RefCell<Config> = RefCell::new(Config::from_build_env());
}

/// Execute a closure with read access to the current config.
pub fn with_config<F, R>(f: F) -> R
where
    F: FnOnce(&Config) -> R,
{
    CONFIG.with(|c| f(&c.borrow()))
}

/// Snapshot of the current config.
pub fn current() -> Config {
    with_config(Config::clone)
}

/// Replace the current config (runtime override from the host page).
pub fn replace_config(config: Config) {
    CONFIG.with(|c| {
        *c.borrow_mut() = config;
    });
}
