//! Route handlers. Each returns an HTML fragment for the host page to swap in.

pub mod builds;
pub mod channels;
pub mod submit;
pub mod util;

use crate::api::client::ApiClient;
use crate::api::models::{ChannelRecord, TokenStatus};
use crate::config::Config;
use crate::error::ApiError;
use util::error_banner;

pub const STALE_RECORD: &str =
    "Could not save your change: the record may have changed. Please refresh and try again.";

/// Everything a handler needs for one request.
pub struct Context {
    pub api: ApiClient,
    pub config: Config,
    /// Cached Twitch access token, if signed in.
    pub token: Option<String>,
    /// Signed-in user as last resolved by the session gate.
    pub viewer: Option<TokenStatus>,
}

impl Context {
    pub fn new(config: Config, token: Option<String>) -> Self {
        Self {
            api: ApiClient::new(&config.api_base_url),
            config,
            token,
            viewer: None,
        }
    }

    pub fn with_viewer(mut self, viewer: Option<TokenStatus>) -> Self {
        self.viewer = viewer;
        self
    }

    pub fn require_token(&self) -> Result<&str, ApiError> {
        self.token.as_deref().ok_or(ApiError::Unauthenticated)
    }

    /// Show moderator controls? The API re-checks on every call.
    pub fn can_moderate(&self, channel: &ChannelRecord) -> bool {
        self.token.is_some()
            && self
                .viewer
                .as_ref()
                .is_some_and(|viewer| viewer.can_moderate(channel))
    }
}

/// Log a failed call and render a dismissable banner for it.
pub fn failure(action: &str, subject: &str, e: &ApiError) -> String {
    tracing::warn!(action, subject, error = %e, "request failed");
    let message = match e {
        ApiError::Unauthenticated => "Sign in with Twitch to do that.".to_string(),
        e if e.is_conflict() => STALE_RECORD.to_string(),
        ApiError::Status { status: 404, .. } => format!("Could not {}: not found.", action),
        _ => format!("Could not {}. Please refresh the page and try again.", action),
    };
    error_banner(&message)
}

// ── GET /config ────────────────────────────────────────────────────

/// Public config for the host bridge (analytics setup, sign-in link).
pub fn handle_config_get(ctx: &Context) -> String {
    ctx.config.to_json()
}
