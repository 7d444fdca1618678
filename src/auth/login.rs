//! Sign-in redirect to Twitch's OAuth implicit grant.

use urlencoding::encode;

use crate::config::Config;

pub const TWITCH_AUTHORIZE_URL: &str = "https://id.twitch.tv/oauth2/authorize";
pub const TWITCH_SCOPE: &str = "moderation:read";

/// Moves the browser to another page.
pub trait Navigator {
    fn redirect(&self, url: &str);
}

/// Authorization URL for `config`, returning to `origin` unless the config
/// names an explicit redirect URI.
pub fn authorize_url(config: &Config, origin: &str) -> String {
    let redirect_uri = if config.redirect_uri.is_empty() {
        origin
    } else {
        config.redirect_uri.as_str()
    };
    format!(
        "{}?response_type=token&client_id={}&redirect_uri={}&scope={}",
        TWITCH_AUTHORIZE_URL,
        encode(&config.twitch_client_id),
        encode(redirect_uri),
        encode(TWITCH_SCOPE)
    )
}

pub struct LoginRedirector<'a, N> {
    url: String,
    navigator: &'a N,
}

impl<'a, N: Navigator> LoginRedirector<'a, N> {
    pub fn new(config: &Config, origin: &str, navigator: &'a N) -> Self {
        Self {
            url: authorize_url(config, origin),
            navigator,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn redirect(&self) {
        tracing::info!("redirecting to Twitch sign-in");
        self.navigator.redirect(&self.url);
    }
}
