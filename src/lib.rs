//! Buildboard in-browser WASM front end.
//!
//! Streamers open a channel, moderators hand viewers one-time build links,
//! and viewers fill in a Dead by Daylight loadout for the streamer to play.
//! The page bridge calls `handle_request(method, path, query, body)` and swaps
//! the returned HTML fragment in with HTMX; `resolve_session` renders the
//! Twitch sign-in area on every page load.
//!
//! All persistent state lives behind the REST API. This crate only keeps
//! transient copies (`store`) and open form drafts (`form::drafts`).

use wasm_bindgen::prelude::*;

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod form;
pub mod patch;
pub mod routes;
pub mod store;

#[cfg(target_arch = "wasm32")]
mod browser;

use routes::Context;
use routes::util::percent_decode;

/// Route a request to its handler and return the HTML fragment.
pub async fn dispatch(ctx: &Context, method: &str, path: &str, query: &str, body: &str) -> String {
    let mut router = matchit::Router::new();

    router.insert("/config", "config").ok();
    router.insert("/channels", "channels").ok();
    router.insert("/channels/{id}", "channel").ok();
    router.insert("/channels/{id}/delete", "channel_delete").ok();
    router.insert("/channels/{id}/mods", "channel_mods").ok();
    router.insert("/channels/{id}/tokens", "channel_tokens").ok();
    router.insert("/channels/{id}/options", "channel_options").ok();
    router
        .insert("/channels/{id}/builds/{build_id}/complete", "build_complete")
        .ok();
    router.insert("/submit/{id}/{token}", "submit").ok();
    router.insert("/submit/{id}/{token}/send", "submit_send").ok();

    let matched = match router.at(path) {
        Ok(m) => m,
        Err(_) => {
            tracing::debug!(path, "no route");
            return not_found();
        }
    };
    let param = |name: &str| percent_decode(matched.params.get(name).unwrap_or(""));
    let id = param("id");

    match (*matched.value, method) {
        ("config", "GET") => routes::handle_config_get(ctx),

        ("channels", "GET") => routes::channels::handle_list_get(ctx, query).await,
        ("channels", "POST") => routes::channels::handle_create_post(ctx, body).await,
        ("channel", "GET") => routes::channels::handle_channel_get(ctx, &id, query).await,
        ("channel_delete", "POST") => routes::channels::handle_delete_post(ctx, &id).await,
        ("channel_mods", "POST") => routes::channels::handle_mods_post(ctx, &id).await,
        ("channel_tokens", "POST") => routes::channels::handle_token_post(ctx, &id, body).await,
        ("channel_options", "GET") => routes::channels::handle_options_get(ctx, &id).await,
        ("channel_options", "POST") => {
            routes::channels::handle_options_post(ctx, &id, body).await
        }

        ("build_complete", "POST") => {
            routes::builds::handle_complete_post(ctx, &id, &param("build_id")).await
        }

        ("submit", "GET") => routes::submit::handle_form_get(ctx, &id, &param("token")).await,
        ("submit", "POST") => routes::submit::handle_form_post(&id, &param("token"), body),
        ("submit_send", "POST") => {
            routes::submit::handle_send_post(ctx, &id, &param("token")).await
        }

        _ => method_not_allowed(),
    }
}

fn not_found() -> String {
    r#"<span class="text-red-700">404: route not found</span>"#.to_string()
}

fn method_not_allowed() -> String {
    r#"<span class="text-red-700">405: method not allowed</span>"#.to_string()
}

/// Apply a runtime config override from the host page. Returns `"ok"` or an
/// error message.
#[wasm_bindgen]
pub fn init_config(json: &str) -> String {
    match config::Config::from_json(json) {
        Ok(config) => {
            config::replace_config(config);
            "ok".to_string()
        }
        Err(e) => {
            tracing::warn!(error = %e, "rejected config override");
            format!("error: {}", e)
        }
    }
}

/// Process an HTTP-like request from the page bridge.
///
/// # Arguments
/// * `method`: HTTP method ("GET" or "POST")
/// * `path`: URL path (e.g., "/channels/1234")
/// * `query`: query string (e.g., "?show=all")
/// * `body`: form-encoded body. Empty string for GET requests.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub async fn handle_request(method: String, path: String, query: String, body: String) -> String {
    let token = browser::token_cache().get_access_token();
    let ctx = Context::new(config::current(), token).with_viewer(store::viewer());
    dispatch(&ctx, &method, &path, &query, &body).await
}

/// Resolve the Twitch session and render the sign-in area.
///
/// Picks up a token from the OAuth redirect fragment, validates it once, and
/// records the signed-in user for moderator checks. An expired token sends the
/// browser back to Twitch.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub async fn resolve_session() -> String {
    use auth::login::LoginRedirector;
    use auth::session::{SessionGate, render_session};

    let config = config::current();
    let origin = browser::origin();
    let navigator = browser::WindowNavigator;
    let login = LoginRedirector::new(&config, &origin, &navigator);
    let token = browser::token_cache().get_access_token();
    let api = api::client::ApiClient::new(&config.api_base_url);

    store::set_viewer(None);
    let mut gate = SessionGate::new();
    let state = gate
        .resolve(token.as_deref(), &api, &login, |status| {
            store::set_viewer(status.cloned())
        })
        .await;
    render_session(state, login.url())
}

/// Forget the cached token and everything fetched with it.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn sign_out() -> String {
    use auth::login::authorize_url;
    use auth::session::{SessionState, render_session};

    browser::token_cache().remove_access_token();
    store::reset();
    tracing::info!("signed out");
    let login_url = authorize_url(&config::current(), &browser::origin());
    render_session(&SessionState::Unauthenticated, &login_url)
}
