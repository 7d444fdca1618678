//! Browser-backed ports: `document.cookie`, the location fragment, and
//! `window.location` navigation. Only compiled for `wasm32`.

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{HtmlDocument, Window};

use crate::auth::login::Navigator;
use crate::auth::token::{CookieStore, TokenCache, UrlFragment, cookie_string, cookie_value};

fn window() -> Option<Window> {
    web_sys::window()
}

fn html_document() -> Option<HtmlDocument> {
    window()?.document()?.dyn_into::<HtmlDocument>().ok()
}

/// Page origin, e.g. `https://builds.example.com`.
pub fn origin() -> String {
    window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_default()
}

/// Token cache over the real page.
pub fn token_cache() -> TokenCache<DocumentCookies, WindowFragment> {
    TokenCache::new(DocumentCookies, WindowFragment)
}

pub struct DocumentCookies;

impl CookieStore for DocumentCookies {
    fn get(&self, name: &str) -> Option<String> {
        let header = html_document()?.cookie().ok()?;
        cookie_value(&header, name)
    }

    fn set(&self, name: &str, value: &str) {
        if let Some(doc) = html_document() {
            if let Err(e) = doc.set_cookie(&cookie_string(name, value, false)) {
                tracing::warn!(error = ?e, "failed to write cookie");
            }
        }
    }

    fn remove(&self, name: &str) {
        if let Some(doc) = html_document() {
            if let Err(e) = doc.set_cookie(&cookie_string(name, "", true)) {
                tracing::warn!(error = ?e, "failed to delete cookie");
            }
        }
    }
}

pub struct WindowFragment;

impl UrlFragment for WindowFragment {
    fn fragment(&self) -> Option<String> {
        let hash = window()?.location().hash().ok()?;
        let hash = hash.strip_prefix('#').unwrap_or(&hash);
        (!hash.is_empty()).then(|| hash.to_string())
    }

    /// Replace the history entry so the token never shows in the address bar
    /// or back button.
    fn clear(&self) {
        let Some(w) = window() else { return };
        let location = w.location();
        let url = format!(
            "{}{}",
            location.pathname().unwrap_or_default(),
            location.search().unwrap_or_default()
        );
        let cleared = w
            .history()
            .and_then(|h| h.replace_state_with_url(&JsValue::NULL, "", Some(&url)));
        if let Err(e) = cleared {
            tracing::warn!(error = ?e, "failed to clear URL fragment");
        }
    }
}

pub struct WindowNavigator;

impl Navigator for WindowNavigator {
    fn redirect(&self, url: &str) {
        let Some(w) = window() else { return };
        if let Err(e) = w.location().set_href(url) {
            tracing::error!(error = ?e, "failed to redirect");
        }
    }
}
