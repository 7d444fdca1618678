//! Access token cache.
//!
//! The Twitch implicit grant delivers the token in the URL fragment
//! (`#access_token=...`). The first page load after the redirect moves it into
//! a cookie and clears the fragment; later loads read the cookie. Nothing
//! here checks expiry: the session gate asks the API whether the token is
//! still good.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::routes::util::{get_param, parse_form_body};

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Cookie storage port.
pub trait CookieStore {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&self, name: &str, value: &str);
    fn remove(&self, name: &str);
}

/// The page URL's fragment.
pub trait UrlFragment {
    /// Fragment text without the leading `#`, if any.
    fn fragment(&self) -> Option<String>;
    /// Remove the fragment from the visible URL.
    fn clear(&self);
}

pub struct TokenCache<C, F> {
    cookies: C,
    fragment: F,
}

impl<C: CookieStore, F: UrlFragment> TokenCache<C, F> {
    pub fn new(cookies: C, fragment: F) -> Self {
        Self { cookies, fragment }
    }

    /// A freshly issued token from the URL fragment (which is then cached and
    /// cleared), otherwise whatever the cookie holds.
    pub fn get_access_token(&self) -> Option<String> {
        if let Some(token) = self.fragment.fragment().and_then(|f| token_from_fragment(&f)) {
            self.cookies.set(ACCESS_TOKEN_COOKIE, &token);
            self.fragment.clear();
            tracing::debug!("cached access token from URL fragment");
            return Some(token);
        }
        self.cookies
            .get(ACCESS_TOKEN_COOKIE)
            .filter(|token| !token.is_empty())
    }

    /// Forget the token locally. It is not revoked with Twitch.
    pub fn remove_access_token(&self) {
        self.cookies.remove(ACCESS_TOKEN_COOKIE);
    }
}

/// `access_token` value of a `key=value&...` fragment.
pub fn token_from_fragment(fragment: &str) -> Option<String> {
    let params = parse_form_body(fragment.strip_prefix('#').unwrap_or(fragment));
    get_param(&params, "access_token")
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Value of `name` in a `document.cookie` style header (`a=1; b=2`).
pub fn cookie_value(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| crate::routes::util::percent_decode(value))
}

/// `Set-Cookie` style string for the access token cookie: site-wide, strict
/// same-site, secure. An empty value with `max-age=0` deletes it.
pub fn cookie_string(name: &str, value: &str, delete: bool) -> String {
    let mut cookie = format!(
        "{}={}; path=/; SameSite=Strict; Secure",
        name,
        urlencoding::encode(value)
    );
    if delete {
        cookie.push_str("; max-age=0");
    }
    cookie
}

/// In-memory cookie jar.
#[derive(Debug, Default)]
pub struct MemoryCookies {
    values: RefCell<HashMap<String, String>>,
}

impl MemoryCookies {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CookieStore for MemoryCookies {
    fn get(&self, name: &str) -> Option<String> {
        self.values.borrow().get(name).cloned()
    }

    fn set(&self, name: &str, value: &str) {
        self.values
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
    }

    fn remove(&self, name: &str) {
        self.values.borrow_mut().remove(name);
    }
}

/// In-memory URL fragment.
#[derive(Debug, Default)]
pub struct MemoryFragment {
    value: RefCell<Option<String>>,
}

impl MemoryFragment {
    pub fn new(fragment: Option<&str>) -> Self {
        Self {
            value: RefCell::new(fragment.map(str::to_string)),
        }
    }
}

impl UrlFragment for MemoryFragment {
    fn fragment(&self) -> Option<String> {
        self.value.borrow().clone()
    }

    fn clear(&self) {
        *self.value.borrow_mut() = None;
    }
}

impl<T: CookieStore + ?Sized> CookieStore for &T {
    fn get(&self, name: &str) -> Option<String> {
        (**self).get(name)
    }

    fn set(&self, name: &str, value: &str) {
        (**self).set(name, value)
    }

    fn remove(&self, name: &str) {
        (**self).remove(name)
    }
}

impl<T: UrlFragment + ?Sized> UrlFragment for &T {
    fn fragment(&self) -> Option<String> {
        (**self).fragment()
    }

    fn clear(&self) {
        (**self).clear()
    }
}
