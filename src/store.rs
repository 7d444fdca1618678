//! Read-mostly copies of API records, kept for the lifetime of the page.
//!
//! PATCH requests are diffed against these copies, so the `test` guards
//! assert what this page last saw. A copy only changes after a successful
//! fetch or a successful PATCH.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::api::models::{BuildRecord, ChannelRecord, TokenStatus};

#[derive(Debug, Default)]
struct Store {
    channels: HashMap<String, ChannelRecord>,
    builds: HashMap<String, Vec<BuildRecord>>,
    viewer: Option<TokenStatus>,
}

thread_local! {
    static STORE: RefCell<Store> = RefCell::new(Store::default());
}

pub fn remember_channel(channel: &ChannelRecord) {
    STORE.with(|s| {
        s.borrow_mut()
            .channels
            .insert(channel.id.clone(), channel.clone());
    });
}

pub fn cached_channel(channel_id: &str) -> Option<ChannelRecord> {
    STORE.with(|s| s.borrow().channels.get(channel_id).cloned())
}

pub fn remember_builds(channel_id: &str, builds: &[BuildRecord]) {
    STORE.with(|s| {
        s.borrow_mut()
            .builds
            .insert(channel_id.to_string(), builds.to_vec());
    });
}

pub fn cached_build(channel_id: &str, build_id: &str) -> Option<BuildRecord> {
    STORE.with(|s| {
        s.borrow()
            .builds
            .get(channel_id)
            .and_then(|builds| builds.iter().find(|b| b.id == build_id).cloned())
    })
}

/// Swap in an updated copy of one build. No-op if the channel's builds were
/// never fetched.
pub fn replace_build(channel_id: &str, build: &BuildRecord) {
    STORE.with(|s| {
        if let Some(builds) = s.borrow_mut().builds.get_mut(channel_id) {
            match builds.iter_mut().find(|b| b.id == build.id) {
                Some(slot) => *slot = build.clone(),
                None => builds.push(build.clone()),
            }
        }
    });
}

pub fn forget_channel(channel_id: &str) {
    STORE.with(|s| {
        let mut s = s.borrow_mut();
        s.channels.remove(channel_id);
        s.builds.remove(channel_id);
    });
}

/// Record the signed-in user resolved by the session gate (`None` when
/// signed out or unknown).
pub fn set_viewer(status: Option<TokenStatus>) {
    STORE.with(|s| s.borrow_mut().viewer = status);
}

pub fn viewer() -> Option<TokenStatus> {
    STORE.with(|s| s.borrow().viewer.clone())
}

/// Drop every cached record (used by tests and sign-out).
pub fn reset() {
    STORE.with(|s| *s.borrow_mut() = Store::default());
}
