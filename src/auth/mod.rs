//! Twitch sign-in: token cache, login redirect, and the session gate that
//! ties them together on every page load.

pub mod login;
pub mod session;
pub mod token;
