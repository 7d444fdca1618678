//! Build/channel REST API: records and the HTTP client.

pub mod client;
pub mod models;
