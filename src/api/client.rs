//! Typed reqwest wrapper for the build/channel API.
//!
//! All bodies are JSON. Path segments are percent-encoded. Calls that need a
//! signed-in user carry the Twitch access token in `X-Twitch-Token`. No
//! timeouts or retries: the API's own response time bounds latency.

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use urlencoding::encode;

use crate::api::models::{
    BuildRecord, BuildToken, ChannelRecord, NewBuildToken, NewChannel, TokenStatus,
};
use crate::error::{ApiError, Result};
use crate::form::catalogue::Catalogue;
use crate::patch::PatchOperation;

pub const TOKEN_HEADER: &str = "X-Twitch-Token";

/// HTTP client for the build/channel API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn channels_url(&self) -> String {
        format!("{}/channels", self.base_url)
    }

    fn channel_url(&self, channel_id: &str) -> String {
        format!("{}/channels/{}", self.base_url, encode(channel_id))
    }

    fn build_url(&self, channel_id: &str, build_id: &str) -> String {
        format!(
            "{}/builds/{}",
            self.channel_url(channel_id),
            encode(build_id)
        )
    }

    fn authed(&self, req: RequestBuilder, token: &str) -> RequestBuilder {
        req.header(TOKEN_HEADER, token)
    }

    /// Send a request and decode a JSON body.
    async fn fetch<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
        let text = self.send(req).await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Send a request, returning the raw body of a 2xx response.
    async fn send(&self, req: RequestBuilder) -> Result<String> {
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.text().await?)
    }

    // ── channels ───────────────────────────────────────────────────

    pub async fn create_channel(&self, token: &str, channel: &NewChannel) -> Result<ChannelRecord> {
        let req = self.authed(self.http.post(self.channels_url()), token).json(channel);
        self.fetch(req).await
    }

    pub async fn get_channel(&self, channel_id: &str) -> Result<ChannelRecord> {
        self.fetch(self.http.get(self.channel_url(channel_id))).await
    }

    pub async fn list_channels(&self) -> Result<Vec<ChannelRecord>> {
        self.fetch(self.http.get(self.channels_url())).await
    }

    pub async fn patch_channel(
        &self,
        token: &str,
        channel_id: &str,
        ops: &[PatchOperation],
    ) -> Result<()> {
        let req = self
            .authed(self.http.patch(self.channel_url(channel_id)), token)
            .json(ops);
        self.send(req).await.map(|_| ())
    }

    pub async fn delete_channel(&self, token: &str, channel_id: &str) -> Result<()> {
        let req = self.authed(self.http.delete(self.channel_url(channel_id)), token);
        self.send(req).await.map(|_| ())
    }

    /// Ask the API to re-read the channel's moderator list from Twitch.
    pub async fn update_mods(&self, token: &str, channel_id: &str) -> Result<ChannelRecord> {
        let url = format!("{}/update-mods", self.channel_url(channel_id));
        self.fetch(self.authed(self.http.post(url), token)).await
    }

    // ── build tokens ───────────────────────────────────────────────

    pub async fn create_build_token(
        &self,
        token: &str,
        channel_id: &str,
        submitter: &str,
    ) -> Result<BuildToken> {
        let url = format!("{}/tokens", self.channel_url(channel_id));
        let body = NewBuildToken {
            submitter: submitter.to_string(),
        };
        self.fetch(self.authed(self.http.post(url), token).json(&body))
            .await
    }

    pub async fn get_build_token(&self, channel_id: &str, build_token: &str) -> Result<BuildToken> {
        let url = format!(
            "{}/tokens/{}",
            self.channel_url(channel_id),
            encode(build_token)
        );
        self.fetch(self.http.get(url)).await
    }

    // ── builds ─────────────────────────────────────────────────────

    pub async fn get_build_options(&self) -> Result<Catalogue> {
        let url = format!("{}/build-options", self.base_url);
        self.fetch(self.http.get(url)).await
    }

    /// Create or overwrite a build.
    pub async fn put_build(
        &self,
        channel_id: &str,
        build_id: &str,
        build: &BuildRecord,
    ) -> Result<()> {
        let req = self.http.put(self.build_url(channel_id, build_id)).json(build);
        self.send(req).await.map(|_| ())
    }

    pub async fn list_builds(&self, channel_id: &str) -> Result<Vec<BuildRecord>> {
        let url = format!("{}/builds", self.channel_url(channel_id));
        self.fetch(self.http.get(url)).await
    }

    pub async fn patch_build(
        &self,
        token: &str,
        channel_id: &str,
        build_id: &str,
        ops: &[PatchOperation],
    ) -> Result<()> {
        let req = self
            .authed(self.http.patch(self.build_url(channel_id, build_id)), token)
            .json(ops);
        self.send(req).await.map(|_| ())
    }

    // ── twitch ─────────────────────────────────────────────────────

    pub async fn validate_token(&self, token: &str) -> Result<TokenStatus> {
        let url = format!("{}/twitch/validate-token", self.base_url);
        self.fetch(self.authed(self.http.get(url), token)).await
    }
}
