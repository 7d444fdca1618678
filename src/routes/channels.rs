//! `/channels/*` routes: channel list, channel page and moderator tools.

use urlencoding::encode;

use crate::api::models::{BuildRecord, ChannelRecord, NewChannel};
use crate::patch;
use crate::routes::builds::render_build_row;
use crate::routes::util::{
    error_banner, escape_html, get_param, notice, parse_form_body, parse_query,
};
use crate::routes::{Context, STALE_RECORD, failure};
use crate::store;

/// Which builds the channel page lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Show {
    Pending,
    Completed,
    All,
}

impl Show {
    fn parse(s: Option<&str>) -> Show {
        match s {
            Some("completed") => Show::Completed,
            Some("all") => Show::All,
            _ => Show::Pending,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Show::Pending => "pending",
            Show::Completed => "completed",
            Show::All => "all",
        }
    }

    fn keeps(&self, build: &BuildRecord) -> bool {
        match self {
            Show::Pending => !build.is_completed(),
            Show::Completed => build.is_completed(),
            Show::All => true,
        }
    }
}

// ── GET /channels ──────────────────────────────────────────────────

/// Channel list, filtered by `?q=` and sorted by name.
pub async fn handle_list_get(ctx: &Context, query: &str) -> String {
    let params = parse_query(query);
    let search = get_param(&params, "q").unwrap_or("").trim().to_lowercase();

    let mut channels = match ctx.api.list_channels().await {
        Ok(channels) => channels,
        Err(e) => return failure("load channels", "", &e),
    };
    channels.retain(|c| search.is_empty() || c.name.to_lowercase().contains(&search));
    channels.sort_by_key(|c| c.name.to_lowercase());

    let mut h = String::with_capacity(2048);
    h.push_str(r#"<div id="channel-list" class="flex flex-col gap-4">"#);
    h.push_str(&format!(
        r##"<input type="search" name="q" value="{}" placeholder="Search channels" class="border rounded px-2 py-1 text-sm" hx-get="/channels" hx-trigger="keyup changed delay:300ms" hx-target="#channel-list" hx-swap="outerHTML">"##,
        escape_html(&search)
    ));
    if ctx.token.is_some() {
        h.push_str(&render_create_form());
    }
    if channels.is_empty() {
        h.push_str(r#"<p class="text-sm text-slate-500">No channels found.</p>"#);
    } else {
        h.push_str(r#"<ul class="flex flex-col gap-2">"#);
        for channel in &channels {
            h.push_str(&render_channel_link(channel));
        }
        h.push_str("</ul>");
    }
    h.push_str("</div>");
    h
}

fn render_create_form() -> String {
    r##"<form class="flex gap-2" hx-post="/channels" hx-target="#channel-created" hx-swap="innerHTML"><input type="text" name="name" required placeholder="Your Twitch channel" class="border rounded px-2 py-1 text-sm flex-1"><button type="submit" class="bg-purple-700 hover:bg-purple-800 text-white font-bold py-1 px-3 rounded text-sm">Create channel</button></form><div id="channel-created"></div>"##.to_string()
}

fn render_channel_link(channel: &ChannelRecord) -> String {
    let picture = match &channel.picture {
        Some(url) => format!(
            r#"<img src="{}" alt="" class="w-8 h-8 rounded-full">"#,
            escape_html(url)
        ),
        None => String::new(),
    };
    format!(
        r##"<li><a href="/channels/{}" class="flex items-center gap-2 hover:underline" hx-get="/channels/{}" hx-target="#main" hx-push-url="true">{}<span class="font-bold">{}</span><span class="text-xs text-slate-500">{} pending</span></a></li>"##,
        encode(&channel.id),
        encode(&channel.id),
        picture,
        escape_html(&channel.name),
        channel.build_count.saturating_sub(channel.completed_count)
    )
}

// ── POST /channels ─────────────────────────────────────────────────

pub async fn handle_create_post(ctx: &Context, body: &str) -> String {
    let params = parse_form_body(body);
    let name = get_param(&params, "name").unwrap_or("").trim();
    if name.is_empty() {
        return error_banner("Enter a channel name.");
    }
    let token = match ctx.require_token() {
        Ok(t) => t,
        Err(e) => return failure("create channel", name, &e),
    };

    let request = NewChannel {
        name: name.to_string(),
    };
    match ctx.api.create_channel(token, &request).await {
        Ok(channel) => {
            tracing::info!(channel_id = %channel.id, "channel created");
            store::remember_channel(&channel);
            let mut h = notice(&format!("Created channel {}.", channel.name));
            h.push_str(r#"<ul class="mt-2">"#);
            h.push_str(&render_channel_link(&channel));
            h.push_str("</ul>");
            h
        }
        Err(e) => failure("create channel", name, &e),
    }
}

// ── GET /channels/{id} ─────────────────────────────────────────────

/// Channel page. Re-polls itself every `refresh_interval_secs`; a failed
/// builds fetch still renders the header with a banner.
pub async fn handle_channel_get(ctx: &Context, channel_id: &str, query: &str) -> String {
    let params = parse_query(query);
    let show = Show::parse(get_param(&params, "show"));

    let channel = match ctx.api.get_channel(channel_id).await {
        Ok(channel) => channel,
        Err(e) => return failure("load channel", channel_id, &e),
    };
    store::remember_channel(&channel);
    let moderator = ctx.can_moderate(&channel);

    let mut h = String::with_capacity(4096);
    h.push_str(&format!(
        r#"<section id="channel" hx-get="/channels/{}?show={}" hx-trigger="every {}s" hx-swap="outerHTML" class="flex flex-col gap-4">"#,
        encode(&channel.id),
        show.as_str(),
        ctx.config.refresh_interval_secs
    ));
    h.push_str(&render_header(&channel, show));
    if moderator {
        h.push_str(&render_mod_tools(&channel));
    }

    match ctx.api.list_builds(channel_id).await {
        Ok(builds) => {
            store::remember_builds(channel_id, &builds);
            let mut shown: Vec<&BuildRecord> = builds.iter().filter(|b| show.keeps(b)).collect();
            // Pending first; stable within each group.
            shown.sort_by_key(|b| b.is_completed());
            if shown.is_empty() {
                h.push_str(r#"<p class="text-sm text-slate-500">No builds yet.</p>"#);
            } else {
                h.push_str(r#"<ul id="builds">"#);
                for build in shown {
                    h.push_str(&render_build_row(&channel.id, build, moderator));
                }
                h.push_str("</ul>");
            }
        }
        Err(e) => h.push_str(&failure("load builds", channel_id, &e)),
    }

    h.push_str("</section>");
    h
}

fn render_header(channel: &ChannelRecord, show: Show) -> String {
    let mut h = String::new();
    h.push_str(r#"<header class="flex items-center gap-3">"#);
    if let Some(url) = &channel.picture {
        h.push_str(&format!(
            r#"<img src="{}" alt="" class="w-12 h-12 rounded-full">"#,
            escape_html(url)
        ));
    }
    h.push_str(&format!(
        r#"<div><h2 class="text-xl font-bold">{}</h2><p class="text-xs text-slate-500">{} builds, {} completed</p></div>"#,
        escape_html(&channel.name),
        channel.build_count,
        channel.completed_count
    ));
    h.push_str("</header>");

    h.push_str(r#"<nav class="flex gap-2 text-sm">"#);
    for tab in [Show::Pending, Show::Completed, Show::All] {
        let active = if tab == show {
            "font-bold underline"
        } else {
            "text-slate-500"
        };
        h.push_str(&format!(
            r##"<button type="button" class="{}" hx-get="/channels/{}?show={}" hx-target="#channel" hx-swap="outerHTML">{}</button>"##,
            active,
            encode(&channel.id),
            tab.as_str(),
            match tab {
                Show::Pending => "Pending",
                Show::Completed => "Completed",
                Show::All => "All",
            }
        ));
    }
    h.push_str("</nav>");
    h
}

fn render_mod_tools(channel: &ChannelRecord) -> String {
    let id = encode(&channel.id);
    let mut h = String::new();
    h.push_str(r#"<details class="border rounded p-3 text-sm"><summary class="font-bold cursor-pointer">Moderator tools</summary><div class="flex flex-col gap-3 mt-2">"#);

    h.push_str(&format!(
        r##"<form class="flex gap-2" hx-post="/channels/{}/tokens" hx-target="#token-link" hx-swap="innerHTML"><input type="text" name="submitter" required placeholder="Viewer name" class="border rounded px-2 py-1 flex-1"><button type="submit" class="bg-red-700 text-amber-50 font-bold py-1 px-3 rounded">Create build link</button></form><div id="token-link"></div>"##,
        id
    ));

    h.push_str(&format!(
        r##"<div id="mods"><p>Moderators: {}</p></div><button type="button" class="underline text-left" hx-post="/channels/{}/mods" hx-target="#mods" hx-swap="innerHTML">Refresh moderators from Twitch</button>"##,
        render_mod_names(channel),
        id
    ));

    h.push_str(&format!(
        r##"<button type="button" class="underline text-left" hx-get="/channels/{}/options" hx-target="#options" hx-swap="innerHTML">Edit disabled options</button><div id="options"></div>"##,
        id
    ));

    h.push_str(&format!(
        r##"<button type="button" class="text-red-700 underline text-left" hx-post="/channels/{}/delete" hx-confirm="Delete this channel and all of its builds?" hx-target="#channel" hx-swap="outerHTML">Delete channel</button>"##,
        id
    ));

    h.push_str("</div></details>");
    h
}

fn render_mod_names(channel: &ChannelRecord) -> String {
    if channel.mods.is_empty() {
        return "none".to_string();
    }
    let names: Vec<String> = channel.mods.iter().map(|m| escape_html(m)).collect();
    names.join(", ")
}

// ── POST /channels/{id}/delete ─────────────────────────────────────

pub async fn handle_delete_post(ctx: &Context, channel_id: &str) -> String {
    let token = match ctx.require_token() {
        Ok(t) => t,
        Err(e) => return failure("delete channel", channel_id, &e),
    };
    match ctx.api.delete_channel(token, channel_id).await {
        Ok(()) => {
            tracing::info!(channel_id, "channel deleted");
            store::forget_channel(channel_id);
            notice("Channel deleted.")
        }
        Err(e) => failure("delete channel", channel_id, &e),
    }
}

// ── POST /channels/{id}/mods ───────────────────────────────────────

pub async fn handle_mods_post(ctx: &Context, channel_id: &str) -> String {
    let token = match ctx.require_token() {
        Ok(t) => t,
        Err(e) => return failure("refresh moderators", channel_id, &e),
    };
    match ctx.api.update_mods(token, channel_id).await {
        Ok(channel) => {
            store::remember_channel(&channel);
            format!("<p>Moderators: {}</p>", render_mod_names(&channel))
        }
        Err(e) => failure("refresh moderators", channel_id, &e),
    }
}

// ── POST /channels/{id}/tokens ─────────────────────────────────────

/// Mint a build token for one viewer and show the link to hand them.
pub async fn handle_token_post(ctx: &Context, channel_id: &str, body: &str) -> String {
    let params = parse_form_body(body);
    let submitter = get_param(&params, "submitter").unwrap_or("").trim();
    if submitter.is_empty() {
        return error_banner("Enter the viewer's name.");
    }
    let token = match ctx.require_token() {
        Ok(t) => t,
        Err(e) => return failure("create build link", channel_id, &e),
    };

    match ctx.api.create_build_token(token, channel_id, submitter).await {
        Ok(build_token) => {
            let link = format!(
                "/submit/{}/{}",
                encode(channel_id),
                encode(&build_token.token)
            );
            let expires = build_token
                .expires
                .map(|e| format!(" Expires {}.", e.format("%Y-%m-%d %H:%M UTC")))
                .unwrap_or_default();
            format!(
                r#"<div class="flex flex-col gap-1"><p>Link for <strong>{}</strong>:{}</p><input type="text" readonly value="{}" class="border rounded px-2 py-1 font-mono text-xs" onclick="this.select()"></div>"#,
                escape_html(&build_token.submitter),
                expires,
                escape_html(&link)
            )
        }
        Err(e) => failure("create build link", channel_id, &e),
    }
}

// ── GET /channels/{id}/options ─────────────────────────────────────

/// Disabled-option editor: every catalogue group, each value a toggle.
pub async fn handle_options_get(ctx: &Context, channel_id: &str) -> String {
    let channel = match load_channel(ctx, channel_id).await {
        Ok(channel) => channel,
        Err(html) => return html,
    };
    let catalogue = match ctx.api.get_build_options().await {
        Ok(catalogue) => catalogue,
        Err(e) => return failure("load build options", channel_id, &e),
    };

    let mut h = String::with_capacity(8192);
    h.push_str(r#"<div class="flex flex-col gap-3">"#);
    for (path, values) in catalogue.groups() {
        if values.is_empty() {
            continue;
        }
        h.push_str(&format!(
            r#"<fieldset class="border rounded p-2"><legend class="text-xs font-bold">{}</legend><div class="flex flex-wrap gap-1">"#,
            escape_html(&path.join(" / "))
        ));
        for value in &values {
            h.push_str(&render_option_toggle(&channel, value));
        }
        h.push_str("</div></fieldset>");
    }
    h.push_str("</div>");
    h
}

fn render_option_toggle(channel: &ChannelRecord, value: &str) -> String {
    let disabled = channel.disabled_options.iter().any(|v| v == value);
    let class = if disabled {
        "bg-slate-300 text-slate-500 line-through"
    } else {
        "bg-emerald-100 text-emerald-900"
    };
    let vals = serde_json::json!({ "option": value }).to_string();
    format!(
        r#"<button type="button" class="{} rounded px-2 py-0.5 text-xs" aria-pressed="{}" hx-post="/channels/{}/options" hx-vals='{}' hx-target="this" hx-swap="outerHTML">{}</button>"#,
        class,
        disabled,
        encode(&channel.id),
        escape_html(&vals),
        escape_html(value)
    )
}

/// Channel copy to diff against: the cached one, else a fresh fetch.
async fn load_channel(ctx: &Context, channel_id: &str) -> Result<ChannelRecord, String> {
    if let Some(channel) = store::cached_channel(channel_id) {
        return Ok(channel);
    }
    match ctx.api.get_channel(channel_id).await {
        Ok(channel) => {
            store::remember_channel(&channel);
            Ok(channel)
        }
        Err(e) => Err(failure("load channel", channel_id, &e)),
    }
}

// ── POST /channels/{id}/options ────────────────────────────────────

/// Toggle one value in the channel's disabled options with a test-guarded
/// PATCH. Re-renders just the toggled button.
pub async fn handle_options_post(ctx: &Context, channel_id: &str, body: &str) -> String {
    let params = parse_form_body(body);
    let Some(option) = get_param(&params, "option").filter(|o| !o.is_empty()) else {
        return error_banner("No option given.");
    };
    let token = match ctx.require_token() {
        Ok(t) => t,
        Err(e) => return failure("update options", channel_id, &e),
    };
    let previous = match load_channel(ctx, channel_id).await {
        Ok(channel) => channel,
        Err(html) => return html,
    };

    let mut updated = previous.clone();
    if let Some(pos) = updated.disabled_options.iter().position(|v| v == option) {
        updated.disabled_options.remove(pos);
    } else {
        updated.disabled_options.push(option.to_string());
    }

    let ops = match patch::diff_records(&previous, &updated) {
        Ok(ops) => ops,
        Err(e) => {
            tracing::error!(channel_id, error = %e, "failed to diff channel");
            return error_banner("Could not update options.");
        }
    };

    match ctx.api.patch_channel(token, channel_id, &ops).await {
        Ok(()) => {
            let saved = patch::apply_to(&previous, &ops).unwrap_or(updated);
            store::remember_channel(&saved);
            render_option_toggle(&saved, option)
        }
        Err(e) => {
            tracing::warn!(channel_id, option, error = %e, "failed to patch channel");
            let mut h = error_banner(STALE_RECORD);
            h.push_str(&render_option_toggle(&previous, option));
            h
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::tests::{context, moderator};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn channel_json(id: &str, name: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "disabledOptions": ["Hex: Ruin"],
            "mods": ["helpfulmod"],
            "buildCount": 3,
            "completedCount": 1
        })
    }

    fn build_json(id: &str, completed: bool) -> serde_json::Value {
        let mut build = json!({
            "id": id,
            "type": "killer",
            "character": "The Trapper",
            "addon1": "Any",
            "addon2": "Any",
            "perk1": "Discordance",
            "perk2": "Any",
            "perk3": "Any",
            "perk4": "Any",
            "offering": "Any",
            "notes": "",
            "submitter": "viewer"
        });
        if completed {
            build["completed"] = json!("2026-10-18T20:00:00Z");
        }
        build
    }

    async fn mount_channel(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/channels/1001"))
            .respond_with(ResponseTemplate::new(200).set_body_json(channel_json("1001", "streamer")))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn list_filters_and_sorts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                channel_json("3", "zeta_plays"),
                channel_json("1", "Alpha_Plays"),
                channel_json("2", "quiet"),
            ])))
            .mount(&server)
            .await;

        let ctx = context(&server.uri(), None);
        let html = handle_list_get(&ctx, "?q=PLAYS").await;
        let alpha = html.find("Alpha_Plays").unwrap();
        let zeta = html.find("zeta_plays").unwrap();
        assert!(alpha < zeta);
        assert!(!html.contains(">quiet<"));
        assert!(!html.contains("Create channel"));
        assert!(html.contains("2 pending"));
    }

    #[tokio::test]
    async fn list_offers_create_when_signed_in() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        let ctx = context(&server.uri(), Some("T"));
        let html = handle_list_get(&ctx, "").await;
        assert!(html.contains("Create channel"));
        assert!(html.contains("No channels found."));
    }

    #[tokio::test]
    async fn create_posts_name_with_token() {
        store::reset();
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/channels"))
            .and(header("X-Twitch-Token", "T"))
            .and(body_json(json!({"name": "streamer"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(channel_json("1001", "streamer")))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = context(&server.uri(), Some("T"));
        let html = handle_create_post(&ctx, "name=streamer").await;
        assert!(html.contains("Created channel streamer."));
        assert!(store::cached_channel("1001").is_some());
        store::reset();
    }

    #[tokio::test]
    async fn create_requires_name_and_token() {
        let server = MockServer::start().await;
        let ctx = context(&server.uri(), None);
        assert!(handle_create_post(&ctx, "name=+").await.contains("Enter a channel name"));
        assert!(handle_create_post(&ctx, "name=x").await.contains("Sign in"));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn channel_page_lists_pending_by_default() {
        store::reset();
        let server = MockServer::start().await;
        mount_channel(&server).await;
        Mock::given(method("GET"))
            .and(path("/channels/1001/builds"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                build_json("done", true),
                build_json("open", false),
            ])))
            .mount(&server)
            .await;

        let ctx = context(&server.uri(), None);
        let html = handle_channel_get(&ctx, "1001", "").await;
        assert!(html.contains("hx-trigger=\"every 10s\""));
        assert!(html.contains("build-open"));
        assert!(!html.contains("build-done"));
        assert!(!html.contains("Moderator tools"));
        assert!(store::cached_build("1001", "done").is_some());

        let html = handle_channel_get(&ctx, "1001", "?show=all").await;
        let open = html.find("build-open").unwrap();
        let done = html.find("build-done").unwrap();
        assert!(open < done);
        store::reset();
    }

    #[tokio::test]
    async fn channel_page_shows_mod_tools_to_owner() {
        store::reset();
        let server = MockServer::start().await;
        mount_channel(&server).await;
        Mock::given(method("GET"))
            .and(path("/channels/1001/builds"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([build_json("open", false)])))
            .mount(&server)
            .await;

        let ctx = context(&server.uri(), Some("T")).with_viewer(Some(moderator()));
        let html = handle_channel_get(&ctx, "1001", "").await;
        assert!(html.contains("Moderator tools"));
        assert!(html.contains("Mark complete"));
        assert!(html.contains("helpfulmod"));
        store::reset();
    }

    #[tokio::test]
    async fn builds_failure_still_renders_channel() {
        store::reset();
        let server = MockServer::start().await;
        mount_channel(&server).await;
        Mock::given(method("GET"))
            .and(path("/channels/1001/builds"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let ctx = context(&server.uri(), None);
        let html = handle_channel_get(&ctx, "1001", "").await;
        assert!(html.contains("streamer"));
        assert!(html.contains("Could not load builds"));
        store::reset();
    }

    #[tokio::test]
    async fn missing_channel_is_a_banner() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels/nope"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let ctx = context(&server.uri(), None);
        let html = handle_channel_get(&ctx, "nope", "").await;
        assert!(html.contains("not found"));
    }

    #[tokio::test]
    async fn delete_forgets_channel() {
        store::reset();
        store::remember_channel(&serde_json::from_value(channel_json("1001", "streamer")).unwrap());
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/channels/1001"))
            .and(header("X-Twitch-Token", "T"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = context(&server.uri(), Some("T"));
        assert!(handle_delete_post(&ctx, "1001").await.contains("Channel deleted."));
        assert!(store::cached_channel("1001").is_none());
    }

    #[tokio::test]
    async fn mods_refresh_renders_names() {
        store::reset();
        let server = MockServer::start().await;
        let mut refreshed = channel_json("1001", "streamer");
        refreshed["mods"] = json!(["helpfulmod", "newmod"]);
        Mock::given(method("POST"))
            .and(path("/channels/1001/update-mods"))
            .respond_with(ResponseTemplate::new(200).set_body_json(refreshed))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = context(&server.uri(), Some("T"));
        let html = handle_mods_post(&ctx, "1001").await;
        assert!(html.contains("helpfulmod, newmod"));
        assert_eq!(store::cached_channel("1001").unwrap().mods.len(), 2);
        store::reset();
    }

    #[tokio::test]
    async fn token_post_renders_submit_link() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/channels/1001/tokens"))
            .and(body_json(json!({"submitter": "viewer one"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "token": "tok123",
                "channelId": "1001",
                "submitter": "viewer one"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = context(&server.uri(), Some("T"));
        let html = handle_token_post(&ctx, "1001", "submitter=viewer+one").await;
        assert!(html.contains("value=\"/submit/1001/tok123\""));
        assert!(html.contains("<strong>viewer one</strong>"));
    }

    #[tokio::test]
    async fn options_editor_marks_disabled() {
        store::reset();
        let server = MockServer::start().await;
        mount_channel(&server).await;
        Mock::given(method("GET"))
            .and(path("/build-options"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "killer": {
                    "characters": {"The Trapper": ["Logwood Dye"]},
                    "perks": ["Discordance", "Hex: Ruin"],
                    "offerings": []
                }
            })))
            .mount(&server)
            .await;

        let ctx = context(&server.uri(), Some("T"));
        let html = handle_options_get(&ctx, "1001").await;
        assert!(html.contains("killer / perks"));
        assert!(html.contains("aria-pressed=\"true\""));
        assert!(html.contains(">Discordance</button>"));
        assert!(html.contains("Logwood Dye"));
        store::reset();
    }

    #[tokio::test]
    async fn toggling_option_sends_guarded_replace() {
        store::reset();
        store::remember_channel(&serde_json::from_value(channel_json("1001", "streamer")).unwrap());
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/channels/1001"))
            .and(body_json(json!([
                {"op": "test", "path": "/disabledOptions", "value": ["Hex: Ruin"]},
                {"op": "replace", "path": "/disabledOptions", "value": ["Hex: Ruin", "Discordance"]}
            ])))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = context(&server.uri(), Some("T"));
        let html = handle_options_post(&ctx, "1001", "option=Discordance").await;
        assert!(html.contains("aria-pressed=\"true\""));
        assert_eq!(
            store::cached_channel("1001").unwrap().disabled_options,
            vec!["Hex: Ruin", "Discordance"]
        );
        store::reset();
    }

    #[tokio::test]
    async fn rejected_toggle_keeps_prior_state() {
        for status in [400, 409, 500] {
            store::reset();
            store::remember_channel(&serde_json::from_value(channel_json("1001", "streamer")).unwrap());
            let server = MockServer::start().await;
            Mock::given(method("PATCH"))
                .and(path("/channels/1001"))
                .respond_with(
                    ResponseTemplate::new(status)
                        .set_body_json(json!({"message": "test operation failed"})),
                )
                .expect(1)
                .mount(&server)
                .await;

            let ctx = context(&server.uri(), Some("T"));
            let html = handle_options_post(&ctx, "1001", "option=Hex%3A+Ruin").await;
            assert!(html.contains("may have changed"), "status {}", status);
            assert!(!html.contains("test operation failed"), "status {}", status);
            assert!(html.contains("aria-pressed=\"true\""));
            assert_eq!(
                store::cached_channel("1001").unwrap().disabled_options,
                vec!["Hex: Ruin"]
            );
        }
        store::reset();
    }
}
