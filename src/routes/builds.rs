//! `/channels/{id}/builds/*` routes: build rows and moderator completion.

use chrono::Utc;
use urlencoding::encode;

use crate::api::models::{BuildRecord, api_timestamp};
use crate::patch;
use crate::routes::util::{error_banner, escape_html};
use crate::routes::{Context, STALE_RECORD, failure};
use crate::store;

/// Render one build as a list row. Moderators get a completion toggle.
pub fn render_build_row(channel_id: &str, build: &BuildRecord, moderator: bool) -> String {
    let mut h = String::with_capacity(1024);
    let done_class = if build.is_completed() {
        "opacity-60 bg-slate-100"
    } else {
        "bg-amber-50"
    };
    h.push_str(&format!(
        r#"<li id="build-{}" class="{} rounded shadow p-3 mb-2 text-sm">"#,
        escape_html(&build.id),
        done_class
    ));
    h.push_str(&format!(
        r#"<p class="font-bold">{} — {}</p>"#,
        escape_html(build.build_type.label()),
        escape_html(&build.character)
    ));
    if let Some(item) = &build.item {
        h.push_str(&format!(
            r#"<p>Item: {} ({}, {})</p>"#,
            escape_html(item),
            escape_html(&build.addon1),
            escape_html(&build.addon2)
        ));
    } else {
        h.push_str(&format!(
            r#"<p>Add-ons: {}, {}</p>"#,
            escape_html(&build.addon1),
            escape_html(&build.addon2)
        ));
    }
    let perks: Vec<String> = build.perks().iter().map(|p| escape_html(p)).collect();
    h.push_str(&format!(r#"<p>Perks: {}</p>"#, perks.join(", ")));
    h.push_str(&format!(
        r#"<p>Offering: {}</p>"#,
        escape_html(&build.offering)
    ));
    if !build.notes.is_empty() {
        h.push_str(&format!(
            r#"<p class="italic">“{}”</p>"#,
            escape_html(&build.notes)
        ));
    }
    if !build.submitter.is_empty() {
        h.push_str(&format!(
            r#"<p class="text-xs text-slate-500">from {}</p>"#,
            escape_html(&build.submitter)
        ));
    }
    if let Some(raw) = &build.completed {
        let shown = build
            .completed_at()
            .map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| raw.clone());
        h.push_str(&format!(
            r#"<p class="text-xs text-emerald-700">Completed {}</p>"#,
            escape_html(&shown)
        ));
    } else if let Some(raw) = &build.expires {
        let shown = build
            .expires_at()
            .map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| raw.clone());
        h.push_str(&format!(
            r#"<p class="text-xs text-slate-500">Expires {}</p>"#,
            escape_html(&shown)
        ));
    }
    if moderator {
        let label = if build.is_completed() {
            "Mark pending"
        } else {
            "Mark complete"
        };
        h.push_str(&format!(
            r##"<button type="button" class="mt-2 bg-red-700 hover:bg-emerald-600 text-amber-50 font-bold py-1 px-3 rounded text-xs" hx-post="/channels/{}/builds/{}/complete" hx-target="#build-{}" hx-swap="outerHTML">{}</button>"##,
            encode(channel_id),
            encode(&build.id),
            escape_html(&build.id),
            label
        ));
    }
    h.push_str("</li>");
    h
}

// ── POST /channels/{id}/builds/{buildId}/complete ──────────────────

/// Toggle a build's completion with a test-guarded PATCH. Any rejection
/// re-renders the row from the unchanged local copy.
pub async fn handle_complete_post(ctx: &Context, channel_id: &str, build_id: &str) -> String {
    let token = match ctx.require_token() {
        Ok(t) => t,
        Err(e) => return failure("update build", build_id, &e),
    };

    let previous = match store::cached_build(channel_id, build_id) {
        Some(b) => b,
        None => match ctx.api.list_builds(channel_id).await {
            Ok(builds) => {
                store::remember_builds(channel_id, &builds);
                match builds.into_iter().find(|b| b.id == build_id) {
                    Some(b) => b,
                    None => return error_banner("That build no longer exists."),
                }
            }
            Err(e) => return failure("load builds", channel_id, &e),
        },
    };

    let mut updated = previous.clone();
    updated.completed = match previous.completed {
        Some(_) => None,
        None => Some(api_timestamp(Utc::now())),
    };

    let ops = match patch::diff_records(&previous, &updated) {
        Ok(ops) => ops,
        Err(e) => {
            tracing::error!(build_id, error = %e, "failed to diff build");
            return error_banner("Could not update the build.");
        }
    };

    match ctx.api.patch_build(token, channel_id, build_id, &ops).await {
        Ok(()) => {
            let saved = patch::apply_to(&previous, &ops).unwrap_or(updated);
            store::replace_build(channel_id, &saved);
            render_build_row(channel_id, &saved, true)
        }
        Err(e) => {
            tracing::warn!(channel_id, build_id, error = %e, "failed to patch build");
            let mut h = error_banner(STALE_RECORD);
            h.push_str(&render_build_row(channel_id, &previous, true));
            h
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::BuildType;
    use crate::routes::tests::context;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn build(completed: bool) -> BuildRecord {
        BuildRecord {
            id: "b1".into(),
            build_type: BuildType::Survivor,
            character: "Meg Thomas".into(),
            item: Some("Flashlight".into()),
            addon1: "Battery".into(),
            addon2: "Any".into(),
            perk1: "Sprint Burst".into(),
            perk2: "Any".into(),
            perk3: "Any".into(),
            perk4: "Any".into(),
            offering: "Any".into(),
            notes: "<script>".into(),
            submitter: "viewer".into(),
            completed: completed.then(|| "2026-10-19T10:00:00.000Z".to_string()),
            expires: None,
        }
    }

    #[test]
    fn row_escapes_and_shows_controls() {
        let html = render_build_row("1001", &build(false), true);
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("Mark complete"));
        assert!(html.contains("hx-post=\"/channels/1001/builds/b1/complete\""));
        let html = render_build_row("1001", &build(true), false);
        assert!(html.contains("Completed 2026-10-19 10:00 UTC"));
        assert!(!html.contains("hx-post"));
    }

    #[tokio::test]
    async fn uncompleting_tests_then_removes() {
        store::reset();
        store::remember_builds("1001", &[build(true)]);
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/channels/1001/builds/b1"))
            .and(body_json(json!([
                {"op": "test", "path": "/completed", "value": "2026-10-19T10:00:00.000Z"},
                {"op": "remove", "path": "/completed"}
            ])))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = context(&server.uri(), Some("T"));
        let html = handle_complete_post(&ctx, "1001", "b1").await;
        assert!(html.contains("Mark complete"));
        assert!(!store::cached_build("1001", "b1").unwrap().is_completed());
        store::reset();
    }

    #[tokio::test]
    async fn completing_fetches_when_not_cached() {
        store::reset();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels/1001/builds"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([serde_json::to_value(build(false)).unwrap()])),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/channels/1001/builds/b1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = context(&server.uri(), Some("T"));
        let html = handle_complete_post(&ctx, "1001", "b1").await;
        assert!(html.contains("Mark pending"));
        assert!(store::cached_build("1001", "b1").unwrap().is_completed());

        let requests = server.received_requests().await.unwrap();
        let patch = requests.iter().find(|r| r.method.as_str() == "PATCH").unwrap();
        let ops: serde_json::Value = serde_json::from_slice(&patch.body).unwrap();
        assert_eq!(ops[0]["op"], "add");
        assert_eq!(ops[0]["path"], "/completed");
        let stamp = ops[0]["value"].as_str().unwrap();
        assert_eq!(stamp.len(), "2026-10-19T10:00:00.000Z".len());
        assert!(stamp.ends_with('Z'));
        store::reset();
    }

    #[tokio::test]
    async fn test_guard_echoes_the_stored_timestamp() {
        store::reset();
        let server = MockServer::start().await;
        let mut stored = serde_json::to_value(build(true)).unwrap();
        stored["completed"] = json!("2026-10-19T10:00:00.123+00:00");
        Mock::given(method("GET"))
            .and(path("/channels/1001/builds"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([stored])))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/channels/1001/builds/b1"))
            .and(body_json(json!([
                {"op": "test", "path": "/completed", "value": "2026-10-19T10:00:00.123+00:00"},
                {"op": "remove", "path": "/completed"}
            ])))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = context(&server.uri(), Some("T"));
        let html = handle_complete_post(&ctx, "1001", "b1").await;
        assert!(html.contains("Mark complete"));
        store::reset();
    }

    #[tokio::test]
    async fn rejected_patch_keeps_local_copy() {
        for status in [400, 409, 412, 500] {
            store::reset();
            store::remember_builds("1001", &[build(false)]);
            let server = MockServer::start().await;
            Mock::given(method("PATCH"))
                .and(path("/channels/1001/builds/b1"))
                .respond_with(
                    ResponseTemplate::new(status)
                        .set_body_json(json!({"message": "test operation failed"})),
                )
                .expect(1)
                .mount(&server)
                .await;

            let ctx = context(&server.uri(), Some("T"));
            let html = handle_complete_post(&ctx, "1001", "b1").await;
            assert!(html.contains("may have changed"), "status {}", status);
            assert!(!html.contains("test operation failed"), "status {}", status);
            assert!(html.contains("Mark complete"));
            assert!(!store::cached_build("1001", "b1").unwrap().is_completed());
        }
        store::reset();
    }

    #[tokio::test]
    async fn signed_out_makes_no_call() {
        let server = MockServer::start().await;
        let ctx = context(&server.uri(), None);
        let html = handle_complete_post(&ctx, "1001", "b1").await;
        assert!(html.contains("Sign in"));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_build_reports_missing() {
        store::reset();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels/1001/builds"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let ctx = context(&server.uri(), Some("T"));
        let html = handle_complete_post(&ctx, "1001", "b1").await;
        assert!(html.contains("no longer exists"));
        store::reset();
    }
}
