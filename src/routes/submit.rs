//! `/submit/{id}/{token}` routes: the viewer's build form.
//!
//! Opening the link fetches the token, the catalogue and the channel once and
//! parks them in a draft. Every later interaction (type switch, selection,
//! randomize, notes) mutates the draft and re-renders the form locally. Only
//! `send` talks to the API again.

use chrono::Utc;
use rand::Rng;
use urlencoding::encode;

use crate::api::models::BuildType;
use crate::error::ApiError;
use crate::form::drafts::{self, Draft};
use crate::form::state::{BuildForm, Field, fields_for};
use crate::routes::util::{
    error_banner, escape_html, get_param, notice, parse_form_body,
};
use crate::routes::{Context, failure};

const INVALID_LINK: &str = "This build link is not valid. Ask the streamer's moderators for a new one.";
const EXPIRED_LINK: &str = "This build link has expired. Ask the streamer's moderators for a new one.";
const NO_DRAFT: &str = "This form is no longer open. Follow your build link again.";

// ── GET /submit/{id}/{token} ───────────────────────────────────────

pub async fn handle_form_get(ctx: &Context, channel_id: &str, token: &str) -> String {
    let build_token = match ctx.api.get_build_token(channel_id, token).await {
        Ok(t) => t,
        Err(ApiError::Status { status: 404, .. }) => {
            tracing::info!(channel_id, "unknown build token");
            return error_banner(INVALID_LINK);
        }
        Err(e) => return failure("open build link", channel_id, &e),
    };
    if build_token.expires.is_some_and(|at| at <= Utc::now()) {
        tracing::info!(channel_id, "expired build token");
        return error_banner(EXPIRED_LINK);
    }

    let catalogue = match ctx.api.get_build_options().await {
        Ok(c) => c,
        Err(e) => return failure("load build options", channel_id, &e),
    };
    if let Err(problem) = catalogue.check_layout() {
        tracing::error!(%problem, "unusable build options");
        return error_banner("Build options are unavailable right now. Please try again later.");
    }

    let channel = match ctx.api.get_channel(channel_id).await {
        Ok(c) => c,
        Err(e) => return failure("load channel", channel_id, &e),
    };

    let draft = Draft {
        form: BuildForm::default(),
        catalogue,
        channel,
        submitter: build_token.submitter,
    };
    let html = render_form(channel_id, token, &draft);
    drafts::insert_draft(channel_id, token, draft);
    html
}

// ── POST /submit/{id}/{token} ──────────────────────────────────────

/// Form interaction. `action` is one of `type`, `select`, `randomize`
/// (one `field`, or every field when none is given) or `notes`.
pub fn handle_form_post(channel_id: &str, token: &str, body: &str) -> String {
    handle_form_post_with(channel_id, token, body, &mut rand::thread_rng())
}

enum Outcome {
    Render,
    Quiet,
    Rejected(&'static str),
}

pub fn handle_form_post_with<R: Rng + ?Sized>(
    channel_id: &str,
    token: &str,
    body: &str,
    rng: &mut R,
) -> String {
    let params = parse_form_body(body);
    let action = get_param(&params, "action").unwrap_or("");
    let field = get_param(&params, "field").and_then(Field::parse);
    let value = get_param(&params, "value").unwrap_or("");

    let rendered = drafts::with_draft_mut(channel_id, token, |draft| {
        let form = &mut draft.form;
        let catalogue = &draft.catalogue;
        let disabled = &draft.channel.disabled_options;

        let outcome = match (action, field) {
            ("type", _) => match BuildType::parse(get_param(&params, "type").unwrap_or("")) {
                Some(t) => {
                    form.set_build_type(t);
                    Outcome::Render
                }
                None => Outcome::Rejected("Unknown build type."),
            },
            ("select", Some(field)) => {
                if form.select(field, value, catalogue, disabled) {
                    Outcome::Render
                } else {
                    Outcome::Rejected("That option is not available.")
                }
            }
            ("randomize", Some(field)) => {
                form.randomize(field, catalogue, disabled, rng);
                Outcome::Render
            }
            ("randomize", None) => {
                for field in fields_for(form.build_type()) {
                    form.randomize(field, catalogue, disabled, rng);
                }
                Outcome::Render
            }
            ("notes", _) => {
                form.notes = value.to_string();
                Outcome::Quiet
            }
            _ => Outcome::Rejected("Unknown form action."),
        };

        match outcome {
            Outcome::Render => render_form(channel_id, token, draft),
            Outcome::Quiet => String::new(),
            Outcome::Rejected(message) => {
                tracing::debug!(action, "rejected form action");
                let mut h = error_banner(message);
                h.push_str(&render_form(channel_id, token, draft));
                h
            }
        }
    });

    rendered.unwrap_or_else(|| error_banner(NO_DRAFT))
}

// ── POST /submit/{id}/{token}/send ─────────────────────────────────

/// PUT the build under the token's id. The draft is dropped only on success.
pub async fn handle_send_post(ctx: &Context, channel_id: &str, token: &str) -> String {
    let Some(draft) = drafts::get_draft(channel_id, token) else {
        return error_banner(NO_DRAFT);
    };
    let record = draft.form.to_record(token, &draft.submitter);

    match ctx.api.put_build(channel_id, token, &record).await {
        Ok(()) => {
            tracing::info!(channel_id, "build submitted");
            drafts::remove_draft(channel_id, token);
            notice(&format!(
                "Your build was sent to {}. Good luck in the fog!",
                draft.channel.name
            ))
        }
        Err(e) => {
            let mut h = failure("send your build", channel_id, &e);
            h.push_str(&render_form(channel_id, token, &draft));
            h
        }
    }
}

fn render_form(channel_id: &str, token: &str, draft: &Draft) -> String {
    let action_url = format!("/submit/{}/{}", encode(channel_id), encode(token));
    let form = &draft.form;
    let disabled = &draft.channel.disabled_options;

    let mut h = String::with_capacity(8192);
    h.push_str(r#"<div id="build-form" class="flex flex-col gap-3 max-w-md">"#);
    h.push_str(&format!(
        r#"<p class="text-sm">Build for <strong>{}</strong>{}</p>"#,
        escape_html(&draft.channel.name),
        if draft.submitter.is_empty() {
            String::new()
        } else {
            format!(" from <strong>{}</strong>", escape_html(&draft.submitter))
        }
    ));

    // Build type toggle
    h.push_str(r#"<div class="flex gap-2">"#);
    for t in [BuildType::Survivor, BuildType::Killer] {
        let active = if t == form.build_type() {
            "bg-red-700 text-amber-50"
        } else {
            "bg-slate-200 text-slate-700"
        };
        h.push_str(&format!(
            r##"<button type="button" class="{} font-bold py-1 px-3 rounded text-sm" hx-post="{}" hx-vals='{{"action":"type","type":"{}"}}' hx-target="#build-form" hx-swap="outerHTML">{}</button>"##,
            active,
            action_url,
            t.as_str(),
            t.label()
        ));
    }
    h.push_str("</div>");

    for field in fields_for(form.build_type()) {
        let current = form.get(field);
        h.push_str(r#"<div class="flex items-end gap-2">"#);
        h.push_str(&format!(
            r##"<label class="flex flex-col flex-1 text-sm">{}<select name="value" class="border rounded px-2 py-1" hx-post="{}" hx-trigger="change" hx-vals='{{"action":"select","field":"{}"}}' hx-target="#build-form" hx-swap="outerHTML">"##,
            field.label(),
            action_url,
            field.name()
        ));
        for choice in form.choices(field, &draft.catalogue, disabled) {
            h.push_str(&format!(
                r#"<option value="{}"{}{}>{}</option>"#,
                escape_html(&choice.value),
                if choice.value == current { " selected" } else { "" },
                if choice.enabled { "" } else { " disabled" },
                escape_html(&choice.value)
            ));
        }
        h.push_str("</select></label>");
        h.push_str(&format!(
            r##"<button type="button" title="Randomize {}" class="bg-slate-200 hover:bg-slate-300 rounded px-2 py-1 text-sm" hx-post="{}" hx-vals='{{"action":"randomize","field":"{}"}}' hx-target="#build-form" hx-swap="outerHTML">&#x1F3B2;</button>"##,
            field.label(),
            action_url,
            field.name()
        ));
        h.push_str("</div>");
    }

    h.push_str(&format!(
        r#"<label class="flex flex-col text-sm">Notes<textarea name="value" rows="3" class="border rounded px-2 py-1" hx-post="{}" hx-trigger="change" hx-vals='{{"action":"notes"}}' hx-swap="none">{}</textarea></label>"#,
        action_url,
        escape_html(&form.notes)
    ));

    h.push_str(r#"<div class="flex gap-2">"#);
    h.push_str(&format!(
        r##"<button type="button" class="bg-slate-200 hover:bg-slate-300 font-bold py-2 px-4 rounded text-sm" hx-post="{}" hx-vals='{{"action":"randomize"}}' hx-target="#build-form" hx-swap="outerHTML">Randomize all</button>"##,
        action_url
    ));
    h.push_str(&format!(
        r##"<button type="button" class="bg-red-700 hover:bg-emerald-600 text-amber-50 font-bold py-2 px-4 rounded text-sm" hx-post="{}/send" hx-target="#build-form" hx-swap="outerHTML">Send build</button>"##,
        action_url
    ));
    h.push_str("</div></div>");
    h
}
