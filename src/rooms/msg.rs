use axum::{
    debug_handler,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag};
use sqlx::SqlitePool;

use crate::{
    AppResult,
    db::{self, Message, User},
    include_res,
    permissions::ensure_owner,
    res,
    session::RequireUser,
};

use super::confirm_delete_html;

fn is_script_url(url: &str) -> bool {
    let url = url.trim_start().to_ascii_lowercase();
    ["javascript:", "vbscript:", "data:"]
        .iter()
        .any(|scheme| url.starts_with(scheme))
}

/// Markdown to HTML. Raw HTML in the source comes out as text and script links
/// are neutered.
pub(crate) fn render_markdown(body: &str) -> String {
    let parser = Parser::new_ext(body, Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES).map(
        |event| match event {
            Event::Html(html) | Event::InlineHtml(html) => Event::Text(html),
            Event::Start(Tag::Link { link_type, dest_url, title, id }) if is_script_url(&dest_url) => {
                Event::Start(Tag::Link { link_type, dest_url: CowStr::Borrowed("#"), title, id })
            }
            Event::Start(Tag::Image { link_type, dest_url, title, id }) if is_script_url(&dest_url) => {
                Event::Start(Tag::Image { link_type, dest_url: CowStr::Borrowed("#"), title, id })
            }
            _ => event,
        },
    );

    let mut html_output = String::new();
    pulldown_cmark::html::push_html(&mut html_output, parser);
    html_output
}

fn delete_link(message: &Message, viewer: Option<&User>) -> String {
    match viewer {
        Some(viewer) if viewer.id == message.user_id => {
            format!(r#"<a class="delete" href="/messages/{}/delete">Delete</a>"#, message.id)
        }
        _ => String::new(),
    }
}

/// One message in a room's conversation.
pub(crate) fn message_html(message: &Message, viewer: Option<&User>) -> String {
    res::fill(
        include_res!(str, "/pages/message.html"),
        &[
            ("id", &message.id.to_string()),
            ("user_id", &message.user_id.to_string()),
            ("author_username", &res::esc(&message.author_username)),
            ("created", &res::ago(message.created)),
            ("delete", &delete_link(message, viewer)),
            ("body", &render_markdown(&message.body)),
        ],
    )
}

/// Messages as activity entries, which also name the room they were posted in.
pub(crate) fn activity_html(messages: &[Message], viewer: Option<&User>) -> String {
    messages
        .iter()
        .map(|message| {
            res::fill(
                include_res!(str, "/pages/activity_item.html"),
                &[
                    ("user_id", &message.user_id.to_string()),
                    ("author_username", &res::esc(&message.author_username)),
                    ("created", &res::ago(message.created)),
                    ("room_id", &message.room_id.to_string()),
                    ("room_name", &res::esc(&message.room_name)),
                    ("body", &render_markdown(&message.body)),
                    ("delete", &delete_link(message, viewer)),
                ],
            )
        })
        .collect()
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn delete_message_page(
    RequireUser(user): RequireUser,
    State(db_pool): State<SqlitePool>,
    Path(message_id): Path<i64>,
) -> AppResult<Response> {
    let message = db::messages::by_id(&db_pool, message_id).await?;
    ensure_owner(&message, &user)?;

    let body = confirm_delete_html(
        &format!("/messages/{message_id}/delete"),
        &format!("/rooms/{}", message.room_id),
        &message.body,
    );
    Ok(Html(res::page("Delete message", Some(&user), &body)).into_response())
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn delete_message(
    RequireUser(user): RequireUser,
    State(db_pool): State<SqlitePool>,
    Path(message_id): Path<i64>,
) -> AppResult<Response> {
    let message = db::messages::by_id(&db_pool, message_id).await?;
    ensure_owner(&message, &user)?;

    db::messages::delete(&db_pool, message_id).await?;
    tracing::info!("user {} deleted message {message_id} in room {}", user.id, message.room_id);

    Ok(Redirect::to("/").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_markdown() {
        assert_eq!(render_markdown("**hi**"), "<p><strong>hi</strong></p>\n");
    }

    #[test]
    fn raw_html_is_shown_as_text() {
        let html = render_markdown("<script>alert(1)</script>\n\nok <b>x</b>");
        assert!(!html.contains("<script>"));
        assert!(!html.contains("<b>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn script_links_are_neutered() {
        let html = render_markdown("[click](javascript:alert(1))");
        assert!(html.contains(r##"href="#""##));
        assert!(!html.contains("javascript"));
    }
}
