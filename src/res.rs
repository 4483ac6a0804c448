use std::borrow::Cow;

use axum::{debug_handler, http::header, response::IntoResponse};
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::db::User;

#[macro_export]
macro_rules! include_res {
    (bytes, $p:expr) => {
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
    (str, $p:expr) => {
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
}

#[debug_handler]
pub async fn stylesheet() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/css")],
        include_res!(str, "/style.css"),
    )
}

/// Escapes user text for both element content and quoted attributes.
pub fn esc(s: &str) -> Cow<'_, str> {
    html_escape::encode_safe(s)
}

/// Substitutes `{key}` placeholders in one pass, so inserted values are never
/// scanned for placeholders themselves. Unknown keys are left as they are.
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];

        let hit = tail.find('}').and_then(|end| {
            let key = &tail[..end];
            values.iter().find(|(k, _)| *k == key).map(|(_, v)| (end, *v))
        });
        match hit {
            Some((end, value)) => {
                out.push_str(value);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Wraps `body` in the site layout. `title` is escaped here.
pub fn page(title: &str, user: Option<&User>, body: &str) -> String {
    let nav = match user {
        Some(user) => fill(
            include_res!(str, "/pages/nav_user.html"),
            &[
                ("id", &user.id.to_string()),
                ("username", &esc(&user.username)),
            ],
        ),
        None => include_res!(str, "/pages/nav_guest.html").to_owned(),
    };

    fill(
        include_res!(str, "/pages/layout.html"),
        &[("title", &esc(title)), ("nav", &nav), ("body", body)],
    )
}

pub fn sorry(what: &str) -> String {
    page(
        "Not found",
        None,
        &fill(include_res!(str, "/pages/not_found.html"), &[("what", &esc(what))]),
    )
}

/// Renders the error banner used by forms, or nothing.
pub fn error_note(error: Option<&str>) -> String {
    match error {
        Some(error) => format!(r#"<p class="error">{}</p>"#, esc(error)),
        None => String::new(),
    }
}

/// "3 hours ago" style age of a UTC timestamp.
pub fn ago(then: PrimitiveDateTime) -> String {
    ago_from(then, OffsetDateTime::now_utc())
}

fn ago_from(then: PrimitiveDateTime, now: OffsetDateTime) -> String {
    let secs = (now - then.assume_utc()).whole_seconds().max(0);

    let (n, unit) = match secs {
        0..60 => return "just now".to_owned(),
        60..3_600 => (secs / 60, "minute"),
        3_600..86_400 => (secs / 3_600, "hour"),
        86_400..604_800 => (secs / 86_400, "day"),
        604_800..2_592_000 => (secs / 604_800, "week"),
        2_592_000..31_536_000 => (secs / 2_592_000, "month"),
        _ => (secs / 31_536_000, "year"),
    };

    if n == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}
