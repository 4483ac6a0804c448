use axum::{
    Form, debug_handler,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{
    AppError, AppResult, db, include_res, res,
    session::{CurrentUser, RequireUser},
};

use super::msg;

#[derive(Deserialize)]
pub(crate) struct MessageForm {
    body: String,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn room(
    CurrentUser(user): CurrentUser,
    State(db_pool): State<SqlitePool>,
    Path(room_id): Path<i64>,
) -> AppResult<Response> {
    let room = db::rooms::by_id(&db_pool, room_id).await?;
    let messages = db::messages::in_room(&db_pool, room_id).await?;
    let participants = db::rooms::participants(&db_pool, room_id).await?;

    let messages: String = messages
        .iter()
        .map(|message| msg::message_html(message, user.as_ref()))
        .collect();

    let participants: String = participants
        .iter()
        .map(|participant| {
            res::fill(
                include_res!(str, "/pages/participant_item.html"),
                &[
                    ("id", &participant.id.to_string()),
                    ("name", &res::esc(&participant.name)),
                    ("username", &res::esc(&participant.username)),
                ],
            )
        })
        .collect();

    let host_actions = match &user {
        Some(user) if user.id == room.host_id => format!(
            r#"<span><a href="/rooms/{room_id}/edit">Edit</a> <a href="/rooms/{room_id}/delete">Delete</a></span>"#
        ),
        _ => String::new(),
    };

    let message_form = match &user {
        Some(_) => res::fill(
            include_res!(str, "/pages/message_form.html"),
            &[("room_id", &room_id.to_string())],
        ),
        None => format!(
            r#"<p><a href="/login?next=/rooms/{room_id}">Login</a> to join the conversation.</p>"#
        ),
    };

    let body = res::fill(
        include_res!(str, "/pages/room.html"),
        &[
            ("name", &res::esc(&room.name)),
            ("host_actions", &host_actions),
            ("host_id", &room.host_id.to_string()),
            ("host_username", &res::esc(&room.host_username)),
            ("created", &res::ago(room.created)),
            ("topic_name", &res::esc(&room.topic_name)),
            ("description", &res::esc(&room.description)),
            ("messages", &messages),
            ("message_form", &message_form),
            ("participant_count", &room.participant_count.to_string()),
            ("participants", &participants),
        ],
    );

    Ok(Html(res::page(&room.name, user.as_ref(), &body)).into_response())
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn post_message(
    RequireUser(user): RequireUser,
    State(db_pool): State<SqlitePool>,
    Path(room_id): Path<i64>,
    Form(MessageForm { body }): Form<MessageForm>,
) -> AppResult<Response> {
    let body = body.trim();
    if body.is_empty() {
        return Err(AppError::Validation("Message can't be empty.".to_owned()));
    }

    let message = db::messages::post(&db_pool, room_id, user.id, body).await?;
    tracing::info!("user {} posted message {} in room {room_id}", user.id, message.id);

    Ok(Redirect::to(&format!("/rooms/{room_id}")).into_response())
}
