use axum::{
    Form, debug_handler,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;

use crate::{AppError, AppResult, db, permissions::ensure_owner, res, session::RequireUser};

use super::{RoomForm, room_form_html};

#[debug_handler(state = crate::AppState)]
pub(crate) async fn edit_room_page(
    RequireUser(user): RequireUser,
    State(db_pool): State<SqlitePool>,
    Path(room_id): Path<i64>,
) -> AppResult<Response> {
    let room = db::rooms::by_id(&db_pool, room_id).await?;
    ensure_owner(&room, &user)?;

    let topics = db::topics::list(&db_pool, None).await?;
    let action = format!("/rooms/{room_id}/edit");
    let body = room_form_html("Update Room", &action, &RoomForm::from(&room), &topics, None);

    Ok(Html(res::page("Update Room", Some(&user), &body)).into_response())
}

/// Host only. The room keeps its host, messages and participants.
#[debug_handler(state = crate::AppState)]
pub(crate) async fn edit_room(
    RequireUser(user): RequireUser,
    State(db_pool): State<SqlitePool>,
    Path(room_id): Path<i64>,
    Form(form): Form<RoomForm>,
) -> AppResult<Response> {
    let room = db::rooms::by_id(&db_pool, room_id).await?;
    ensure_owner(&room, &user)?;

    let updated = match form.fields() {
        Ok(fields) => db::rooms::update(&db_pool, room_id, fields)
            .await
            .map_err(AppError::from),
        Err(e) => Err(e),
    };

    match updated {
        Ok(_) => {
            tracing::info!("user {} updated room {room_id}", user.id);
            Ok(Redirect::to("/").into_response())
        }
        Err(AppError::Validation(message)) => {
            let topics = db::topics::list(&db_pool, None).await?;
            let action = format!("/rooms/{room_id}/edit");
            let body = room_form_html("Update Room", &action, &form, &topics, Some(&message));
            Ok(Html(res::page("Update Room", Some(&user), &body)).into_response())
        }
        Err(e) => Err(e),
    }
}
