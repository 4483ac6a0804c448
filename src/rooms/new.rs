use axum::{
    Form, debug_handler,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;

use crate::{AppError, AppResult, db, res, session::RequireUser};

use super::{RoomForm, room_form_html};

#[debug_handler(state = crate::AppState)]
pub(crate) async fn new_room_page(
    RequireUser(user): RequireUser,
    State(db_pool): State<SqlitePool>,
) -> AppResult<Response> {
    let topics = db::topics::list(&db_pool, None).await?;
    let body = room_form_html("Create Room", "/rooms/new", &RoomForm::default(), &topics, None);

    Ok(Html(res::page("Create Room", Some(&user), &body)).into_response())
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn new_room(
    RequireUser(user): RequireUser,
    State(db_pool): State<SqlitePool>,
    Form(form): Form<RoomForm>,
) -> AppResult<Response> {
    let created = match form.fields() {
        Ok(fields) => db::rooms::create(&db_pool, user.id, fields)
            .await
            .map_err(AppError::from),
        Err(e) => Err(e),
    };

    match created {
        Ok(room) => {
            tracing::info!("user {} created room {} under {:?}", user.id, room.id, room.topic_name);
            Ok(Redirect::to("/").into_response())
        }
        Err(AppError::Validation(message)) => {
            let topics = db::topics::list(&db_pool, None).await?;
            let body = room_form_html("Create Room", "/rooms/new", &form, &topics, Some(&message));
            Ok(Html(res::page("Create Room", Some(&user), &body)).into_response())
        }
        Err(e) => Err(e),
    }
}
