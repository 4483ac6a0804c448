use axum::{
    debug_handler,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;

use crate::{AppResult, db, permissions::ensure_owner, res, session::RequireUser};

use super::confirm_delete_html;

#[debug_handler(state = crate::AppState)]
pub(crate) async fn delete_room_page(
    RequireUser(user): RequireUser,
    State(db_pool): State<SqlitePool>,
    Path(room_id): Path<i64>,
) -> AppResult<Response> {
    let room = db::rooms::by_id(&db_pool, room_id).await?;
    ensure_owner(&room, &user)?;

    let body = confirm_delete_html(
        &format!("/rooms/{room_id}/delete"),
        &format!("/rooms/{room_id}"),
        &room.name,
    );
    Ok(Html(res::page("Delete room", Some(&user), &body)).into_response())
}

/// Takes the room's messages and participants with it.
#[debug_handler(state = crate::AppState)]
pub(crate) async fn delete_room(
    RequireUser(user): RequireUser,
    State(db_pool): State<SqlitePool>,
    Path(room_id): Path<i64>,
) -> AppResult<Response> {
    let room = db::rooms::by_id(&db_pool, room_id).await?;
    ensure_owner(&room, &user)?;

    db::rooms::delete(&db_pool, room_id).await?;
    tracing::info!("user {} deleted room {room_id} ({:?})", user.id, room.name);

    Ok(Redirect::to("/").into_response())
}
