use axum::{
    debug_handler,
    extract::{Path, State},
    response::{Html, IntoResponse, Response},
};
use sqlx::SqlitePool;

use crate::{AppResult, db, include_res, index, res, rooms, session::CurrentUser};

/// Anyone may look at anyone's profile.
#[debug_handler(state = crate::AppState)]
pub(crate) async fn profile(
    CurrentUser(viewer): CurrentUser,
    State(db_pool): State<SqlitePool>,
    Path(user_id): Path<i64>,
) -> AppResult<Response> {
    let user = db::users::by_id(&db_pool, user_id).await?;
    let hosted = db::rooms::by_host(&db_pool, user_id).await?;
    let messages = db::messages::by_author(&db_pool, user_id).await?;
    let topics = db::topics::list(&db_pool, None).await?;

    let edit = match &viewer {
        Some(viewer) if viewer.id == user.id => r#"<a class="button" href="/users/edit">Edit Profile</a>"#,
        _ => "",
    };
    let hosted: String = hosted.iter().map(rooms::room_item_html).collect();

    let body = res::fill(
        include_res!(str, "/pages/profile.html"),
        &[
            ("topics", &index::topic_items_html(&topics)),
            ("name", &res::esc(&user.name)),
            ("username", &res::esc(&user.username)),
            ("date_joined", &res::ago(user.date_joined)),
            ("edit", edit),
            ("bio", &res::esc(&user.bio)),
            ("rooms", &hosted),
            ("activity", &rooms::activity_html(&messages, viewer.as_ref())),
        ],
    );

    Ok(Html(res::page(&user.name, viewer.as_ref(), &body)).into_response())
}
