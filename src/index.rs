use axum::{
    Router, debug_handler,
    extract::{Query, State},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{
    AppResult, AppState,
    db::{self, Topic},
    include_res, res, rooms,
    session::CurrentUser,
};

/// How many topics the home page sidebar shows.
const HOME_TOPICS: i64 = 5;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/topics", get(topics))
        .route("/activity", get(activity))
}

#[derive(Deserialize)]
pub(crate) struct SearchQuery {
    #[serde(default)]
    q: String,
}

/// Sidebar entries; each one filters the home page by its topic.
pub(crate) fn topic_items_html(topics: &[Topic]) -> String {
    topics
        .iter()
        .map(|topic| {
            res::fill(
                include_res!(str, "/pages/topic_item.html"),
                &[
                    ("name", &res::esc(&topic.name)),
                    ("room_count", &topic.room_count.to_string()),
                ],
            )
        })
        .collect()
}

/// Rooms matching `q` by name, description or topic, newest activity first.
#[debug_handler(state = AppState)]
pub(crate) async fn index(
    CurrentUser(user): CurrentUser,
    State(db_pool): State<SqlitePool>,
    Query(SearchQuery { q }): Query<SearchQuery>,
) -> AppResult<Response> {
    let found = db::rooms::search(&db_pool, &q).await?;
    let topics = db::topics::list(&db_pool, Some(HOME_TOPICS)).await?;
    let messages = db::messages::by_topic(&db_pool, &q).await?;

    let room_items: String = found.iter().map(rooms::room_item_html).collect();

    let body = res::fill(
        include_res!(str, "/pages/home.html"),
        &[
            ("topics", &topic_items_html(&topics)),
            ("room_count", &found.len().to_string()),
            ("rooms", &room_items),
            ("activity", &rooms::activity_html(&messages, user.as_ref())),
        ],
    );

    Ok(Html(res::page("Home", user.as_ref(), &body)).into_response())
}

#[debug_handler(state = AppState)]
pub(crate) async fn topics(
    CurrentUser(user): CurrentUser,
    State(db_pool): State<SqlitePool>,
    Query(SearchQuery { q }): Query<SearchQuery>,
) -> AppResult<Response> {
    let topics = db::topics::search(&db_pool, &q).await?;

    let body = res::fill(
        include_res!(str, "/pages/topics.html"),
        &[("q", &res::esc(&q)), ("topics", &topic_items_html(&topics))],
    );

    Ok(Html(res::page("Topics", user.as_ref(), &body)).into_response())
}

/// Every message, oldest first.
#[debug_handler(state = AppState)]
pub(crate) async fn activity(
    CurrentUser(user): CurrentUser,
    State(db_pool): State<SqlitePool>,
) -> AppResult<Response> {
    let messages = db::messages::all(&db_pool).await?;

    let body = res::fill(
        include_res!(str, "/pages/activity.html"),
        &[("activity", &rooms::activity_html(&messages, user.as_ref()))],
    );

    Ok(Html(res::page("Activity", user.as_ref(), &body)).into_response())
}
