use axum::{
    Form, debug_handler,
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{
    AppResult,
    db::{self, DbError},
    include_res, res,
    session::{self, CurrentUser},
};

use super::{local_redirect, verify_password};

const BAD_CREDENTIALS: &str = "Username OR password does not exist";

#[derive(Deserialize)]
pub(crate) struct LoginQuery {
    next: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct LoginForm {
    username: String,
    password: String,
    next: Option<String>,
}

fn login_form(username: &str, next: Option<&str>, error: Option<&str>) -> Response {
    let body = res::fill(
        include_res!(str, "/pages/login.html"),
        &[
            ("error", &res::error_note(error)),
            ("username", &res::esc(username)),
            ("next", &res::esc(next.unwrap_or_default())),
        ],
    );
    Html(res::page("Login", None, &body)).into_response()
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn login_page(
    CurrentUser(user): CurrentUser,
    Query(LoginQuery { next }): Query<LoginQuery>,
) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }

    login_form("", next.as_deref(), None)
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn login(
    CurrentUser(user): CurrentUser,
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(LoginForm { username, password, next }): Form<LoginForm>,
) -> AppResult<Response> {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let username = username.trim().to_lowercase();
    let user = match db::users::by_username(&db_pool, &username).await {
        Ok(user) if verify_password(&password, &user.password) => user,
        Ok(_) | Err(DbError::NotFound { .. }) => {
            tracing::info!("failed login for {username:?}");
            return Ok(login_form(&username, next.as_deref(), Some(BAD_CREDENTIALS)));
        }
        Err(e) => return Err(e.into()),
    };

    session::sign_in(&session, &user).await?;
    tracing::info!("user {} logged in", user.id);

    Ok(Redirect::to(local_redirect(next.as_deref())).into_response())
}
