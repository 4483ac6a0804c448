use axum::{
    Form, debug_handler,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;
use validator::Validate;

use crate::{
    AppError, AppResult,
    db::{self, users::NewUser},
    include_res, res,
    session::{self, CurrentUser},
};

use super::{hash_password, random_name};

#[derive(Deserialize, Validate)]
pub(crate) struct RegisterForm {
    #[validate(length(min = 1, max = 150, message = "Username must be 1 to 150 characters."))]
    username: String,
    #[validate(length(min = 8, message = "Password must contain at least 8 characters."))]
    password1: String,
    #[validate(must_match(other = "password1", message = "The two password fields didn't match."))]
    password2: String,
}

/// Username charset: letters, digits and `@.+-_`. Empty names are rejected.
pub(crate) fn check_username(username: &str) -> Result<(), &'static str> {
    if username.is_empty() {
        return Err("Username is required.");
    }
    if username
        .chars()
        .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
    {
        Ok(())
    } else {
        Err("Username may only contain letters, digits and @/./+/-/_ characters.")
    }
}

fn check_password(username: &str, password: &str) -> Result<(), &'static str> {
    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err("Password can't be entirely numeric.");
    }
    if !username.is_empty() && password.to_lowercase().contains(username) {
        return Err("Password is too similar to the username.");
    }
    Ok(())
}

impl RegisterForm {
    /// Normalises the username and returns it if every rule passes.
    fn check(&self) -> Result<String, AppError> {
        let trimmed = RegisterForm {
            username: self.username.trim().to_owned(),
            password1: self.password1.clone(),
            password2: self.password2.clone(),
        };
        trimmed.validate()?;

        let username = trimmed.username.to_lowercase();
        check_username(&username).map_err(|e| AppError::Validation(e.to_owned()))?;
        check_password(&username, &self.password1).map_err(|e| AppError::Validation(e.to_owned()))?;
        Ok(username)
    }
}

fn register_form(username: &str, error: Option<&str>) -> Response {
    let body = res::fill(
        include_res!(str, "/pages/register.html"),
        &[
            ("error", &res::error_note(error)),
            ("username", &res::esc(username)),
        ],
    );
    Html(res::page("Sign up", None, &body)).into_response()
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn register_page(CurrentUser(user): CurrentUser) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }

    register_form("", None)
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn register(
    CurrentUser(user): CurrentUser,
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> AppResult<Response> {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let created = match form.check() {
        Ok(username) => {
            let new_user = NewUser {
                username,
                password: hash_password(&form.password1)?,
                name: random_name(),
            };
            db::users::create(&db_pool, new_user).await.map_err(AppError::from)
        }
        Err(e) => Err(e),
    };

    let user = match created {
        Ok(user) => user,
        Err(AppError::Validation(message)) => {
            return Ok(register_form(&form.username, Some(&message)));
        }
        Err(e) => return Err(e),
    };

    session::sign_in(&session, &user).await?;
    tracing::info!("registered user {} as {:?}", user.id, user.username);

    Ok(Redirect::to("/").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(username: &str, password1: &str, password2: &str) -> RegisterForm {
        RegisterForm {
            username: username.to_owned(),
            password1: password1.to_owned(),
            password2: password2.to_owned(),
        }
    }

    #[test]
    fn accepts_reasonable_signup() {
        assert_eq!(form("Alice", "s3cret-pass", "s3cret-pass").check().unwrap(), "alice");
    }

    #[test]
    fn password_rules() {
        let rejected = [
            form("alice", "short", "short"),
            form("alice", "12345678901", "12345678901"),
            form("alice", "xxALICExx", "xxALICExx"),
            form("alice", "s3cret-pass", "s3cret-pasS"),
        ];
        for form in rejected {
            assert!(matches!(form.check(), Err(AppError::Validation(_))));
        }
    }

    #[test]
    fn username_rules() {
        assert!(check_username("a.b+c-d_e@f").is_ok());
        assert!(check_username("José").is_ok());
        assert!(check_username("bad name").is_err());
        assert!(check_username("").is_err());
        assert!(form("", "s3cret-pass", "s3cret-pass").check().is_err());
        assert!(form(&"a".repeat(151), "s3cret-pass", "s3cret-pass").check().is_err());
        assert!(matches!(
            form("   ", "s3cret-pass", "s3cret-pass").check(),
            Err(AppError::Validation(_))
        ));
    }
}
