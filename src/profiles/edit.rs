use axum::{
    Form, debug_handler,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Deserializer};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    AppError, AppResult, auth,
    db::{self, User, users::UpdatedUser},
    include_res, res,
    session::RequireUser,
};

fn empty_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = String::deserialize(deserializer)?;
    let value = value.trim();
    Ok((!value.is_empty()).then(|| value.to_owned()))
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ProfileForm {
    #[validate(length(min = 1, max = 150, message = "Username must be 1 to 150 characters."))]
    username: String,
    #[serde(default)]
    #[validate(length(max = 200, message = "Name can't be longer than 200 characters."))]
    name: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(email(message = "Enter a valid email address."))]
    email: Option<String>,
    #[serde(default)]
    bio: String,
}

impl ProfileForm {
    fn updated_user(&self, id: i64) -> AppResult<UpdatedUser> {
        let trimmed = ProfileForm {
            username: self.username.trim().to_owned(),
            name: self.name.trim().to_owned(),
            email: self.email.clone(),
            bio: self.bio.trim().to_owned(),
        };
        trimmed.validate()?;

        let username = trimmed.username.to_lowercase();
        auth::check_username(&username).map_err(|e| AppError::Validation(e.to_owned()))?;

        Ok(UpdatedUser {
            id,
            username,
            name: trimmed.name,
            email: trimmed.email.unwrap_or_default(),
            bio: trimmed.bio,
        })
    }
}

fn profile_form_html(user_id: i64, form: &ProfileForm, error: Option<&str>) -> String {
    res::fill(
        include_res!(str, "/pages/edit_user.html"),
        &[
            ("error", &res::error_note(error)),
            ("id", &user_id.to_string()),
            ("username", &res::esc(&form.username)),
            ("name", &res::esc(&form.name)),
            ("email", &res::esc(form.email.as_deref().unwrap_or_default())),
            ("bio", &res::esc(&form.bio)),
        ],
    )
}

impl From<&User> for ProfileForm {
    fn from(user: &User) -> Self {
        ProfileForm {
            username: user.username.clone(),
            name: user.name.clone(),
            email: Some(user.email.clone()).filter(|email| !email.is_empty()),
            bio: user.bio.clone(),
        }
    }
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn edit_profile_page(RequireUser(user): RequireUser) -> Response {
    let body = profile_form_html(user.id, &ProfileForm::from(&user), None);
    Html(res::page("Edit profile", Some(&user), &body)).into_response()
}

/// Always edits the signed-in account; there is no way to name another one.
#[debug_handler(state = crate::AppState)]
pub(crate) async fn edit_profile(
    RequireUser(user): RequireUser,
    State(db_pool): State<SqlitePool>,
    Form(form): Form<ProfileForm>,
) -> AppResult<Response> {
    let updated = match form.updated_user(user.id) {
        Ok(updated_user) => db::users::update(&db_pool, updated_user)
            .await
            .map_err(AppError::from),
        Err(e) => Err(e),
    };

    match updated {
        Ok(updated) => {
            tracing::info!("user {} updated their profile", updated.id);
            Ok(Redirect::to(&format!("/users/{}", updated.id)).into_response())
        }
        Err(AppError::Validation(message)) => {
            let body = profile_form_html(user.id, &form, Some(&message));
            Ok(Html(res::page("Edit profile", Some(&user), &body)).into_response())
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(username: &str, email: Option<&str>) -> ProfileForm {
        ProfileForm {
            username: username.to_owned(),
            name: " Alice ".to_owned(),
            email: email.map(str::to_owned),
            bio: String::new(),
        }
    }

    #[test]
    fn normalises_fields() {
        let updated = form("Alice", None).updated_user(7).unwrap();
        assert_eq!(updated.id, 7);
        assert_eq!(updated.username, "alice");
        assert_eq!(updated.name, "Alice");
        assert_eq!(updated.email, "");
    }

    #[test]
    fn rejects_bad_email_and_username() {
        assert!(form("alice", Some("nope")).updated_user(1).is_err());
        assert!(form("alice", Some("alice@example.com")).updated_user(1).is_ok());
        assert!(form("al ice", None).updated_user(1).is_err());
        assert!(matches!(
            form("   ", None).updated_user(1),
            Err(AppError::Validation(_))
        ));
    }
}
