use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use thiserror::Error;
use validator::ValidationErrors;

use crate::{db::DbError, res};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),
    /// No session; the user is sent to the login page and back to `next` afterwards
    #[error("login required for {next}")]
    LoginRequired { next: String },
    /// Signed in, but not the host or author of what they're touching
    #[error("not allowed")]
    Forbidden,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound(what) => (StatusCode::NOT_FOUND, Html(res::sorry(what))).into_response(),
            Self::LoginRequired { next } => {
                Redirect::to(&format!("/login?next={next}")).into_response()
            }
            Self::Forbidden => (StatusCode::FORBIDDEN, "You are not allowed here!!").into_response(),
            Self::Validation(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            Self::Internal(err) => {
                tracing::error!("{err:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong").into_response()
            }
        }
    }
}

impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { resource } => Self::NotFound(resource),
            DbError::Conflict { resource, field, .. } => {
                Self::Validation(format!("A {resource} with that {field} already exists."))
            }
            DbError::Internal(e) => Self::Internal(e.into()),
        }
    }
}

macro_rules! apperr_impl {
    ($E:ty) => {
        impl From<$E> for AppError {
            fn from(err: $E) -> Self {
                Self::Internal(anyhow::Error::from(err))
            }
        }
    };
}

apperr_impl!(sqlx::Error);
apperr_impl!(tower_sessions::session::Error);

impl From<argon2::password_hash::Error> for AppError {
    fn from(err: argon2::password_hash::Error) -> Self {
        Self::Internal(anyhow::anyhow!("password hashing failed: {err}"))
    }
}

/// Collects every failed field rule into one message, in a stable order.
impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<_> = errors
            .field_errors()
            .into_values()
            .flat_map(|errors| errors.iter())
            .map(|error| match &error.message {
                Some(message) => message.to_string(),
                None => format!("Invalid {}.", error.code),
            })
            .collect();
        messages.sort();
        messages.dedup();
        Self::Validation(messages.join(" "))
    }
}
