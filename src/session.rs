//! Cookie sessions and the extractors that turn them into the requesting user.

use anyhow::anyhow;
use axum::{
    extract::{FromRef, FromRequestParts, OriginalUri},
    http::request::Parts,
};
use sqlx::SqlitePool;
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer, cookie::SameSite};

use crate::{
    AppError, AppResult,
    db::{self, DbError, User},
};

pub const USER_ID: &str = "user_id";

pub fn layer(secure: bool, idle: time::Duration) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_secure(secure)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(idle))
}

/// Binds `user` to the session under a fresh session id.
pub async fn sign_in(session: &Session, user: &User) -> AppResult<()> {
    session.cycle_id().await?;
    session.insert(USER_ID, user.id).await?;
    Ok(())
}

pub async fn sign_out(session: &Session) -> AppResult<()> {
    session.flush().await?;
    Ok(())
}

/// The signed-in user, if any. A session pointing at a deleted account counts
/// as anonymous.
pub struct CurrentUser(pub Option<User>);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    SqlitePool: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, reason)| AppError::Internal(anyhow!(reason)))?;

        let Some(user_id) = session.get::<i64>(USER_ID).await? else {
            return Ok(Self(None));
        };

        let db_pool = SqlitePool::from_ref(state);
        match db::users::by_id(&db_pool, user_id).await {
            Ok(user) => Ok(Self(Some(user))),
            Err(DbError::NotFound { .. }) => {
                session.remove::<i64>(USER_ID).await?;
                Ok(Self(None))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// The signed-in user. Anonymous requests are redirected to the login page.
pub struct RequireUser(pub User);

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
    SqlitePool: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match CurrentUser::from_request_parts(parts, state).await? {
            CurrentUser(Some(user)) => Ok(Self(user)),
            CurrentUser(None) => {
                // nested routers see their own suffix in `parts.uri`
                let next = match parts.extensions.get::<OriginalUri>() {
                    Some(OriginalUri(uri)) => uri.path(),
                    None => parts.uri.path(),
                };
                Err(AppError::LoginRequired {
                    next: next.to_owned(),
                })
            }
        }
    }
}
