//! Storage for accounts, topics, rooms and messages.
//!
//! Every function takes the pool (or an open transaction) explicitly. Writes that
//! touch more than one row run inside a single transaction.

use std::str::FromStr;

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use thiserror::Error;

pub mod messages;
pub mod rooms;
pub mod topics;
pub mod users;

pub use messages::Message;
pub use rooms::{Participant, Room};
pub use topics::Topic;
pub use users::User;

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    /// A row the caller asked for by key doesn't exist
    #[error("{resource} doesn't exist")]
    NotFound { resource: &'static str },
    /// A unique column already holds this value
    #[error("{resource} with {field} {value} already exists")]
    Conflict {
        resource: &'static str,
        field: &'static str,
        value: String,
    },
    #[error(transparent)]
    Internal(#[from] sqlx::Error),
}

/// Helper trait to reduce boilerplate
pub trait IntoDbError {
    fn not_found_or(self, resource: &'static str) -> DbError;
    fn conflict_or(self, resource: &'static str, field: &'static str, value: &str) -> DbError;
}

impl IntoDbError for sqlx::Error {
    fn not_found_or(self, resource: &'static str) -> DbError {
        match self {
            sqlx::Error::RowNotFound => DbError::NotFound { resource },
            e => DbError::Internal(e),
        }
    }

    fn conflict_or(self, resource: &'static str, field: &'static str, value: &str) -> DbError {
        match self {
            sqlx::Error::Database(ref e) if e.is_unique_violation() => DbError::Conflict {
                resource,
                field,
                value: value.to_owned(),
            },
            e => DbError::Internal(e),
        }
    }
}

/// Opens a pool against `url`, creating the database file if needed.
pub async fn connect(url: &str, max_connections: u32) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// A private in-memory database with the schema applied.
///
/// The pool holds exactly one connection that never expires, since every new
/// connection to `:memory:` would see an empty database.
pub async fn connect_in_memory() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    migrate(&pool).await?;
    Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!()
        .run(pool)
        .await
        .map_err(|e| DbError::Internal(e.into()))
}

/// Turns free text into a `LIKE` pattern matching it as a substring.
///
/// `%`, `_` and the escape character itself are escaped, so queries must use
/// `ESCAPE '\'`.
pub fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_matches_everything() {
        assert_eq!(like_pattern(""), "%%");
    }

    #[test]
    fn wildcards_are_escaped() {
        assert_eq!(like_pattern("50%_off"), r"%50\%\_off%");
        assert_eq!(like_pattern(r"a\b"), r"%a\\b%");
    }
}
