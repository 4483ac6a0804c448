use sqlx::{FromRow, SqlitePool};
use time::PrimitiveDateTime;

use super::{DbError, IntoDbError, Result};

/// A forum account
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    /// Always lowercase
    pub username: String,
    /// PHC-formatted argon2 hash
    pub password: String,
    /// Display name shown next to posts
    pub name: String,
    pub email: String,
    pub bio: String,
    pub date_joined: PrimitiveDateTime,
}

#[derive(Debug)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug)]
pub struct UpdatedUser {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub email: String,
    pub bio: String,
}

pub async fn by_id(db_pool: &SqlitePool, user_id: i64) -> Result<User> {
    sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_one(db_pool)
        .await
        .map_err(|e| e.not_found_or("user"))
}

pub async fn by_username(db_pool: &SqlitePool, username: &str) -> Result<User> {
    sqlx::query_as("SELECT * FROM users WHERE username = ?")
        .bind(username.to_lowercase())
        .fetch_one(db_pool)
        .await
        .map_err(|e| e.not_found_or("user"))
}

/// Inserts an account. The username is lowercased before it is stored.
pub async fn create(db_pool: &SqlitePool, new_user: NewUser) -> Result<User> {
    let username = new_user.username.to_lowercase();

    sqlx::query_as("INSERT INTO users (username, password, name) VALUES (?, ?, ?) RETURNING *")
        .bind(&username)
        .bind(&new_user.password)
        .bind(&new_user.name)
        .fetch_one(db_pool)
        .await
        .map_err(|e| e.conflict_or("user", "username", &username))
}

pub async fn update(db_pool: &SqlitePool, updated_user: UpdatedUser) -> Result<User> {
    let username = updated_user.username.to_lowercase();

    sqlx::query_as(
        "UPDATE users SET username = ?, name = ?, email = ?, bio = ? WHERE id = ? RETURNING *",
    )
    .bind(&username)
    .bind(&updated_user.name)
    .bind(&updated_user.email)
    .bind(&updated_user.bio)
    .bind(updated_user.id)
    .fetch_one(db_pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::RowNotFound => DbError::NotFound { resource: "user" },
        e => e.conflict_or("user", "username", &username),
    })
}
