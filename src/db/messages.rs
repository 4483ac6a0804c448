use sqlx::{FromRow, SqlitePool};
use time::PrimitiveDateTime;

use super::{DbError, IntoDbError, Result, like_pattern};

/// A post in a room, joined with its author and room
#[derive(Debug, Clone, FromRow)]
pub struct Message {
    pub id: i64,
    pub room_id: i64,
    /// The author, the only user allowed to delete the message
    pub user_id: i64,
    pub body: String,
    pub created: PrimitiveDateTime,
    pub author_username: String,
    pub room_name: String,
}

macro_rules! message_query {
    ($tail:literal) => {
        concat!(
            "SELECT
                messages.id, messages.room_id, messages.user_id, messages.body, messages.created,
                users.username AS author_username,
                rooms.name AS room_name
            FROM messages
                INNER JOIN users ON users.id = messages.user_id
                INNER JOIN rooms ON rooms.id = messages.room_id ",
            $tail
        )
    };
}

/// Posts `body` to a room and makes the author a participant of it.
pub async fn post(db_pool: &SqlitePool, room_id: i64, user_id: i64, body: &str) -> Result<Message> {
    let mut tx = db_pool.begin().await?;

    sqlx::query("SELECT 1 FROM rooms WHERE id = ?")
        .bind(room_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(DbError::NotFound { resource: "room" })?;

    // the room exists, so a failing reference can only be the author
    let (message_id,): (i64,) =
        sqlx::query_as("INSERT INTO messages (user_id, room_id, body) VALUES (?, ?, ?) RETURNING id")
            .bind(user_id)
            .bind(room_id)
            .bind(body)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                    DbError::NotFound { resource: "user" }
                }
                e => DbError::Internal(e),
            })?;

    sqlx::query("INSERT OR IGNORE INTO room_participants (room_id, user_id) VALUES (?, ?)")
        .bind(room_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    by_id(db_pool, message_id).await
}

pub async fn by_id(db_pool: &SqlitePool, message_id: i64) -> Result<Message> {
    sqlx::query_as(message_query!("WHERE messages.id = ?"))
        .bind(message_id)
        .fetch_one(db_pool)
        .await
        .map_err(|e| e.not_found_or("message"))
}

/// A room's history, oldest first.
pub async fn in_room(db_pool: &SqlitePool, room_id: i64) -> Result<Vec<Message>> {
    let messages = sqlx::query_as(message_query!(
        "WHERE messages.room_id = ? ORDER BY messages.id"
    ))
    .bind(room_id)
    .fetch_all(db_pool)
    .await?;

    Ok(messages)
}

pub async fn by_author(db_pool: &SqlitePool, user_id: i64) -> Result<Vec<Message>> {
    let messages = sqlx::query_as(message_query!(
        "WHERE messages.user_id = ? ORDER BY messages.id"
    ))
    .bind(user_id)
    .fetch_all(db_pool)
    .await?;

    Ok(messages)
}

/// Messages in rooms whose topic name contains `query`, ignoring case.
pub async fn by_topic(db_pool: &SqlitePool, query: &str) -> Result<Vec<Message>> {
    let messages = sqlx::query_as(message_query!(
        "INNER JOIN topics ON topics.id = rooms.topic_id
        WHERE topics.name LIKE ? ESCAPE '\\'
        ORDER BY messages.id"
    ))
    .bind(like_pattern(query))
    .fetch_all(db_pool)
    .await?;

    Ok(messages)
}

/// Every message, in storage order.
pub async fn all(db_pool: &SqlitePool) -> Result<Vec<Message>> {
    let messages = sqlx::query_as(message_query!("ORDER BY messages.id"))
        .fetch_all(db_pool)
        .await?;

    Ok(messages)
}

/// Deletes one message. The author stays a participant of the room.
pub async fn delete(db_pool: &SqlitePool, message_id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM messages WHERE id = ?")
        .bind(message_id)
        .execute(db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound { resource: "message" });
    }

    Ok(())
}
