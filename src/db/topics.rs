use sqlx::{FromRow, SqliteConnection, SqlitePool};

use super::{Result, like_pattern};

/// A label shared by rooms, unique by name
#[derive(Debug, Clone, FromRow)]
pub struct Topic {
    pub id: i64,
    pub name: String,
    /// How many rooms currently use this topic
    pub room_count: i64,
}

const TOPIC_SELECT: &str = "
    SELECT topics.id, topics.name, COUNT(rooms.id) AS room_count
    FROM topics
        LEFT JOIN rooms ON rooms.topic_id = topics.id";

/// Returns the id of the topic called `name`, inserting it first if it's new.
///
/// Runs on the caller's connection so it shares the caller's transaction. The
/// unique constraint on `name` settles concurrent inserts.
pub async fn get_or_create(conn: &mut SqliteConnection, name: &str) -> Result<i64> {
    sqlx::query("INSERT INTO topics (name) VALUES (?) ON CONFLICT (name) DO NOTHING")
        .bind(name)
        .execute(&mut *conn)
        .await?;

    let (id,): (i64,) = sqlx::query_as("SELECT id FROM topics WHERE name = ?")
        .bind(name)
        .fetch_one(&mut *conn)
        .await?;

    Ok(id)
}

/// Lists topics in storage order, optionally capped at `limit`.
pub async fn list(db_pool: &SqlitePool, limit: Option<i64>) -> Result<Vec<Topic>> {
    let sql = format!("{TOPIC_SELECT} GROUP BY topics.id ORDER BY topics.id LIMIT ?");

    let topics = sqlx::query_as(&sql)
        .bind(limit.unwrap_or(-1))
        .fetch_all(db_pool)
        .await?;

    Ok(topics)
}

/// Topics whose name contains `query`, ignoring case.
pub async fn search(db_pool: &SqlitePool, query: &str) -> Result<Vec<Topic>> {
    let sql = format!(
        "{TOPIC_SELECT} WHERE topics.name LIKE ? ESCAPE '\\' GROUP BY topics.id ORDER BY topics.id"
    );

    let topics = sqlx::query_as(&sql)
        .bind(like_pattern(query))
        .fetch_all(db_pool)
        .await?;

    Ok(topics)
}
