use sqlx::{FromRow, SqlitePool};
use time::PrimitiveDateTime;

use super::{DbError, IntoDbError, Result, like_pattern, topics};

/// A discussion room, joined with its topic and host
#[derive(Debug, Clone, FromRow)]
pub struct Room {
    pub id: i64,
    /// The creator, the only user allowed to edit or delete the room
    pub host_id: i64,
    pub topic_id: i64,
    pub name: String,
    pub description: String,
    pub updated: PrimitiveDateTime,
    pub created: PrimitiveDateTime,
    pub topic_name: String,
    pub host_username: String,
    pub participant_count: i64,
}

/// A user who has posted in a room
#[derive(Debug, Clone, FromRow)]
pub struct Participant {
    pub id: i64,
    pub username: String,
    pub name: String,
}

/// Topic, name and description as submitted by the host
#[derive(Debug, Clone)]
pub struct RoomFields {
    /// Free text, resolved to an existing topic or a new one
    pub topic: String,
    pub name: String,
    pub description: String,
}

macro_rules! room_query {
    ($tail:literal) => {
        concat!(
            "SELECT
                rooms.id, rooms.host_id, rooms.topic_id, rooms.name, rooms.description,
                rooms.updated, rooms.created,
                topics.name AS topic_name,
                users.username AS host_username,
                (SELECT COUNT(*) FROM room_participants p WHERE p.room_id = rooms.id)
                    AS participant_count
            FROM rooms
                INNER JOIN topics ON topics.id = rooms.topic_id
                INNER JOIN users ON users.id = rooms.host_id ",
            $tail
        )
    };
}

pub async fn by_id(db_pool: &SqlitePool, room_id: i64) -> Result<Room> {
    sqlx::query_as(room_query!("WHERE rooms.id = ?"))
        .bind(room_id)
        .fetch_one(db_pool)
        .await
        .map_err(|e| e.not_found_or("room"))
}

/// Rooms whose topic name, name or description contains `query`, ignoring case.
/// An empty query matches every room.
pub async fn search(db_pool: &SqlitePool, query: &str) -> Result<Vec<Room>> {
    let pattern = like_pattern(query);

    let rooms = sqlx::query_as(room_query!(
        "WHERE topics.name LIKE ? ESCAPE '\\'
            OR rooms.name LIKE ? ESCAPE '\\'
            OR rooms.description LIKE ? ESCAPE '\\'
        ORDER BY rooms.updated DESC, rooms.id DESC"
    ))
    .bind(&pattern)
    .bind(&pattern)
    .bind(&pattern)
    .fetch_all(db_pool)
    .await?;

    Ok(rooms)
}

pub async fn by_host(db_pool: &SqlitePool, user_id: i64) -> Result<Vec<Room>> {
    let rooms = sqlx::query_as(room_query!(
        "WHERE rooms.host_id = ? ORDER BY rooms.updated DESC, rooms.id DESC"
    ))
    .bind(user_id)
    .fetch_all(db_pool)
    .await?;

    Ok(rooms)
}

/// Users who have posted in the room, in the order they joined.
pub async fn participants(db_pool: &SqlitePool, room_id: i64) -> Result<Vec<Participant>> {
    let participants = sqlx::query_as(
        "SELECT users.id, users.username, users.name
        FROM room_participants
            INNER JOIN users ON users.id = room_participants.user_id
        WHERE room_participants.room_id = ?
        ORDER BY room_participants.rowid",
    )
    .bind(room_id)
    .fetch_all(db_pool)
    .await?;

    Ok(participants)
}

/// Creates a room hosted by `host_id`, creating its topic if needed.
pub async fn create(db_pool: &SqlitePool, host_id: i64, fields: RoomFields) -> Result<Room> {
    let mut tx = db_pool.begin().await?;

    let topic_id = topics::get_or_create(&mut tx, &fields.topic).await?;

    let (room_id,): (i64,) = sqlx::query_as(
        "INSERT INTO rooms (host_id, topic_id, name, description) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(host_id)
    .bind(topic_id)
    .bind(&fields.name)
    .bind(&fields.description)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    by_id(db_pool, room_id).await
}

/// Rewrites a room's topic, name and description. Host, messages and
/// participants are left alone.
pub async fn update(db_pool: &SqlitePool, room_id: i64, fields: RoomFields) -> Result<Room> {
    let mut tx = db_pool.begin().await?;

    let topic_id = topics::get_or_create(&mut tx, &fields.topic).await?;

    let result = sqlx::query(
        "UPDATE rooms SET topic_id = ?, name = ?, description = ?, updated = CURRENT_TIMESTAMP
        WHERE id = ?",
    )
    .bind(topic_id)
    .bind(&fields.name)
    .bind(&fields.description)
    .bind(room_id)
    .execute(&mut *tx)
    .await?;

    // Dropping the transaction rolls back the topic insert too
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound { resource: "room" });
    }

    tx.commit().await?;

    by_id(db_pool, room_id).await
}

/// Deletes a room. Its messages and participant rows go with it.
pub async fn delete(db_pool: &SqlitePool, room_id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM rooms WHERE id = ?")
        .bind(room_id)
        .execute(db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound { resource: "room" });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{connect_in_memory, messages, users};

    async fn user(db_pool: &SqlitePool, username: &str) -> i64 {
        users::create(
            db_pool,
            users::NewUser {
                username: username.to_owned(),
                password: "hash".to_owned(),
                name: username.to_owned(),
            },
        )
        .await
        .unwrap()
        .id
    }

    fn fields(topic: &str, name: &str, description: &str) -> RoomFields {
        RoomFields {
            topic: topic.to_owned(),
            name: name.to_owned(),
            description: description.to_owned(),
        }
    }

    fn names(rooms: Vec<Room>) -> Vec<String> {
        let mut names: Vec<_> = rooms.into_iter().map(|r| r.name).collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn create_reuses_topics_by_name() {
        let db_pool = connect_in_memory().await.unwrap();
        let alice = user(&db_pool, "alice").await;

        let go = create(&db_pool, alice, fields("Programming", "Lets Learn Go", ""))
            .await
            .unwrap();
        let rust = create(&db_pool, alice, fields("Programming", "Rust", ""))
            .await
            .unwrap();

        assert_eq!(go.topic_id, rust.topic_id);
        assert_eq!(go.host_id, alice);
        assert_eq!(go.host_username, "alice");
        assert_eq!(go.topic_name, "Programming");
    }

    #[tokio::test]
    async fn search_is_a_case_insensitive_or_over_three_fields() {
        let db_pool = connect_in_memory().await.unwrap();
        let alice = user(&db_pool, "alice").await;

        create(&db_pool, alice, fields("Programming", "Lets Learn Go", "gophers welcome"))
            .await
            .unwrap();
        create(&db_pool, alice, fields("Design", "Figma tips", "layout and colour"))
            .await
            .unwrap();
        create(&db_pool, alice, fields("Music", "Jam night", "bring a programming playlist"))
            .await
            .unwrap();

        assert_eq!(names(search(&db_pool, "go").await.unwrap()), ["Lets Learn Go"]);
        assert_eq!(
            names(search(&db_pool, "PROGRAMMING").await.unwrap()),
            ["Jam night", "Lets Learn Go"]
        );
        assert_eq!(names(search(&db_pool, "figma").await.unwrap()), ["Figma tips"]);
        assert_eq!(names(search(&db_pool, "colour").await.unwrap()), ["Figma tips"]);
        assert_eq!(search(&db_pool, "").await.unwrap().len(), 3);
        assert!(search(&db_pool, "%").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_keeps_host_messages_and_participants() {
        let db_pool = connect_in_memory().await.unwrap();
        let alice = user(&db_pool, "alice").await;
        let bob = user(&db_pool, "bob").await;

        let room = create(&db_pool, alice, fields("Programming", "Go", ""))
            .await
            .unwrap();
        messages::post(&db_pool, room.id, bob, "hi").await.unwrap();

        let updated = update(&db_pool, room.id, fields("Golang", "Go again", "new"))
            .await
            .unwrap();

        assert_eq!(updated.host_id, alice);
        assert_eq!(updated.topic_name, "Golang");
        assert_eq!(updated.name, "Go again");
        assert_eq!(updated.participant_count, 1);
        assert_eq!(messages::in_room(&db_pool, room.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_of_missing_room_leaves_no_topic_behind() {
        let db_pool = connect_in_memory().await.unwrap();

        let result = update(&db_pool, 99, fields("Orphan", "x", "")).await;

        assert!(matches!(result, Err(DbError::NotFound { resource: "room" })));
        assert!(topics::list(&db_pool, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_cascades_to_messages_and_participants() {
        let db_pool = connect_in_memory().await.unwrap();
        let alice = user(&db_pool, "alice").await;
        let bob = user(&db_pool, "bob").await;

        let room = create(&db_pool, alice, fields("Programming", "Go", ""))
            .await
            .unwrap();
        let keep = create(&db_pool, alice, fields("Programming", "Rust", ""))
            .await
            .unwrap();
        messages::post(&db_pool, room.id, bob, "one").await.unwrap();
        messages::post(&db_pool, room.id, alice, "two").await.unwrap();
        messages::post(&db_pool, keep.id, bob, "elsewhere").await.unwrap();

        delete(&db_pool, room.id).await.unwrap();

        let (orphans,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages WHERE room_id = ?")
            .bind(room.id)
            .fetch_one(&db_pool)
            .await
            .unwrap();
        let (members,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM room_participants WHERE room_id = ?")
                .bind(room.id)
                .fetch_one(&db_pool)
                .await
                .unwrap();

        assert_eq!(orphans, 0);
        assert_eq!(members, 0);
        assert!(matches!(by_id(&db_pool, room.id).await, Err(DbError::NotFound { .. })));
        assert_eq!(messages::all(&db_pool).await.unwrap().len(), 1);
    }
}
