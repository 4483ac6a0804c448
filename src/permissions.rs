//! Ownership checks. Rooms belong to their host and messages to their author;
//! only the owner may change or delete them.

use crate::{
    AppError, AppResult,
    db::{Message, Room, User},
};

/// Something with exactly one user allowed to mutate it
pub trait Owned {
    fn owner_id(&self) -> i64;

    /// Used in logs
    fn kind(&self) -> &'static str;

    fn id(&self) -> i64;
}

impl Owned for Room {
    fn owner_id(&self) -> i64 {
        self.host_id
    }

    fn kind(&self) -> &'static str {
        "room"
    }

    fn id(&self) -> i64 {
        self.id
    }
}

impl Owned for Message {
    fn owner_id(&self) -> i64 {
        self.user_id
    }

    fn kind(&self) -> &'static str {
        "message"
    }

    fn id(&self) -> i64 {
        self.id
    }
}

/// Fails with [AppError::Forbidden] unless `user` owns `resource`.
pub fn ensure_owner<R: Owned>(resource: &R, user: &User) -> AppResult<()> {
    if resource.owner_id() == user.id {
        return Ok(());
    }

    tracing::warn!(
        "user {} denied access to {} {} owned by {}",
        user.id,
        resource.kind(),
        resource.id(),
        resource.owner_id()
    );
    Err(AppError::Forbidden)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Note {
        owner: i64,
    }

    impl Owned for Note {
        fn owner_id(&self) -> i64 {
            self.owner
        }

        fn kind(&self) -> &'static str {
            "note"
        }

        fn id(&self) -> i64 {
            1
        }
    }

    fn user(id: i64) -> User {
        User {
            id,
            username: format!("user{id}"),
            password: String::new(),
            name: String::new(),
            email: String::new(),
            bio: String::new(),
            date_joined: time::PrimitiveDateTime::MIN,
        }
    }

    #[test]
    fn owner_passes() {
        assert!(ensure_owner(&Note { owner: 3 }, &user(3)).is_ok());
    }

    #[test]
    fn anyone_else_is_forbidden() {
        assert!(matches!(
            ensure_owner(&Note { owner: 3 }, &user(4)),
            Err(AppError::Forbidden)
        ));
    }
}
