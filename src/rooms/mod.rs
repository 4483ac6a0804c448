mod delete;
mod edit;
mod msg;
mod new;
mod room;

pub(crate) use msg::activity_html;

use axum::{Router, routing::get};
use serde::Deserialize;
use validator::Validate;

use crate::{
    AppResult, AppState,
    db::{Room, Topic, rooms::RoomFields},
    include_res, res,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/new", get(new::new_room_page).post(new::new_room))
        .route("/{id}", get(room::room).post(room::post_message))
        .route("/{id}/edit", get(edit::edit_room_page).post(edit::edit_room))
        .route("/{id}/delete", get(delete::delete_room_page).post(delete::delete_room))
}

/// Mounted under `/messages`.
pub fn message_router() -> Router<AppState> {
    Router::new().route(
        "/{id}/delete",
        get(msg::delete_message_page).post(msg::delete_message),
    )
}

#[derive(Debug, Default, Deserialize, Validate)]
pub(crate) struct RoomForm {
    #[validate(length(min = 1, max = 200, message = "Pick or type a topic."))]
    topic: String,
    #[validate(length(min = 1, max = 200, message = "Room name must be 1 to 200 characters."))]
    name: String,
    #[serde(default)]
    description: String,
}

impl RoomForm {
    /// Trimmed fields, once they pass validation.
    fn fields(&self) -> AppResult<RoomFields> {
        let trimmed = RoomForm {
            topic: self.topic.trim().to_owned(),
            name: self.name.trim().to_owned(),
            description: self.description.trim().to_owned(),
        };
        trimmed.validate()?;

        Ok(RoomFields {
            topic: trimmed.topic,
            name: trimmed.name,
            description: trimmed.description,
        })
    }
}

impl From<&Room> for RoomForm {
    fn from(room: &Room) -> Self {
        RoomForm {
            topic: room.topic_name.clone(),
            name: room.name.clone(),
            description: room.description.clone(),
        }
    }
}

/// Create and edit share one form; `action` is where it posts.
pub(crate) fn room_form_html(
    heading: &str,
    action: &str,
    form: &RoomForm,
    topics: &[Topic],
    error: Option<&str>,
) -> String {
    let topic_options: String = topics
        .iter()
        .map(|topic| format!(r#"            <option value="{}">"#, res::esc(&topic.name)))
        .collect::<Vec<_>>()
        .join("\n");

    res::fill(
        include_res!(str, "/pages/room_form.html"),
        &[
            ("heading", heading),
            ("error", &res::error_note(error)),
            ("action", action),
            ("topic", &res::esc(&form.topic)),
            ("topic_options", &topic_options),
            ("name", &res::esc(&form.name)),
            ("description", &res::esc(&form.description)),
            ("cancel", "/"),
            ("submit", heading),
        ],
    )
}

pub(crate) fn room_item_html(room: &Room) -> String {
    res::fill(
        include_res!(str, "/pages/room_item.html"),
        &[
            ("id", &room.id.to_string()),
            ("host_id", &room.host_id.to_string()),
            ("host_username", &res::esc(&room.host_username)),
            ("updated", &res::ago(room.updated)),
            ("name", &res::esc(&room.name)),
            ("participant_count", &room.participant_count.to_string()),
            ("topic_name", &res::esc(&room.topic_name)),
        ],
    )
}

pub(crate) fn confirm_delete_html(action: &str, cancel: &str, what: &str) -> String {
    res::fill(
        include_res!(str, "/pages/delete.html"),
        &[
            ("action", action),
            ("cancel", cancel),
            ("what", &res::esc(what)),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_form_trims_and_requires_fields() {
        let form = RoomForm {
            topic: "  Programming ".to_owned(),
            name: " Lets Learn Go".to_owned(),
            description: String::new(),
        };
        let fields = form.fields().unwrap();
        assert_eq!(fields.topic, "Programming");
        assert_eq!(fields.name, "Lets Learn Go");

        let blank = RoomForm {
            topic: "   ".to_owned(),
            name: "x".to_owned(),
            description: String::new(),
        };
        assert!(matches!(blank.fields(), Err(crate::AppError::Validation(_))));
    }

    #[test]
    fn form_values_are_escaped() {
        let form = RoomForm {
            topic: r#""><script>"#.to_owned(),
            ..Default::default()
        };
        let html = room_form_html("Create Room", "/rooms/new", &form, &[], None);
        assert!(!html.contains("<script>"));
    }
}
