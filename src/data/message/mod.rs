use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::markdown;

pub mod db;

pub static MESSAGE_COLLECTION_NAME: &str = "messages";

/// A private message from a student to one of their teachers.
///
/// `message_html` is derived from `message` and never set directly; both it
/// and `created_at` are refreshed on every write, so `created_at` reads as
/// "last modified".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageToTeacher {
    #[serde(
        default = "Uuid::new_v4",
        rename = "_id",
        with = "bson::serde_helpers::uuid_1_as_binary"
    )]
    pub id: Uuid,
    #[serde(with = "bson::serde_helpers::uuid_1_as_binary")]
    pub student: Uuid,
    #[serde(with = "bson::serde_helpers::uuid_1_as_binary")]
    pub teacher: Uuid,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    pub message: String,
    pub message_html: String,
}

impl MessageToTeacher {
    pub fn compose(student: Uuid, teacher: Uuid, message: impl ToString) -> MessageToTeacher {
        let mut composed = MessageToTeacher {
            id: Uuid::new_v4(),
            student,
            teacher,
            created_at: Utc::now(),
            message: String::new(),
            message_html: String::new(),
        };
        composed.set_message(message);
        composed
    }

    /// The only way `message` changes: rendering and timestamp move with it.
    pub fn set_message(&mut self, message: impl ToString) {
        self.message = message.to_string();
        self.message_html = markdown::render(&self.message);
        self.created_at = Utc::now();
    }
}

impl std::fmt::Display for MessageToTeacher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

///////////////////////
//       TESTS
///////////////////////

#[cfg(test)]
mod message_model {
    use super::*;

    #[test]
    fn html_is_derived_on_compose() {
        let message = MessageToTeacher::compose(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "could you share the **notes**?",
        );

        assert_eq!(
            message.message_html,
            "<p>could you share the <strong>notes</strong>?</p>"
        );
    }

    #[test]
    fn html_follows_every_edit() {
        let mut message =
            MessageToTeacher::compose(Uuid::new_v4(), Uuid::new_v4(), "first draft");
        message.set_message("# second draft");

        assert_eq!(message.message, "# second draft");
        assert_eq!(message.message_html, "<h1>second draft</h1>");
    }

    #[test]
    fn edits_refresh_the_timestamp() {
        let mut message =
            MessageToTeacher::compose(Uuid::new_v4(), Uuid::new_v4(), "first draft");
        let composed_at = message.created_at;

        message.set_message("second draft");

        assert!(message.created_at >= composed_at);
    }
}
