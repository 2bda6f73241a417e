use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::markdown;

pub mod db;

pub static NOTICE_COLLECTION_NAME: &str = "notices";

/// A notice a teacher posts to the students of their class.
///
/// Like messages, `message_html` is derived and `created_at` tracks the
/// latest write, not the first one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassNotice {
    #[serde(
        default = "Uuid::new_v4",
        rename = "_id",
        with = "bson::serde_helpers::uuid_1_as_binary"
    )]
    pub id: Uuid,
    #[serde(with = "bson::serde_helpers::uuid_1_as_binary")]
    pub teacher: Uuid,
    /// Recipients, frozen to the roster at post time.
    #[serde(default, with = "crate::data::uuid_vec")]
    pub students: Vec<Uuid>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    pub message: String,
    pub message_html: String,
}

impl ClassNotice {
    pub fn post(teacher: Uuid, students: Vec<Uuid>, message: impl ToString) -> ClassNotice {
        let mut notice = ClassNotice {
            id: Uuid::new_v4(),
            teacher,
            students,
            created_at: Utc::now(),
            message: String::new(),
            message_html: String::new(),
        };
        notice.set_message(message);
        notice
    }

    pub fn set_message(&mut self, message: impl ToString) {
        self.message = message.to_string();
        self.message_html = markdown::render(&self.message);
        self.created_at = Utc::now();
    }
}

impl std::fmt::Display for ClassNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

///////////////////////
//       TESTS
///////////////////////

#[cfg(test)]
mod notice_model {
    use super::*;

    #[test]
    fn posted_notice_stores_rendered_markdown() {
        let notice = ClassNotice::post(Uuid::new_v4(), vec![], "**Hello** class");

        assert_eq!(notice.message, "**Hello** class");
        assert_eq!(notice.message_html, "<p><strong>Hello</strong> class</p>");
    }

    #[test]
    fn edits_re_render_and_refresh_the_timestamp() {
        let mut notice =
            ClassNotice::post(Uuid::new_v4(), vec![Uuid::new_v4()], "test on *Friday*");
        let posted_at = notice.created_at;

        notice.set_message("test moved to *Monday*");

        assert_eq!(
            notice.message_html,
            "<p>test moved to <em>Monday</em></p>"
        );
        assert!(notice.created_at >= posted_at);
    }
}
