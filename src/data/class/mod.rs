use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod db;

pub static ENROLLMENT_COLLECTION_NAME: &str = "enrollments";

/// One student sitting in one teacher's class. The `(teacher, student)`
/// pair carries a unique index, so a student enrolls under a given teacher
/// at most once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    #[serde(
        default = "Uuid::new_v4",
        rename = "_id",
        with = "bson::serde_helpers::uuid_1_as_binary"
    )]
    pub id: Uuid,
    #[serde(with = "bson::serde_helpers::uuid_1_as_binary")]
    pub teacher: Uuid,
    #[serde(with = "bson::serde_helpers::uuid_1_as_binary")]
    pub student: Uuid,
}

impl Enrollment {
    pub fn new(teacher: Uuid, student: Uuid) -> Enrollment {
        Enrollment {
            id: Uuid::new_v4(),
            teacher,
            student,
        }
    }
}
