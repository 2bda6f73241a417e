use chrono::{DateTime, Utc};
use uuid::Uuid;

pub mod db;

pub static ASSIGNMENT_COLLECTION_NAME: &str = "assignments";
pub static SUBMISSION_COLLECTION_NAME: &str = "assignments.submissions";

/// Work a teacher hands out to their class. `file` is a path reference into
/// the media root; the file contents live outside the schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassAssignment {
    #[serde(
        default = "Uuid::new_v4",
        rename = "_id",
        with = "bson::serde_helpers::uuid_1_as_binary"
    )]
    pub id: Uuid,
    #[serde(with = "bson::serde_helpers::uuid_1_as_binary")]
    pub teacher: Uuid,
    #[serde(default, with = "crate::data::uuid_vec")]
    pub students: Vec<Uuid>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    pub assignment_name: String,
    pub file: String,
}

impl ClassAssignment {
    pub fn new(
        teacher: Uuid,
        students: Vec<Uuid>,
        assignment_name: impl ToString,
        file: impl ToString,
    ) -> ClassAssignment {
        ClassAssignment {
            id: Uuid::new_v4(),
            teacher,
            students,
            created_at: Utc::now(),
            assignment_name: assignment_name.to_string(),
            file: file.to_string(),
        }
    }
}

impl std::fmt::Display for ClassAssignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.assignment_name)
    }
}

/// A student's uploaded answer to one assignment, tagged with the teacher
/// who set it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitAssignment {
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
    #[serde(with = "bson::serde_helpers::uuid_1_as_binary")]
    pub assignment: Uuid,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    pub file: String,
}

impl SubmitAssignment {
    pub fn new(student: Uuid, assignment: &ClassAssignment, file: impl ToString) -> SubmitAssignment {
        SubmitAssignment {
            id: Uuid::new_v4(),
            student,
            teacher: assignment.teacher,
            assignment: assignment.id,
            created_at: Utc::now(),
            file: file.to_string(),
        }
    }
}
