use uuid::Uuid;

pub mod db;

pub static MARKS_COLLECTION_NAME: &str = "marks";

/// Marks a teacher has awarded a student in one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentMarks {
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
    pub subject_name: String,
    pub marks_obtained: i64,
    pub maximum_marks: i64,
}

impl StudentMarks {
    pub fn new(
        teacher: Uuid,
        student: Uuid,
        subject_name: impl ToString,
        marks_obtained: i64,
        maximum_marks: i64,
    ) -> StudentMarks {
        StudentMarks {
            id: Uuid::new_v4(),
            teacher,
            student,
            subject_name: subject_name.to_string(),
            marks_obtained,
            maximum_marks,
        }
    }
}

impl std::fmt::Display for StudentMarks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.subject_name)
    }
}
