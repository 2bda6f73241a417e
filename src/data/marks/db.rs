use bson::doc;
use mongodb::Database;
use uuid::Uuid;

use crate::data::account::db::{require_student, require_teacher};
use crate::data::{collect, filter};
use crate::error::StoreError;

use super::{StudentMarks, MARKS_COLLECTION_NAME};

pub trait MarksDbExt {
    async fn award_marks(&self, marks: StudentMarks) -> Result<StudentMarks, StoreError>;

    async fn marks_of_student(&self, student: Uuid) -> Result<Vec<StudentMarks>, StoreError>;
    async fn marks_given_by(&self, teacher: Uuid) -> Result<Vec<StudentMarks>, StoreError>;

    async fn update_marks(
        &self,
        id: Uuid,
        marks_obtained: i64,
        maximum_marks: i64,
    ) -> Result<Option<StudentMarks>, StoreError>;

    async fn delete_marks(&self, id: Uuid) -> Result<bool, StoreError>;
}

// Awarding more than the maximum is not rejected, only logged, so the
// anomaly stays visible without turning it into a write error.
fn warn_above_maximum(marks: &StudentMarks) {
    if marks.marks_obtained > marks.maximum_marks {
        tracing::warn!(
            "Marks {}/{} awarded in '{}' exceed the maximum.",
            marks.marks_obtained,
            marks.maximum_marks,
            marks.subject_name
        );
    }
}

impl MarksDbExt for Database {
    #[tracing::instrument(skip(self))]
    async fn award_marks(&self, marks: StudentMarks) -> Result<StudentMarks, StoreError> {
        require_teacher(self, marks.teacher).await?;
        require_student(self, marks.student).await?;

        if marks.subject_name.trim().is_empty() {
            return Err(StoreError::validation("Subject name is required."));
        }

        warn_above_maximum(&marks);

        self.collection(MARKS_COLLECTION_NAME)
            .insert_one(
                bson::to_document(&marks).expect("StudentMarks must be serializable to BSON"),
                None,
            )
            .await?;

        Ok(marks)
    }

    async fn marks_of_student(&self, student: Uuid) -> Result<Vec<StudentMarks>, StoreError> {
        let documents = self
            .collection(MARKS_COLLECTION_NAME)
            .find(doc! { "student": filter::uuid_bson(student) }, None)
            .await?;

        Ok(collect(documents, "StudentMarks").await)
    }

    async fn marks_given_by(&self, teacher: Uuid) -> Result<Vec<StudentMarks>, StoreError> {
        let documents = self
            .collection(MARKS_COLLECTION_NAME)
            .find(doc! { "teacher": filter::uuid_bson(teacher) }, None)
            .await?;

        Ok(collect(documents, "StudentMarks").await)
    }

    async fn update_marks(
        &self,
        id: Uuid,
        marks_obtained: i64,
        maximum_marks: i64,
    ) -> Result<Option<StudentMarks>, StoreError> {
        let mut marks = match self
            .collection::<StudentMarks>(MARKS_COLLECTION_NAME)
            .find_one(filter::by_id(id), None)
            .await?
        {
            Some(marks) => marks,
            None => return Ok(None),
        };

        marks.marks_obtained = marks_obtained;
        marks.maximum_marks = maximum_marks;
        warn_above_maximum(&marks);

        self.collection::<StudentMarks>(MARKS_COLLECTION_NAME)
            .update_one(
                filter::by_id(id),
                doc! { "$set": {
                    "marks_obtained": marks_obtained,
                    "maximum_marks": maximum_marks,
                } },
                None,
            )
            .await?;

        Ok(Some(marks))
    }

    async fn delete_marks(&self, id: Uuid) -> Result<bool, StoreError> {
        let removed = self
            .collection::<StudentMarks>(MARKS_COLLECTION_NAME)
            .delete_one(filter::by_id(id), None)
            .await?;

        Ok(removed.deleted_count > 0)
    }
}
