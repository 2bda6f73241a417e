use bson::doc;
use mongodb::options::FindOptions;
use mongodb::Database;
use uuid::Uuid;

use crate::data::account::db::{require_student, require_teacher};
use crate::data::{collect, filter};
use crate::error::StoreError;

use super::{MessageToTeacher, MESSAGE_COLLECTION_NAME};

fn newest_first() -> FindOptions {
    FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .build()
}

pub trait MessageDbExt {
    /// Sends a message from a student to a teacher. Repeating the exact
    /// same text to anyone is rejected by the `(student, message)` unique
    /// index.
    async fn send_message(
        &self,
        student: Uuid,
        teacher: Uuid,
        message: impl ToString + Send,
    ) -> Result<MessageToTeacher, StoreError>;

    async fn messages_for_teacher(
        &self,
        teacher: Uuid,
    ) -> Result<Vec<MessageToTeacher>, StoreError>;
    async fn messages_from_student(
        &self,
        student: Uuid,
    ) -> Result<Vec<MessageToTeacher>, StoreError>;

    /// Rewrites a message's text. The stored HTML is re-derived and
    /// `created_at` moves to the edit time.
    async fn edit_message(
        &self,
        id: Uuid,
        message: impl ToString + Send,
    ) -> Result<Option<MessageToTeacher>, StoreError>;

    async fn delete_message(&self, id: Uuid) -> Result<bool, StoreError>;
}

impl MessageDbExt for Database {
    async fn send_message(
        &self,
        student: Uuid,
        teacher: Uuid,
        message: impl ToString + Send,
    ) -> Result<MessageToTeacher, StoreError> {
        require_student(self, student).await?;
        require_teacher(self, teacher).await?;

        let message = MessageToTeacher::compose(student, teacher, message);

        self.collection(MESSAGE_COLLECTION_NAME)
            .insert_one(
                bson::to_document(&message)
                    .expect("MessageToTeacher must be serializable to BSON"),
                None,
            )
            .await
            .map_err(|e| {
                StoreError::write_conflict(
                    e,
                    "message",
                    "Student already sent a message with this exact text.",
                )
            })?;

        Ok(message)
    }

    async fn messages_for_teacher(
        &self,
        teacher: Uuid,
    ) -> Result<Vec<MessageToTeacher>, StoreError> {
        let documents = self
            .collection(MESSAGE_COLLECTION_NAME)
            .find(doc! { "teacher": filter::uuid_bson(teacher) }, newest_first())
            .await?;

        Ok(collect(documents, "MessageToTeacher").await)
    }

    async fn messages_from_student(
        &self,
        student: Uuid,
    ) -> Result<Vec<MessageToTeacher>, StoreError> {
        let documents = self
            .collection(MESSAGE_COLLECTION_NAME)
            .find(doc! { "student": filter::uuid_bson(student) }, newest_first())
            .await?;

        Ok(collect(documents, "MessageToTeacher").await)
    }

    async fn edit_message(
        &self,
        id: Uuid,
        message: impl ToString + Send,
    ) -> Result<Option<MessageToTeacher>, StoreError> {
        let mut existing = match self
            .collection::<MessageToTeacher>(MESSAGE_COLLECTION_NAME)
            .find_one(filter::by_id(id), None)
            .await?
        {
            Some(existing) => existing,
            None => return Ok(None),
        };

        existing.set_message(message);

        self.collection::<MessageToTeacher>(MESSAGE_COLLECTION_NAME)
            .replace_one(filter::by_id(id), &existing, None)
            .await
            .map_err(|e| {
                StoreError::write_conflict(
                    e,
                    "message",
                    "Student already sent a message with this exact text.",
                )
            })?;

        Ok(Some(existing))
    }

    async fn delete_message(&self, id: Uuid) -> Result<bool, StoreError> {
        let removed = self
            .collection::<MessageToTeacher>(MESSAGE_COLLECTION_NAME)
            .delete_one(filter::by_id(id), None)
            .await?;

        Ok(removed.deleted_count > 0)
    }
}

///////////////////////
//       TESTS
///////////////////////
