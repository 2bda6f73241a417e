use bson::doc;
use mongodb::options::FindOptions;
use mongodb::Database;
use uuid::Uuid;

use crate::data::account::db::require_teacher;
use crate::data::class::db::EnrollmentDbExt;
use crate::data::{collect, filter};
use crate::error::StoreError;

use super::{ClassNotice, NOTICE_COLLECTION_NAME};

fn newest_first() -> FindOptions {
    FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .build()
}

pub trait NoticeDbExt {
    /// Posts a notice to everyone currently in the teacher's class. A
    /// teacher can't post the exact same text twice; the `(teacher,
    /// message)` unique index rejects it.
    async fn post_notice(
        &self,
        teacher: Uuid,
        message: impl ToString + Send,
    ) -> Result<ClassNotice, StoreError>;

    async fn notices_for_student(&self, student: Uuid) -> Result<Vec<ClassNotice>, StoreError>;
    async fn notices_by_teacher(&self, teacher: Uuid) -> Result<Vec<ClassNotice>, StoreError>;

    /// Rewrites a notice. Recipients stay as posted; HTML and timestamp are
    /// refreshed.
    async fn edit_notice(
        &self,
        id: Uuid,
        message: impl ToString + Send,
    ) -> Result<Option<ClassNotice>, StoreError>;

    async fn delete_notice(&self, id: Uuid) -> Result<bool, StoreError>;
}

impl NoticeDbExt for Database {
    async fn post_notice(
        &self,
        teacher: Uuid,
        message: impl ToString + Send,
    ) -> Result<ClassNotice, StoreError> {
        require_teacher(self, teacher).await?;

        let students = self
            .class_roster(teacher)
            .await?
            .iter()
            .map(|account| account.id)
            .collect();

        let notice = ClassNotice::post(teacher, students, message);

        self.collection(NOTICE_COLLECTION_NAME)
            .insert_one(
                bson::to_document(&notice).expect("ClassNotice must be serializable to BSON"),
                None,
            )
            .await
            .map_err(|e| {
                StoreError::write_conflict(
                    e,
                    "notice",
                    "Teacher already posted a notice with this exact text.",
                )
            })?;

        Ok(notice)
    }

    async fn notices_for_student(&self, student: Uuid) -> Result<Vec<ClassNotice>, StoreError> {
        let documents = self
            .collection(NOTICE_COLLECTION_NAME)
            .find(doc! { "students": filter::uuid_bson(student) }, newest_first())
            .await?;

        Ok(collect(documents, "ClassNotice").await)
    }

    async fn notices_by_teacher(&self, teacher: Uuid) -> Result<Vec<ClassNotice>, StoreError> {
        let documents = self
            .collection(NOTICE_COLLECTION_NAME)
            .find(doc! { "teacher": filter::uuid_bson(teacher) }, newest_first())
            .await?;

        Ok(collect(documents, "ClassNotice").await)
    }

    async fn edit_notice(
        &self,
        id: Uuid,
        message: impl ToString + Send,
    ) -> Result<Option<ClassNotice>, StoreError> {
        let mut existing = match self
            .collection::<ClassNotice>(NOTICE_COLLECTION_NAME)
            .find_one(filter::by_id(id), None)
            .await?
        {
            Some(existing) => existing,
            None => return Ok(None),
        };

        existing.set_message(message);

        self.collection::<ClassNotice>(NOTICE_COLLECTION_NAME)
            .replace_one(filter::by_id(id), &existing, None)
            .await
            .map_err(|e| {
                StoreError::write_conflict(
                    e,
                    "notice",
                    "Teacher already posted a notice with this exact text.",
                )
            })?;

        Ok(Some(existing))
    }

    async fn delete_notice(&self, id: Uuid) -> Result<bool, StoreError> {
        let removed = self
            .collection::<ClassNotice>(NOTICE_COLLECTION_NAME)
            .delete_one(filter::by_id(id), None)
            .await?;

        Ok(removed.deleted_count > 0)
    }
}

///////////////////////
//       TESTS
///////////////////////

#[cfg(test)]
mod notice_store {
    use super::NoticeDbExt;
    use crate::data::account::db::AccountDbExt;
    use crate::data::class::db::EnrollmentDbExt;
    use crate::data::testing;
    use crate::error::StoreError;

    #[tokio::test]
    #[ignore = "requires a running MongoDB"]
    async fn notice_reaches_the_roster_with_rendered_markdown() {
        let db = testing::database().await;

        let teacher =
            testing::fresh_account(&db, testing::teacher_data("notice_html_teacher")).await;
        let student =
            testing::fresh_account(&db, testing::student_data("notice_html_student", "8")).await;
        db.enroll(teacher.id, student.id)
            .await
            .expect("unable to enroll test student");

        let posted = db
            .post_notice(teacher.id, "**Hello** class")
            .await
            .expect("unable to post test notice");
        assert_eq!(posted.message_html, "<p><strong>Hello</strong> class</p>");
        assert!(posted.students.contains(&student.id));

        let received = db
            .notices_for_student(student.id)
            .await
            .expect("unable to list test notices");
        assert_eq!(received[0].id, posted.id);
        assert_eq!(received[0].message_html, "<p><strong>Hello</strong> class</p>");

        for id in [teacher.id, student.id] {
            db.delete_account(id)
                .await
                .expect("unable to delete test account");
        }
    }

    #[tokio::test]
    #[ignore = "requires a running MongoDB"]
    async fn reposting_the_same_text_is_rejected() {
        let db = testing::database().await;

        let teacher =
            testing::fresh_account(&db, testing::teacher_data("notice_dup_teacher")).await;

        db.post_notice(teacher.id, "bring your lab coats")
            .await
            .expect("first notice must succeed");

        let rejected = db.post_notice(teacher.id, "bring your lab coats").await;
        assert!(matches!(
            rejected,
            Err(StoreError::Duplicate { what: "notice", .. })
        ));

        db.delete_account(teacher.id)
            .await
            .expect("unable to delete test teacher");
    }
}
