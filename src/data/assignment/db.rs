use bson::doc;
use mongodb::options::FindOptions;
use mongodb::Database;
use uuid::Uuid;

use crate::data::account::db::{require_student, require_teacher};
use crate::data::class::db::EnrollmentDbExt;
use crate::data::{collect, filter};
use crate::error::StoreError;

use super::{
    ClassAssignment, SubmitAssignment, ASSIGNMENT_COLLECTION_NAME, SUBMISSION_COLLECTION_NAME,
};

pub mod reject {
    use crate::error::StoreError;
    use uuid::Uuid;

    #[inline]
    pub fn missing_assignment(id: Uuid) -> StoreError {
        StoreError::MissingParent {
            what: "assignment",
            id,
        }
    }
}

fn newest_first() -> FindOptions {
    FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .build()
}

pub trait AssignmentDbExt {
    /// Hands an assignment out to everyone currently in the teacher's class.
    async fn post_assignment(
        &self,
        teacher: Uuid,
        assignment_name: impl ToString + Send,
        file: impl ToString + Send,
    ) -> Result<ClassAssignment, StoreError>;

    async fn assignment(&self, id: Uuid) -> Result<Option<ClassAssignment>, StoreError>;
    async fn assignments_for_student(
        &self,
        student: Uuid,
    ) -> Result<Vec<ClassAssignment>, StoreError>;
    async fn assignments_by_teacher(
        &self,
        teacher: Uuid,
    ) -> Result<Vec<ClassAssignment>, StoreError>;

    /// Deletes an assignment along with every submission made against it.
    async fn delete_assignment(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Records a student's submission against an existing assignment.
    async fn submit_assignment(
        &self,
        student: Uuid,
        assignment: Uuid,
        file: impl ToString + Send,
    ) -> Result<SubmitAssignment, StoreError>;

    async fn submissions_for_assignment(
        &self,
        assignment: Uuid,
    ) -> Result<Vec<SubmitAssignment>, StoreError>;
    async fn submissions_for_teacher(
        &self,
        teacher: Uuid,
    ) -> Result<Vec<SubmitAssignment>, StoreError>;

    async fn delete_submission(&self, id: Uuid) -> Result<bool, StoreError>;
}

impl AssignmentDbExt for Database {
    #[tracing::instrument(skip(self, assignment_name, file))]
    async fn post_assignment(
        &self,
        teacher: Uuid,
        assignment_name: impl ToString + Send,
        file: impl ToString + Send,
    ) -> Result<ClassAssignment, StoreError> {
        require_teacher(self, teacher).await?;

        let assignment_name = assignment_name.to_string();
        if assignment_name.trim().is_empty() {
            return Err(StoreError::validation("Assignment name is required."));
        }

        let students = self
            .class_roster(teacher)
            .await?
            .iter()
            .map(|account| account.id)
            .collect();

        let assignment = ClassAssignment::new(teacher, students, assignment_name, file);

        self.collection(ASSIGNMENT_COLLECTION_NAME)
            .insert_one(
                bson::to_document(&assignment)
                    .expect("ClassAssignment must be serializable to BSON"),
                None,
            )
            .await?;

        Ok(assignment)
    }

    async fn assignment(&self, id: Uuid) -> Result<Option<ClassAssignment>, StoreError> {
        self.collection(ASSIGNMENT_COLLECTION_NAME)
            .find_one(filter::by_id(id), None)
            .await
            .map_err(StoreError::from)
    }

    async fn assignments_for_student(
        &self,
        student: Uuid,
    ) -> Result<Vec<ClassAssignment>, StoreError> {
        let documents = self
            .collection(ASSIGNMENT_COLLECTION_NAME)
            .find(doc! { "students": filter::uuid_bson(student) }, newest_first())
            .await?;

        Ok(collect(documents, "ClassAssignment").await)
    }

    async fn assignments_by_teacher(
        &self,
        teacher: Uuid,
    ) -> Result<Vec<ClassAssignment>, StoreError> {
        let documents = self
            .collection(ASSIGNMENT_COLLECTION_NAME)
            .find(doc! { "teacher": filter::uuid_bson(teacher) }, newest_first())
            .await?;

        Ok(collect(documents, "ClassAssignment").await)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_assignment(&self, id: Uuid) -> Result<bool, StoreError> {
        // Submissions first so nothing ends up referencing a gone parent.
        let submissions = self
            .collection::<SubmitAssignment>(SUBMISSION_COLLECTION_NAME)
            .delete_many(doc! { "assignment": filter::uuid_bson(id) }, None)
            .await?;

        tracing::info!(
            "Removed {} submissions of assignment {}.",
            submissions.deleted_count,
            id
        );

        let removed = self
            .collection::<ClassAssignment>(ASSIGNMENT_COLLECTION_NAME)
            .delete_one(filter::by_id(id), None)
            .await?;

        Ok(removed.deleted_count > 0)
    }

    async fn submit_assignment(
        &self,
        student: Uuid,
        assignment: Uuid,
        file: impl ToString + Send,
    ) -> Result<SubmitAssignment, StoreError> {
        require_student(self, student).await?;

        let assignment = self
            .assignment(assignment)
            .await?
            .ok_or_else(|| reject::missing_assignment(assignment))?;

        let submission = SubmitAssignment::new(student, &assignment, file);

        self.collection(SUBMISSION_COLLECTION_NAME)
            .insert_one(
                bson::to_document(&submission)
                    .expect("SubmitAssignment must be serializable to BSON"),
                None,
            )
            .await?;

        Ok(submission)
    }

    async fn submissions_for_assignment(
        &self,
        assignment: Uuid,
    ) -> Result<Vec<SubmitAssignment>, StoreError> {
        let documents = self
            .collection(SUBMISSION_COLLECTION_NAME)
            .find(
                doc! { "assignment": filter::uuid_bson(assignment) },
                newest_first(),
            )
            .await?;

        Ok(collect(documents, "SubmitAssignment").await)
    }

    async fn submissions_for_teacher(
        &self,
        teacher: Uuid,
    ) -> Result<Vec<SubmitAssignment>, StoreError> {
        let documents = self
            .collection(SUBMISSION_COLLECTION_NAME)
            .find(doc! { "teacher": filter::uuid_bson(teacher) }, newest_first())
            .await?;

        Ok(collect(documents, "SubmitAssignment").await)
    }

    async fn delete_submission(&self, id: Uuid) -> Result<bool, StoreError> {
        let removed = self
            .collection::<SubmitAssignment>(SUBMISSION_COLLECTION_NAME)
            .delete_one(filter::by_id(id), None)
            .await?;

        Ok(removed.deleted_count > 0)
    }
}

///////////////////////
//       TESTS
///////////////////////

#[cfg(test)]
mod assignment_store {
    use uuid::Uuid;

    use super::AssignmentDbExt;
    use crate::data::account::db::AccountDbExt;
    use crate::data::class::db::EnrollmentDbExt;
    use crate::data::testing;
    use crate::error::StoreError;

    #[tokio::test]
    #[ignore = "requires a running MongoDB"]
    async fn deleting_an_assignment_deletes_its_submissions() {
        let db = testing::database().await;

        let teacher =
            testing::fresh_account(&db, testing::teacher_data("hw_cascade_teacher")).await;
        let student =
            testing::fresh_account(&db, testing::student_data("hw_cascade_student", "4")).await;
        db.enroll(teacher.id, student.id)
            .await
            .expect("unable to enroll test student");

        let assignment = db
            .post_assignment(teacher.id, "Essay draft", "assignments/essay.pdf")
            .await
            .expect("unable to post test assignment");
        assert!(assignment.students.contains(&student.id));

        db.submit_assignment(student.id, assignment.id, "submissions/essay-v1.pdf")
            .await
            .expect("unable to submit test assignment");

        assert!(db
            .delete_assignment(assignment.id)
            .await
            .expect("unable to delete test assignment"));

        let orphans = db
            .submissions_for_assignment(assignment.id)
            .await
            .expect("unable to list test submissions");
        assert!(orphans.is_empty());

        for id in [teacher.id, student.id] {
            db.delete_account(id)
                .await
                .expect("unable to delete test account");
        }
    }

    #[tokio::test]
    #[ignore = "requires a running MongoDB"]
    async fn submitting_against_a_missing_assignment_is_rejected() {
        let db = testing::database().await;

        let student =
            testing::fresh_account(&db, testing::student_data("hw_missing_student", "2")).await;

        let rejected = db
            .submit_assignment(student.id, Uuid::new_v4(), "submissions/lost.pdf")
            .await;
        assert!(matches!(
            rejected,
            Err(StoreError::MissingParent { what: "assignment", .. })
        ));

        db.delete_account(student.id)
            .await
            .expect("unable to delete test student");
    }

    #[tokio::test]
    #[ignore = "requires a running MongoDB"]
    async fn submission_is_tagged_with_the_assigning_teacher() {
        let db = testing::database().await;

        let teacher = testing::fresh_account(&db, testing::teacher_data("hw_tag_teacher")).await;
        let student =
            testing::fresh_account(&db, testing::student_data("hw_tag_student", "1")).await;
        db.enroll(teacher.id, student.id)
            .await
            .expect("unable to enroll test student");

        let assignment = db
            .post_assignment(teacher.id, "Reading log", "assignments/reading.pdf")
            .await
            .expect("unable to post test assignment");
        let submission = db
            .submit_assignment(student.id, assignment.id, "submissions/reading-log.pdf")
            .await
            .expect("unable to submit test assignment");

        assert_eq!(submission.teacher, teacher.id);
        assert_eq!(
            db.submissions_for_teacher(teacher.id)
                .await
                .expect("unable to list test submissions")[0]
                .id,
            submission.id
        );

        for id in [teacher.id, student.id] {
            db.delete_account(id)
                .await
                .expect("unable to delete test account");
        }
    }
}
