use bson::doc;
use mongodb::options::FindOptions;
use mongodb::Database;
use uuid::Uuid;

use crate::data::account::db::{require_student, require_teacher};
use crate::data::account::{Account, ACCOUNT_COLLECTION_NAME};
use crate::data::{collect, filter};
use crate::error::StoreError;

use super::{Enrollment, ENROLLMENT_COLLECTION_NAME};

pub trait EnrollmentDbExt {
    /// Puts a student in a teacher's class. Enrolling the same pair twice
    /// is rejected by the unique index on `(teacher, student)`.
    async fn enroll(&self, teacher: Uuid, student: Uuid) -> Result<Enrollment, StoreError>;

    /// Removes a student from a teacher's class. Returns whether an
    /// enrollment existed.
    async fn withdraw(&self, teacher: Uuid, student: Uuid) -> Result<bool, StoreError>;

    /// Students in a teacher's class, in roll number order.
    async fn class_roster(&self, teacher: Uuid) -> Result<Vec<Account>, StoreError>;

    /// Teachers whose classes the student sits in.
    async fn classes_of(&self, student: Uuid) -> Result<Vec<Account>, StoreError>;
}

impl EnrollmentDbExt for Database {
    #[tracing::instrument(skip(self))]
    async fn enroll(&self, teacher: Uuid, student: Uuid) -> Result<Enrollment, StoreError> {
        require_teacher(self, teacher).await?;
        require_student(self, student).await?;

        let enrollment = Enrollment::new(teacher, student);

        self.collection(ENROLLMENT_COLLECTION_NAME)
            .insert_one(
                bson::to_document(&enrollment)
                    .expect("Enrollment must be serializable to BSON"),
                None,
            )
            .await
            .map_err(|e| {
                StoreError::write_conflict(
                    e,
                    "enrollment",
                    "Student is already in this teacher's class.",
                )
            })?;

        Ok(enrollment)
    }

    async fn withdraw(&self, teacher: Uuid, student: Uuid) -> Result<bool, StoreError> {
        let removed = self
            .collection::<Enrollment>(ENROLLMENT_COLLECTION_NAME)
            .delete_one(
                doc! {
                    "teacher": filter::uuid_bson(teacher),
                    "student": filter::uuid_bson(student),
                },
                None,
            )
            .await?;

        Ok(removed.deleted_count > 0)
    }

    async fn class_roster(&self, teacher: Uuid) -> Result<Vec<Account>, StoreError> {
        let enrollments = self
            .collection(ENROLLMENT_COLLECTION_NAME)
            .find(doc! { "teacher": filter::uuid_bson(teacher) }, None)
            .await?;
        let enrollments: Vec<Enrollment> = collect(enrollments, "Enrollment").await;

        let students: Vec<_> = enrollments
            .iter()
            .map(|it| filter::uuid_bson(it.student))
            .collect();

        let documents = self
            .collection(ACCOUNT_COLLECTION_NAME)
            .find(
                doc! { "_id": { "$in": students } },
                FindOptions::builder()
                    .sort(doc! { "profile.roll_no": 1 })
                    .build(),
            )
            .await?;

        Ok(collect(documents, "Account").await)
    }

    async fn classes_of(&self, student: Uuid) -> Result<Vec<Account>, StoreError> {
        let enrollments = self
            .collection(ENROLLMENT_COLLECTION_NAME)
            .find(doc! { "student": filter::uuid_bson(student) }, None)
            .await?;
        let enrollments: Vec<Enrollment> = collect(enrollments, "Enrollment").await;

        let teachers: Vec<_> = enrollments
            .iter()
            .map(|it| filter::uuid_bson(it.teacher))
            .collect();

        let documents = self
            .collection(ACCOUNT_COLLECTION_NAME)
            .find(doc! { "_id": { "$in": teachers } }, None)
            .await?;

        Ok(collect(documents, "Account").await)
    }
}

///////////////////////
//       TESTS
///////////////////////

#[cfg(test)]
mod enrollment_store {
    use super::EnrollmentDbExt;
    use crate::data::account::db::AccountDbExt;
    use crate::data::testing;
    use crate::error::StoreError;

    #[tokio::test]
    #[ignore = "requires a running MongoDB"]
    async fn enrolling_the_same_pair_twice_is_rejected() {
        let db = testing::database().await;

        let teacher = testing::fresh_account(&db, testing::teacher_data("pair_teacher")).await;
        let student =
            testing::fresh_account(&db, testing::student_data("pair_student", "3")).await;

        db.enroll(teacher.id, student.id)
            .await
            .expect("first enrollment must succeed");

        let rejected = db.enroll(teacher.id, student.id).await;
        assert!(matches!(
            rejected,
            Err(StoreError::Duplicate { what: "enrollment", .. })
        ));

        db.delete_account(teacher.id)
            .await
            .expect("unable to delete test teacher");
        db.delete_account(student.id)
            .await
            .expect("unable to delete test student");
    }

    #[tokio::test]
    #[ignore = "requires a running MongoDB"]
    async fn roster_is_ordered_by_roll_number() {
        let db = testing::database().await;

        let teacher = testing::fresh_account(&db, testing::teacher_data("roster_teacher")).await;
        let second =
            testing::fresh_account(&db, testing::student_data("roster_student_b", "02")).await;
        let first =
            testing::fresh_account(&db, testing::student_data("roster_student_a", "01")).await;

        db.enroll(teacher.id, second.id)
            .await
            .expect("unable to enroll test student");
        db.enroll(teacher.id, first.id)
            .await
            .expect("unable to enroll test student");

        let roster = db
            .class_roster(teacher.id)
            .await
            .expect("unable to list test roster");
        let ids: Vec<_> = roster.iter().map(|it| it.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);

        for id in [teacher.id, first.id, second.id] {
            db.delete_account(id)
                .await
                .expect("unable to delete test account");
        }
    }

    #[tokio::test]
    #[ignore = "requires a running MongoDB"]
    async fn only_teachers_hold_classes() {
        let db = testing::database().await;

        let student =
            testing::fresh_account(&db, testing::student_data("impostor_student", "9")).await;
        let other =
            testing::fresh_account(&db, testing::student_data("impostor_classmate", "10")).await;

        let rejected = db.enroll(student.id, other.id).await;
        assert!(matches!(rejected, Err(StoreError::Validation(_))));

        for id in [student.id, other.id] {
            db.delete_account(id)
                .await
                .expect("unable to delete test account");
        }
    }
}
