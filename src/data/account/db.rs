use bson::{doc, Document};
use mongodb::options::FindOptions;
use mongodb::Database;
use uuid::Uuid;

use crate::data::assignment::{ASSIGNMENT_COLLECTION_NAME, SUBMISSION_COLLECTION_NAME};
use crate::data::class::ENROLLMENT_COLLECTION_NAME;
use crate::data::marks::MARKS_COLLECTION_NAME;
use crate::data::message::MESSAGE_COLLECTION_NAME;
use crate::data::notice::NOTICE_COLLECTION_NAME;
use crate::data::{collect, filter};
use crate::error::StoreError;

use super::{Account, AccountProfile, NewAccount, ACCOUNT_COLLECTION_NAME};

pub mod reject {
    use crate::error::StoreError;
    use uuid::Uuid;

    #[inline]
    pub fn missing_student(id: Uuid) -> StoreError {
        StoreError::MissingParent {
            what: "student",
            id,
        }
    }

    #[inline]
    pub fn missing_teacher(id: Uuid) -> StoreError {
        StoreError::MissingParent {
            what: "teacher",
            id,
        }
    }

    #[inline]
    pub fn not_a_student(id: Uuid) -> StoreError {
        StoreError::validation(format!("Account '{}' is not a student.", id))
    }

    #[inline]
    pub fn not_a_teacher(id: Uuid) -> StoreError {
        StoreError::validation(format!("Account '{}' is not a teacher.", id))
    }
}

/// Looks up `id` and insists it is a student account. Used by every
/// operation that stores a student reference.
pub(crate) async fn require_student(db: &Database, id: Uuid) -> Result<Account, StoreError> {
    let account = db.account(id).await?.ok_or_else(|| reject::missing_student(id))?;

    if !account.is_student() {
        return Err(reject::not_a_student(id));
    }

    Ok(account)
}

/// Looks up `id` and insists it is a teacher account.
pub(crate) async fn require_teacher(db: &Database, id: Uuid) -> Result<Account, StoreError> {
    let account = db.account(id).await?.ok_or_else(|| reject::missing_teacher(id))?;

    if !account.is_teacher() {
        return Err(reject::not_a_teacher(id));
    }

    Ok(account)
}

pub trait AccountDbExt {
    async fn create_account(&self, data: NewAccount) -> Result<Account, StoreError>;

    async fn account(&self, id: Uuid) -> Result<Option<Account>, StoreError>;
    async fn find_account_by_username(
        &self,
        username: impl AsRef<str> + Send,
    ) -> Result<Option<Account>, StoreError>;

    async fn list_students(&self) -> Result<Vec<Account>, StoreError>;
    async fn list_teachers(&self) -> Result<Vec<Account>, StoreError>;

    async fn update_profile(
        &self,
        id: Uuid,
        profile: AccountProfile,
    ) -> Result<Option<Account>, StoreError>;

    async fn delete_account(&self, id: Uuid) -> Result<Option<Account>, StoreError>;
}

impl AccountDbExt for Database {
    async fn create_account(&self, data: NewAccount) -> Result<Account, StoreError> {
        data.validate()?;

        let account = Account::new(data);

        self.collection(ACCOUNT_COLLECTION_NAME)
            .insert_one(
                bson::to_document(&account).expect("Account must be serializable to BSON"),
                None,
            )
            .await
            .map_err(|e| {
                StoreError::write_conflict(e, "username", "Username already used.")
            })?;

        Ok(account)
    }

    async fn account(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        self.collection(ACCOUNT_COLLECTION_NAME)
            .find_one(filter::by_id(id), None)
            .await
            .map_err(StoreError::from)
    }

    async fn find_account_by_username(
        &self,
        username: impl AsRef<str> + Send,
    ) -> Result<Option<Account>, StoreError> {
        self.collection(ACCOUNT_COLLECTION_NAME)
            .find_one(doc! { "username": username.as_ref() }, None)
            .await
            .map_err(StoreError::from)
    }

    async fn list_students(&self) -> Result<Vec<Account>, StoreError> {
        let documents = self
            .collection(ACCOUNT_COLLECTION_NAME)
            .find(
                doc! { "profile.role": "student" },
                FindOptions::builder()
                    .sort(doc! { "profile.roll_no": 1 })
                    .build(),
            )
            .await?;

        Ok(collect(documents, "Account").await)
    }

    async fn list_teachers(&self) -> Result<Vec<Account>, StoreError> {
        let documents = self
            .collection(ACCOUNT_COLLECTION_NAME)
            .find(doc! { "profile.role": "teacher" }, None)
            .await?;

        Ok(collect(documents, "Account").await)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        profile: AccountProfile,
    ) -> Result<Option<Account>, StoreError> {
        let mut account = match self.account(id).await? {
            Some(account) => account,
            None => return Ok(None),
        };

        // An account keeps its role for life; only the profile data moves.
        if account.profile.role_name() != profile.role_name() {
            return Err(StoreError::validation(format!(
                "Account '{}' is a {} and can't become a {}.",
                id,
                account.profile.role_name(),
                profile.role_name()
            )));
        }

        profile.validate()?;

        self.collection::<Account>(ACCOUNT_COLLECTION_NAME)
            .update_one(
                filter::by_id(id),
                doc! { "$set": { "profile": bson::to_bson(&profile)? } },
                None,
            )
            .await?;

        account.profile = profile;
        Ok(Some(account))
    }

    #[tracing::instrument(skip(self))]
    async fn delete_account(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        let account = match self.account(id).await? {
            Some(account) => account,
            None => return Ok(None),
        };

        // Dependents go first so a failed run never leaves orphans behind.
        match account.profile {
            AccountProfile::Teacher(_) => self.cascade_teacher(id).await?,
            AccountProfile::Student(_) => self.cascade_student(id).await?,
        }

        self.collection::<Account>(ACCOUNT_COLLECTION_NAME)
            .delete_one(filter::by_id(id), None)
            .await?;

        Ok(Some(account))
    }
}

trait CascadeDbExt {
    async fn cascade_teacher(&self, id: Uuid) -> Result<(), StoreError>;
    async fn cascade_student(&self, id: Uuid) -> Result<(), StoreError>;
}

impl CascadeDbExt for Database {
    async fn cascade_teacher(&self, id: Uuid) -> Result<(), StoreError> {
        let teacher = filter::uuid_bson(id);

        // Submissions are tagged with the assigning teacher, so one filter
        // also covers every submission against this teacher's assignments.
        for collection in [
            SUBMISSION_COLLECTION_NAME,
            ASSIGNMENT_COLLECTION_NAME,
            NOTICE_COLLECTION_NAME,
            MESSAGE_COLLECTION_NAME,
            MARKS_COLLECTION_NAME,
            ENROLLMENT_COLLECTION_NAME,
        ] {
            let removed = self
                .collection::<Document>(collection)
                .delete_many(doc! { "teacher": teacher.clone() }, None)
                .await?;

            tracing::info!(
                "Removed {} '{}' records of teacher {}.",
                removed.deleted_count,
                collection,
                id
            );
        }

        Ok(())
    }

    async fn cascade_student(&self, id: Uuid) -> Result<(), StoreError> {
        let student = filter::uuid_bson(id);

        for collection in [
            SUBMISSION_COLLECTION_NAME,
            MESSAGE_COLLECTION_NAME,
            MARKS_COLLECTION_NAME,
            ENROLLMENT_COLLECTION_NAME,
        ] {
            let removed = self
                .collection::<Document>(collection)
                .delete_many(doc! { "student": student.clone() }, None)
                .await?;

            tracing::info!(
                "Removed {} '{}' records of student {}.",
                removed.deleted_count,
                collection,
                id
            );
        }

        // Notices and assignments outlive a recipient; the student is only
        // pulled out of their recipient lists.
        for collection in [NOTICE_COLLECTION_NAME, ASSIGNMENT_COLLECTION_NAME] {
            self.collection::<Document>(collection)
                .update_many(
                    doc! { "students": student.clone() },
                    doc! { "$pull": { "students": student.clone() } },
                    None,
                )
                .await?;
        }

        Ok(())
    }
}

///////////////////////
//       TESTS
///////////////////////
