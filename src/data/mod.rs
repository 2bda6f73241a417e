use bson::{doc, Bson, Document};
use futures::StreamExt;
use mongodb::options::IndexOptions;
use mongodb::{Cursor, Database, IndexModel};
use serde::de::DeserializeOwned;

use crate::error::StoreError;

pub mod account;
pub mod assignment;
pub mod class;
pub mod marks;
pub mod message;
pub mod notice;

pub mod filter {
    use bson::spec::BinarySubtype;
    use bson::{doc, Bson, Document};
    use uuid::Uuid;

    /// UUIDs are stored as BSON binary subtype 4, matching the
    /// `uuid_1_as_binary` serde representation on the models.
    #[inline]
    pub fn uuid_bson(id: Uuid) -> Bson {
        Bson::Binary(bson::Binary {
            subtype: BinarySubtype::Uuid,
            bytes: id.as_bytes().to_vec(),
        })
    }

    #[inline]
    pub fn by_id(id: Uuid) -> Document {
        doc! { "_id": uuid_bson(id) }
    }
}

/// Serde glue storing recipient lists as arrays of BSON binary UUIDs, the
/// same representation `uuid_1_as_binary` gives single ids.
pub mod uuid_vec {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use uuid::Uuid;

    pub fn serialize<S: Serializer>(ids: &[Uuid], serializer: S) -> Result<S::Ok, S::Error> {
        let ids: Vec<bson::Uuid> = ids.iter().copied().map(bson::Uuid::from).collect();
        ids.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Uuid>, D::Error> {
        let ids = Vec::<bson::Uuid>::deserialize(deserializer)?;
        Ok(ids.into_iter().map(Uuid::from).collect())
    }
}

/// Creates the unique indexes backing the schema's uniqueness rules. Writes
/// violating them fail with a duplicate-key error instead of overwriting.
pub async fn ensure_indexes(db: &Database) -> Result<(), StoreError> {
    unique_index(db, account::ACCOUNT_COLLECTION_NAME, "unique_username", doc! { "username": 1 })
        .await?;
    unique_index(
        db,
        class::ENROLLMENT_COLLECTION_NAME,
        "unique_teacher_student",
        doc! { "teacher": 1, "student": 1 },
    )
    .await?;
    unique_index(
        db,
        message::MESSAGE_COLLECTION_NAME,
        "unique_student_message",
        doc! { "student": 1, "message": 1 },
    )
    .await?;
    unique_index(
        db,
        notice::NOTICE_COLLECTION_NAME,
        "unique_teacher_message",
        doc! { "teacher": 1, "message": 1 },
    )
    .await?;

    Ok(())
}

async fn unique_index(
    db: &Database,
    collection: &str,
    name: &str,
    keys: Document,
) -> Result<(), StoreError> {
    let index = IndexModel::builder()
        .keys(keys)
        .options(
            IndexOptions::builder()
                .name(name.to_string())
                .unique(true)
                .build(),
        )
        .build();

    db.collection::<Document>(collection)
        .create_index(index, None)
        .await?;

    tracing::debug!("Index '{}' ensured on '{}'.", name, collection);
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use mongodb::Database;

    use crate::data::account::db::AccountDbExt;
    use crate::data::account::{Account, AccountProfile, NewAccount, StudentProfile, TeacherProfile};

    pub async fn database() -> Database {
        crate::create(None)
            .await
            .expect("these tests require a running MongoDB")
    }

    pub fn student_data(username: &str, roll_no: &str) -> NewAccount {
        NewAccount {
            username: username.to_string(),
            profile: AccountProfile::Student(StudentProfile {
                name: username.replace('_', " "),
                roll_no: roll_no.to_string(),
                email: format!("{}@example.com", username),
                phone: 5550100,
                photo: None,
            }),
        }
    }

    pub fn teacher_data(username: &str) -> NewAccount {
        NewAccount {
            username: username.to_string(),
            profile: AccountProfile::Teacher(TeacherProfile {
                name: username.replace('_', " "),
                subject_name: "Mathematics".to_string(),
                email: format!("{}@example.com", username),
                phone: 5550200,
                photo: None,
            }),
        }
    }

    /// Creates the account, first clearing any copy a previous (aborted)
    /// test run left behind.
    pub async fn fresh_account(db: &Database, data: NewAccount) -> Account {
        if let Some(old) = db
            .find_account_by_username(&data.username)
            .await
            .expect("unable to look up test account")
        {
            db.delete_account(old.id)
                .await
                .expect("unable to clear leftover test account");
        }

        db.create_account(data)
            .await
            .expect("unable to create test account")
    }
}

/// Drains a cursor into typed records, skipping documents that no longer
/// deserialize rather than failing the whole listing.
pub(crate) async fn collect<T: DeserializeOwned>(
    mut documents: Cursor<Document>,
    what: &'static str,
) -> Vec<T> {
    let mut records: Vec<T> = vec![];

    while let Some(result) = documents.next().await {
        let document = match result {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!("Cursor failed while listing {}: {}", what, e);
                continue;
            }
        };

        match bson::from_bson(Bson::Document(document)) {
            Ok(record) => records.push(record),
            Err(_) => {
                tracing::warn!("Unable to deserialize {} document.", what)
            }
        }
    }

    records
}
