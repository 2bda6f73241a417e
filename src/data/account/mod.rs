use uuid::Uuid;

use crate::error::StoreError;

pub mod db;

pub static ACCOUNT_COLLECTION_NAME: &str = "accounts";

fn validate_contact(name: &str, email: &str) -> Result<(), StoreError> {
    if name.trim().is_empty() {
        return Err(StoreError::validation("Name is required."));
    }

    if !email.contains("@") {
        return Err(StoreError::validation(format!(
            "'{}' is not a valid e-mail address.",
            email
        )));
    }

    Ok(())
}

/// Profile data for a student account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub name: String,
    pub roll_no: String,
    pub email: String,
    pub phone: i64,
    #[serde(default)]
    pub photo: Option<String>,
}

impl StudentProfile {
    pub fn validate(&self) -> Result<(), StoreError> {
        validate_contact(&self.name, &self.email)?;

        if self.roll_no.trim().is_empty() {
            return Err(StoreError::validation("Roll number is required."));
        }

        Ok(())
    }
}

/// Profile data for a teacher account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherProfile {
    pub name: String,
    pub subject_name: String,
    pub email: String,
    pub phone: i64,
    #[serde(default)]
    pub photo: Option<String>,
}

impl TeacherProfile {
    pub fn validate(&self) -> Result<(), StoreError> {
        validate_contact(&self.name, &self.email)?;

        if self.subject_name.trim().is_empty() {
            return Err(StoreError::validation("Subject name is required."));
        }

        Ok(())
    }
}

/// An account is always exactly one of the two profiles. Role flags fall out
/// of the variant instead of being stored next to it, so an account with
/// both or neither profile can't be represented at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum AccountProfile {
    Student(StudentProfile),
    Teacher(TeacherProfile),
}

impl AccountProfile {
    pub fn is_student(&self) -> bool {
        matches!(self, AccountProfile::Student(_))
    }

    pub fn is_teacher(&self) -> bool {
        matches!(self, AccountProfile::Teacher(_))
    }

    pub fn name(&self) -> &str {
        match self {
            AccountProfile::Student(profile) => profile.name.as_str(),
            AccountProfile::Teacher(profile) => profile.name.as_str(),
        }
    }

    pub fn email(&self) -> &str {
        match self {
            AccountProfile::Student(profile) => profile.email.as_str(),
            AccountProfile::Teacher(profile) => profile.email.as_str(),
        }
    }

    /// Storage tag of the variant, as used in `profile.role` filters.
    pub fn role_name(&self) -> &'static str {
        match self {
            AccountProfile::Student(_) => "student",
            AccountProfile::Teacher(_) => "teacher",
        }
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        match self {
            AccountProfile::Student(profile) => profile.validate(),
            AccountProfile::Teacher(profile) => profile.validate(),
        }
    }
}

impl std::fmt::Display for AccountProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "_id", with = "bson::serde_helpers::uuid_1_as_binary")]
    pub id: Uuid,
    pub username: String,
    pub profile: AccountProfile,
}

impl Account {
    pub fn new(data: NewAccount) -> Account {
        let id = data.id();
        tracing::info!("Creating a new account with UUID: {}", id.to_string());

        Account {
            id,
            username: data.username,
            profile: data.profile,
        }
    }

    pub fn is_student(&self) -> bool {
        self.profile.is_student()
    }

    pub fn is_teacher(&self) -> bool {
        self.profile.is_teacher()
    }
}

impl std::fmt::Display for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.profile.name())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount {
    pub username: String,
    pub profile: AccountProfile,
}

impl NewAccount {
    pub fn id(&self) -> Uuid {
        Uuid::new_v5(&Uuid::NAMESPACE_OID, self.username.as_bytes())
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        if self.username.len() < 5 {
            return Err(StoreError::validation(
                "Username must be at least 5 characters (bytes) long.",
            ));
        }

        if self.username.len() > 32 {
            return Err(StoreError::validation(
                "Username can't be longer than 32 characters (bytes).",
            ));
        }

        self.profile.validate()
    }
}

///////////////////////
//       TESTS
///////////////////////
