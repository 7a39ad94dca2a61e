use chrono::{DateTime, NaiveDate, Utc};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::credentials::Credentials;
use super::role::ROLE_USER;

lazy_static! {
    // Regex for username validation: alphanumeric, underscores, hyphens
    pub(crate) static ref USERNAME_REGEX: regex::Regex = regex::Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
}

/// Columns a user listing may be sorted by.
pub const USER_SORTABLE_COLUMNS: &[&str] = &[
    "id",
    "email",
    "full_name",
    "location",
    "date_of_birth",
    "gender",
    "enabled",
    "created_at",
    "updated_at",
];

/// Gender of a user. Corresponds to the `gender` SQL enum.
///
/// Unknown values coming from clients are read as `Other`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, sqlx::Type)]
#[sqlx(type_name = "gender", rename_all = "lowercase")]
#[serde(from = "String")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Other,
}

impl From<String> for Gender {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Male" => Gender::Male,
            "Female" => Gender::Female,
            _ => Gender::Other,
        }
    }
}

/// A user as stored in the `users` table, together with its role names.
///
/// `credentials` is only populated when the user was loaded for
/// authentication or is about to be created.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct User {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    pub full_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub location: String,
    pub gender: Gender,
    pub enabled: bool,
    pub roles: Vec<String>,
    #[sqlx(skip)]
    pub credentials: Option<Credentials>,
}

impl User {
    /// Creates an enabled user with a fresh id and no roles.
    pub fn new(email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            email: email.into(),
            full_name: String::new(),
            date_of_birth: None,
            location: String::new(),
            gender: Gender::Other,
            enabled: true,
            roles: Vec::new(),
            credentials: None,
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = full_name.into();
        self
    }

    pub fn with_date_of_birth(mut self, date_of_birth: Option<NaiveDate>) -> Self {
        self.date_of_birth = date_of_birth;
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = gender;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Attaches credentials, binding them to this user's id.
    pub fn with_credentials(mut self, mut credentials: Credentials) -> Self {
        credentials.user_id = self.id;
        self.credentials = Some(credentials);
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// The user representation returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    #[serde(rename = "fullname")]
    pub full_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub location: String,
    pub gender: Gender,
    pub enabled: bool,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            created_at: user.created_at,
            updated_at: user.updated_at,
            email: user.email,
            full_name: user.full_name,
            date_of_birth: user.date_of_birth,
            location: user.location,
            gender: user.gender,
            enabled: user.enabled,
        }
    }
}

/// Payload for registering a user (sign-up) or creating one as an administrator.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    /// Must be between 3 and 24 characters, alphanumeric, and can include underscores or hyphens.
    #[validate(
        length(min = 3, max = 24),
        regex(
            path = "USERNAME_REGEX",
            message = "Username must be alphanumeric, underscores, or hyphens"
        )
    )]
    pub username: String,
    /// Must be between 8 and 72 characters; bcrypt ignores anything longer.
    #[validate(length(min = 8, max = 72))]
    pub password: String,
    #[validate(email)]
    pub email: String,
    #[serde(default, rename = "fullname")]
    #[validate(length(max = 100))]
    pub full_name: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub location: String,
    #[serde(default)]
    pub gender: Gender,
}

impl CreateUserRequest {
    /// Builds the user entity with the default `ROLE_USER` role and the given password hash.
    pub fn into_user(self, password_hash: String) -> User {
        let credentials = Credentials::new(self.username, password_hash);
        User::new(self.email)
            .with_full_name(self.full_name)
            .with_date_of_birth(self.date_of_birth)
            .with_location(self.location)
            .with_gender(self.gender)
            .with_roles([ROLE_USER])
            .with_credentials(credentials)
    }
}

/// Payload for updating an existing user's profile.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub id: Uuid,
    #[validate(email)]
    pub email: String,
    #[serde(default, rename = "fullname")]
    #[validate(length(max = 100))]
    pub full_name: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub location: String,
    #[serde(default)]
    pub gender: Gender,
}

impl UpdateUserRequest {
    pub fn into_user(self) -> User {
        User::new(self.email)
            .with_id(self.id)
            .with_full_name(self.full_name)
            .with_date_of_birth(self.date_of_birth)
            .with_location(self.location)
            .with_gender(self.gender)
    }
}

/// Whether a roles request grants or revokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RolesCommand {
    Add,
    Delete,
}

/// Payload for `POST /api/v1/user/roles`.
///
/// `id` stays a string so that a malformed id can be reported as a
/// validation failure rather than a body parse failure.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UserRolesRequest {
    pub id: String,
    pub command: RolesCommand,
    #[validate(length(min = 1))]
    pub roles: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    fn create_request() -> CreateUserRequest {
        CreateUserRequest {
            username: "test_user-123".to_string(),
            password: "Password1234!".to_string(),
            email: "test@example.com".to_string(),
            full_name: "Test User".to_string(),
            date_of_birth: None,
            location: "Earth".to_string(),
            gender: Gender::Female,
        }
    }

    #[test]
    fn test_create_request_validation() {
        assert!(create_request().validate().is_ok());

        let mut invalid = create_request();
        invalid.username = "test user!".to_string();
        assert!(invalid.validate().is_err());

        let mut invalid = create_request();
        invalid.username = "tu".to_string();
        assert!(invalid.validate().is_err());

        let mut invalid = create_request();
        invalid.email = "invalid-email".to_string();
        assert!(invalid.validate().is_err());

        let mut invalid = create_request();
        invalid.password = "short".to_string();
        assert!(invalid.validate().is_err());

        let mut invalid = create_request();
        invalid.password = "P".repeat(73);
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_into_user_assigns_default_role_and_credentials() {
        let user = create_request().into_user("hash".to_string());
        assert!(user.enabled);
        assert!(user.has_role(ROLE_USER));
        assert_eq!(user.full_name, "Test User");
        assert_eq!(user.gender, Gender::Female);

        let credentials = user.credentials.as_ref().unwrap();
        assert_eq!(credentials.username, "test_user-123");
        assert_eq!(credentials.password_hash, "hash");
        assert_eq!(credentials.user_id, user.id);
    }

    #[test]
    fn test_gender_reads_unknown_values_as_other() {
        let g: Gender = serde_json::from_str("\"Female\"").unwrap();
        assert_eq!(g, Gender::Female);
        let g: Gender = serde_json::from_str("\"Robot\"").unwrap();
        assert_eq!(g, Gender::Other);
        assert_eq!(serde_json::to_string(&Gender::Male).unwrap(), "\"Male\"");
    }

    #[test]
    fn test_dto_uses_camel_case() {
        let user = User::new("a@x.com").with_full_name("A");
        let json = serde_json::to_value(UserDto::from(user)).unwrap();
        assert_eq!(json["fullname"], "A");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("dateOfBirth").is_some());
        assert_eq!(json["gender"], "Other");
    }

    #[test]
    fn test_roles_request_parsing() {
        let req: UserRolesRequest = serde_json::from_str(
            r#"{"id":"220cea28-b2b0-4051-9eb6-9a99e451af02","command":"ADD","roles":["ROLE_ADMIN"]}"#,
        )
        .unwrap();
        assert_eq!(req.command, RolesCommand::Add);

        let invalid = serde_json::from_str::<UserRolesRequest>(
            r#"{"id":"x","command":"INVALID","roles":["ROLE_ADMIN"]}"#,
        );
        assert!(invalid.is_err());
    }
}
