pub mod middleware;
pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::user::USERNAME_REGEX;

// Re-export necessary items
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use token::{generate_token, verify_token, Claims};

/// Represents the payload for a sign-in request.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SignInRequest {
    #[validate(
        length(min = 3, max = 24),
        regex(
            path = "USERNAME_REGEX",
            message = "Username must be alphanumeric, underscores, or hyphens"
        )
    )]
    pub username: String,
    #[validate(length(min = 8, max = 72))]
    pub password: String,
}

/// Payload for changing one's own password.
///
/// The caller proves knowledge of the current password instead of presenting a token.
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 3, max = 24))]
    pub username: String,
    #[validate(length(min = 8, max = 72))]
    pub old_password: String,
    #[validate(length(min = 8, max = 72))]
    pub new_password: String,
}

/// Response to a successful sign-in.
#[derive(Debug, Serialize, Deserialize)]
pub struct SignInResponse {
    /// The JWT (JSON Web Token) to send as `Authorization: Bearer <token>`.
    pub token: String,
}

/// Response to a successful sign-up.
#[derive(Debug, Serialize, Deserialize)]
pub struct SignUpResponse {
    pub id: Uuid,
}
