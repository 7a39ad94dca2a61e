use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AppError;
use crate::models::{contains_role, User};

/// Represents the claims encoded within a JWT (JSON Web Token).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Id of the user the token was issued to.
    pub sub: Uuid,
    pub email: String,
    pub name: String,
    pub roles: Vec<String>,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: usize,
    /// Expiration timestamp (seconds since epoch) for the token.
    pub exp: usize,
}

impl Claims {
    pub fn has_role(&self, role: &str) -> bool {
        contains_role(&self.roles, role)
    }
}

/// Generates an HS256-signed JWT for `user`.
///
/// The token expires after `auth.token_expiration_hours`.
///
/// # Returns
/// Returns `AppError::InternalServerError` if the expiry overflows or token encoding fails.
pub fn generate_token(user: &User, auth: &AuthConfig) -> Result<String, AppError> {
    let now = Utc::now();
    let expiration = Duration::try_hours(auth.token_expiration_hours)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .ok_or_else(|| AppError::InternalServerError("Token expiry out of range".into()))?;

    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        name: user.full_name.clone(),
        roles: user.roles.clone(),
        iat: now.timestamp() as usize,
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(auth.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
}

/// Verifies a JWT string and decodes its claims.
///
/// Signature and expiration are checked.
///
/// # Returns
/// Returns `AppError::Unauthorized` if the token is malformed, its signature is invalid, or it has expired.
pub fn verify_token(token: &str, auth: &AuthConfig) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(auth.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {:?}", e.kind())))
}
