//! Use cases of the user administration and authentication API.
//!
//! Handlers validate request bodies and then call into [`UserService`], which
//! talks to storage only through the [`UserRepository`] port.

use std::sync::Arc;

use log::{info, warn};
use uuid::Uuid;

use crate::auth::{
    generate_token, hash_password, verify_password, ChangePasswordRequest, SignInRequest,
};
use crate::config::{AdminConfig, AuthConfig};
use crate::error::AppError;
use crate::models::{
    CreateUserRequest, Credentials, RolesCommand, UpdateUserRequest, User, UserDto,
    UserRolesRequest, ROLE_ADMIN, ROLE_USER,
};
use crate::pagination::{Page, Pageable};
use crate::repository::UserRepository;

const INVALID_CREDENTIALS: &str = "invalid username or password";

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository>,
    auth: AuthConfig,
    bcrypt_cost: u32,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>, auth: AuthConfig) -> Self {
        Self {
            repo,
            auth,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Overrides the bcrypt work factor used for new password hashes.
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    pub fn auth(&self) -> &AuthConfig {
        &self.auth
    }

    /// Runs bcrypt on the blocking pool so request workers stay responsive.
    async fn hash(&self, password: &str) -> Result<String, AppError> {
        let password = password.to_owned();
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .map_err(|e| AppError::InternalServerError(format!("Hashing task failed: {}", e)))?
    }

    /// Checks a username and password and issues a token.
    ///
    /// Unknown usernames and wrong passwords are indistinguishable to the caller.
    pub async fn sign_in(&self, request: &SignInRequest) -> Result<String, AppError> {
        let invalid = || AppError::Unauthorized(INVALID_CREDENTIALS.into());

        let user = self
            .repo
            .get_by_username(&request.username)
            .await?
            .ok_or_else(invalid)?;
        let credentials = user.credentials.as_ref().ok_or_else(invalid)?;

        if !verify_password(&request.password, &credentials.password_hash)? {
            return Err(invalid());
        }
        if !user.enabled {
            warn!("Sign-in attempt for disabled user {}", user.id);
            return Err(AppError::Unauthorized("user is disabled".into()));
        }

        generate_token(&user, &self.auth)
    }

    /// Registers a new user holding `ROLE_USER` and returns its id.
    pub async fn sign_up(&self, request: CreateUserRequest) -> Result<Uuid, AppError> {
        self.create(request).await.map(|user| user.id)
    }

    pub async fn create(&self, request: CreateUserRequest) -> Result<User, AppError> {
        if self.repo.get_by_username(&request.username).await?.is_some() {
            return Err(AppError::Conflict("username already taken".into()));
        }

        let password_hash = self.hash(&request.password).await?;
        let user = request.into_user(password_hash);
        self.repo.create(&user).await?;

        info!("Created user {} ({})", user.id, user.email);
        Ok(User {
            credentials: None,
            ..user
        })
    }

    pub async fn update(&self, request: UpdateUserRequest) -> Result<User, AppError> {
        self.repo.update(&request.into_user()).await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<User, AppError> {
        self.repo.get_by_id(id).await
    }

    pub async fn delete_by_id(&self, id: Uuid) -> Result<(), AppError> {
        self.repo.delete_by_id(id).await?;
        info!("Deleted user {}", id);
        Ok(())
    }

    pub async fn get_page(&self, pageable: &Pageable) -> Result<Page<UserDto>, AppError> {
        let page = self.repo.get_page(pageable).await?;
        Ok(page.map(UserDto::from))
    }

    /// Grants or revokes the listed roles and reports which command ran.
    pub async fn update_roles(&self, request: &UserRolesRequest) -> Result<RolesCommand, AppError> {
        let user_id = Uuid::parse_str(request.id.trim())
            .map_err(|e| AppError::ValidationError(format!("id: {}", e)))?;

        match request.command {
            RolesCommand::Add => self.repo.add_roles(user_id, &request.roles).await?,
            RolesCommand::Delete => self.repo.remove_roles(user_id, &request.roles).await?,
        }
        info!(
            "{:?} roles {:?} for user {}",
            request.command, request.roles, user_id
        );
        Ok(request.command)
    }

    /// Toggles whether the user may sign in and returns the new state.
    pub async fn enable_disable(&self, id: Uuid) -> Result<bool, AppError> {
        let enabled = self.repo.enable_disable(id).await?;
        info!(
            "User {} is now {}",
            id,
            if enabled { "enabled" } else { "disabled" }
        );
        Ok(enabled)
    }

    pub async fn change_password(&self, request: &ChangePasswordRequest) -> Result<(), AppError> {
        let invalid = || AppError::Unauthorized(INVALID_CREDENTIALS.into());

        let user = self
            .repo
            .get_by_username(&request.username)
            .await?
            .ok_or_else(invalid)?;
        let credentials = user.credentials.as_ref().ok_or_else(invalid)?;

        if !verify_password(&request.old_password, &credentials.password_hash)? {
            return Err(invalid());
        }

        let password_hash = self.hash(&request.new_password).await?;
        self.repo.change_password(user.id, &password_hash).await?;
        info!("Password changed for user {}", user.id);
        Ok(())
    }

    /// Creates the configured administrator unless its username already exists.
    ///
    /// Returns whether a user was created.
    pub async fn seed_admin(&self, admin: &AdminConfig) -> Result<bool, AppError> {
        if self.repo.get_by_username(&admin.username).await?.is_some() {
            info!("Admin user '{}' already exists", admin.username);
            return Ok(false);
        }

        let password_hash = self.hash(&admin.password).await?;
        let user = User::new(admin.email.clone())
            .with_full_name("Administrator")
            .with_roles([ROLE_USER, ROLE_ADMIN])
            .with_credentials(Credentials::new(admin.username.clone(), password_hash));
        self.repo.create(&user).await?;

        info!("Created admin user '{}'", admin.username);
        Ok(true)
    }
}
