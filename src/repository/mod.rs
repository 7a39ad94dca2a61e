//! Storage ports for domain entities.
//!
//! Handlers and services depend on these traits only; `postgres` holds the
//! sqlx-backed implementation and `memory` an in-process one used for local
//! development and tests.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::User;
use crate::pagination::{Page, Pageable};

pub use memory::InMemoryUserRepository;
pub use postgres::PgUserRepository;

/// Generic CRUD and paging over entities of type `T` identified by `Id`.
#[async_trait]
pub trait Repository<Id, T>: Send + Sync
where
    Id: Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    /// Returns `AppError::NotFound` when no entity has this id.
    async fn get_by_id(&self, id: Id) -> Result<T, AppError>;

    async fn create(&self, entity: &T) -> Result<(), AppError>;

    /// Replaces the mutable fields of an existing entity and returns the stored result.
    async fn update(&self, entity: &T) -> Result<T, AppError>;

    /// Returns `AppError::NotFound` when no entity has this id.
    async fn delete_by_id(&self, id: Id) -> Result<(), AppError>;

    /// Fetches one page plus the exact total count.
    ///
    /// An empty sort falls back to the store's default ordering. A page size of
    /// zero yields no elements and zero pages, but still reports the true total.
    /// Store failures surface as `AppError::GetPage`.
    async fn get_page(&self, pageable: &Pageable) -> Result<Page<T>, AppError>;
}

/// User persistence, including credentials and roles.
#[async_trait]
pub trait UserRepository: Repository<Uuid, User> {
    /// Loads a user together with its credentials.
    async fn get_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    async fn change_password(&self, user_id: Uuid, password_hash: &str) -> Result<(), AppError>;

    /// Grants roles; names the user already holds are ignored.
    async fn add_roles(&self, user_id: Uuid, roles: &[String]) -> Result<(), AppError>;

    async fn remove_roles(&self, user_id: Uuid, roles: &[String]) -> Result<(), AppError>;

    /// Flips the `enabled` flag and returns its new value.
    async fn enable_disable(&self, user_id: Uuid) -> Result<bool, AppError>;
}

pub(crate) fn user_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("User {} not found", id))
}
