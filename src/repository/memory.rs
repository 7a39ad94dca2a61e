//! In-memory user repository for development and testing.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{user_not_found, Repository, UserRepository};
use crate::error::AppError;
use crate::models::{User, USER_SORTABLE_COLUMNS};
use crate::pagination::{Order, Page, Pageable};

/// Keeps users in a concurrent map, tagged with their insertion sequence so
/// that the default ordering is creation order.
///
/// Writes that check email or username uniqueness hold `writes`, so two
/// concurrent creates cannot both claim the same address.
pub struct InMemoryUserRepository {
    users: DashMap<Uuid, (u64, User)>,
    sequence: AtomicU64,
    writes: Mutex<()>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            sequence: AtomicU64::new(1),
            writes: Mutex::new(()),
        }
    }

    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .iter()
            .any(|entry| entry.value().1.email == email && Some(*entry.key()) != except)
    }

    fn username_taken(&self, username: &str) -> bool {
        self.users.iter().any(|entry| {
            entry
                .value()
                .1
                .credentials
                .as_ref()
                .is_some_and(|c| c.username == username)
        })
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

/// Users leave the repository without credentials, like rows read from `users`.
fn public(user: &User) -> User {
    User {
        credentials: None,
        ..user.clone()
    }
}

/// Compares two users on one sort order, honouring direction and null placement.
fn compare(a: &User, b: &User, order: &Order) -> Ordering {
    let direction = order.direction;
    let ordering = match order.property.as_str() {
        "id" => a.id.cmp(&b.id),
        "email" => a.email.cmp(&b.email),
        "full_name" => a.full_name.cmp(&b.full_name),
        "location" => a.location.cmp(&b.location),
        "gender" => a.gender.cmp(&b.gender),
        "enabled" => a.enabled.cmp(&b.enabled),
        "created_at" => a.created_at.cmp(&b.created_at),
        "updated_at" => a.updated_at.cmp(&b.updated_at),
        "date_of_birth" => {
            return match (a.date_of_birth, b.date_of_birth) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) if direction.nulls_first() => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) if direction.nulls_first() => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(x), Some(y)) if direction.is_descending() => y.cmp(&x),
                (Some(x), Some(y)) => x.cmp(&y),
            };
        }
        _ => Ordering::Equal,
    };
    if direction.is_descending() {
        ordering.reverse()
    } else {
        ordering
    }
}

#[async_trait]
impl Repository<Uuid, User> for InMemoryUserRepository {
    async fn get_by_id(&self, id: Uuid) -> Result<User, AppError> {
        self.users
            .get(&id)
            .map(|entry| public(&entry.value().1))
            .ok_or_else(|| user_not_found(id))
    }

    async fn create(&self, user: &User) -> Result<(), AppError> {
        let _guard = self.writes.lock().await;
        if self.users.contains_key(&user.id) || self.email_taken(&user.email, None) {
            return Err(AppError::Conflict("Record already exists".into()));
        }
        if let Some(credentials) = &user.credentials {
            if self.username_taken(&credentials.username) {
                return Err(AppError::Conflict("Record already exists".into()));
            }
        }

        let mut stored = user.clone();
        stored.roles.sort();
        stored.roles.dedup();
        if let Some(credentials) = stored.credentials.as_mut() {
            credentials.user_id = stored.id;
        }

        let seq = self.sequence.fetch_add(1, AtomicOrdering::SeqCst);
        self.users.insert(user.id, (seq, stored));
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<User, AppError> {
        let _guard = self.writes.lock().await;
        if !self.users.contains_key(&user.id) {
            return Err(user_not_found(user.id));
        }
        if self.email_taken(&user.email, Some(user.id)) {
            return Err(AppError::Conflict("Record already exists".into()));
        }

        let mut entry = self
            .users
            .get_mut(&user.id)
            .ok_or_else(|| user_not_found(user.id))?;
        let stored = &mut entry.value_mut().1;
        stored.email = user.email.clone();
        stored.full_name = user.full_name.clone();
        stored.date_of_birth = user.date_of_birth;
        stored.location = user.location.clone();
        stored.gender = user.gender;
        stored.updated_at = Utc::now();
        Ok(public(stored))
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<(), AppError> {
        self.users
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| user_not_found(id))
    }

    async fn get_page(&self, pageable: &Pageable) -> Result<Page<User>, AppError> {
        pageable.sort.ensure_sortable(USER_SORTABLE_COLUMNS)?;

        let mut rows: Vec<(u64, User)> = self
            .users
            .iter()
            .map(|entry| {
                let (seq, user) = entry.value();
                (*seq, public(user))
            })
            .collect();
        let total = rows.len() as u64;

        if pageable.size == 0 {
            return Ok(Page::new(Vec::new(), total, pageable.size));
        }

        if pageable.sort.is_empty() {
            rows.sort_by_key(|(seq, _)| *seq);
        } else {
            rows.sort_by(|(_, a), (_, b)| {
                pageable
                    .sort
                    .orders()
                    .iter()
                    .map(|order| compare(a, b, order))
                    .find(|ordering| ordering.is_ne())
                    .unwrap_or_else(|| a.id.cmp(&b.id))
            });
        }

        let offset = usize::try_from(pageable.offset).unwrap_or(usize::MAX);
        let elements = rows
            .into_iter()
            .skip(offset)
            .take(pageable.size as usize)
            .map(|(_, user)| user)
            .collect();

        Ok(Page::new(elements, total, pageable.size))
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.iter().find_map(|entry| {
            let user = &entry.value().1;
            match &user.credentials {
                Some(credentials) if credentials.username == username => Some(user.clone()),
                _ => None,
            }
        }))
    }

    async fn change_password(&self, user_id: Uuid, password_hash: &str) -> Result<(), AppError> {
        let mut entry = self
            .users
            .get_mut(&user_id)
            .ok_or_else(|| user_not_found(user_id))?;
        let user = &mut entry.value_mut().1;
        let now = Utc::now();
        let credentials = user
            .credentials
            .as_mut()
            .ok_or_else(|| user_not_found(user_id))?;
        credentials.password_hash = password_hash.to_string();
        credentials.updated_at = now;
        user.updated_at = now;
        Ok(())
    }

    async fn add_roles(&self, user_id: Uuid, roles: &[String]) -> Result<(), AppError> {
        let mut entry = self
            .users
            .get_mut(&user_id)
            .ok_or_else(|| user_not_found(user_id))?;
        if roles.is_empty() {
            return Ok(());
        }
        let user = &mut entry.value_mut().1;
        user.roles.extend(roles.iter().cloned());
        user.roles.sort();
        user.roles.dedup();
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn remove_roles(&self, user_id: Uuid, roles: &[String]) -> Result<(), AppError> {
        let mut entry = self
            .users
            .get_mut(&user_id)
            .ok_or_else(|| user_not_found(user_id))?;
        if roles.is_empty() {
            return Ok(());
        }
        let user = &mut entry.value_mut().1;
        user.roles.retain(|role| !roles.contains(role));
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn enable_disable(&self, user_id: Uuid) -> Result<bool, AppError> {
        let mut entry = self
            .users
            .get_mut(&user_id)
            .ok_or_else(|| user_not_found(user_id))?;
        let user = &mut entry.value_mut().1;
        user.enabled = !user.enabled;
        user.updated_at = Utc::now();
        Ok(user.enabled)
    }
}
