//! PostgreSQL implementation of the user repository.

use async_trait::async_trait;
use log::debug;
use sqlx::PgPool;
use uuid::Uuid;

use super::{user_not_found, Repository, UserRepository};
use crate::error::AppError;
use crate::models::{Credentials, User, USER_SORTABLE_COLUMNS};
use crate::pagination::{Page, Pageable, Sort};

const SELECT_USER: &str = "SELECT u.id, u.created_at, u.updated_at, u.email, u.full_name, \
     u.date_of_birth, u.location, u.gender, u.enabled, \
     ARRAY(SELECT r.name FROM roles r WHERE r.user_id = u.id ORDER BY r.name) AS roles \
     FROM users u";

const DEFAULT_ORDER: &str = "u.created_at ASC, u.id ASC";

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn ensure_exists(
        conn: &mut sqlx::PgConnection,
        user_id: Uuid,
    ) -> Result<(), AppError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&mut *conn)
            .await?;
        if !exists {
            return Err(user_not_found(user_id));
        }
        Ok(())
    }

    async fn touch(conn: &mut sqlx::PgConnection, user_id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

/// Builds the `ORDER BY` body for a user listing.
///
/// Properties must already be checked against `USER_SORTABLE_COLUMNS`. The
/// primary key is appended as a final tie-breaker so that pages are stable.
fn order_by_clause(sort: &Sort) -> String {
    if sort.is_empty() {
        return DEFAULT_ORDER.to_string();
    }
    let mut parts: Vec<String> = sort
        .stringify()
        .into_iter()
        .map(|order| format!("u.{}", order))
        .collect();
    if !sort.orders().iter().any(|order| order.property == "id") {
        parts.push("u.id ASC".to_string());
    }
    parts.join(", ")
}

#[async_trait]
impl Repository<Uuid, User> for PgUserRepository {
    async fn get_by_id(&self, id: Uuid) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(&format!("{} WHERE u.id = $1", SELECT_USER))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        user.ok_or_else(|| user_not_found(id))
    }

    async fn create(&self, user: &User) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO users (id, created_at, updated_at, email, full_name, date_of_birth, location, gender, enabled)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(user.id)
        .bind(user.created_at)
        .bind(user.updated_at)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(user.date_of_birth)
        .bind(&user.location)
        .bind(user.gender)
        .bind(user.enabled)
        .execute(&mut *tx)
        .await?;

        if let Some(credentials) = &user.credentials {
            sqlx::query(
                "INSERT INTO credentials (id, user_id, username, password_hash, created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(credentials.id)
            .bind(user.id)
            .bind(&credentials.username)
            .bind(&credentials.password_hash)
            .bind(credentials.created_at)
            .bind(credentials.updated_at)
            .execute(&mut *tx)
            .await?;
        }

        for role in &user.roles {
            sqlx::query(
                "INSERT INTO roles (id, user_id, name) VALUES ($1, $2, $3)
                 ON CONFLICT (user_id, name) DO NOTHING",
            )
            .bind(Uuid::new_v4())
            .bind(user.id)
            .bind(role)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!("Created user {}", user.id);
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<User, AppError> {
        let result = sqlx::query(
            "UPDATE users
             SET email = $1, full_name = $2, date_of_birth = $3, location = $4, gender = $5, updated_at = NOW()
             WHERE id = $6",
        )
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(user.date_of_birth)
        .bind(&user.location)
        .bind(user.gender)
        .bind(user.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(user_not_found(user.id));
        }
        self.get_by_id(user.id).await
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(user_not_found(id));
        }
        Ok(())
    }

    async fn get_page(&self, pageable: &Pageable) -> Result<Page<User>, AppError> {
        pageable.sort.ensure_sortable(USER_SORTABLE_COLUMNS)?;

        let get_page_err = |e: sqlx::Error| AppError::GetPage(e.to_string());

        // Count and fetch share one snapshot.
        let mut tx = self.pool.begin().await.map_err(get_page_err)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(get_page_err)?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&mut *tx)
            .await
            .map_err(get_page_err)?;

        let elements = if pageable.size == 0 {
            Vec::new()
        } else {
            let sql = format!(
                "{} ORDER BY {} LIMIT $1 OFFSET $2",
                SELECT_USER,
                order_by_clause(&pageable.sort)
            );
            sqlx::query_as::<_, User>(&sql)
                .bind(pageable.limit())
                .bind(pageable.sql_offset())
                .fetch_all(&mut *tx)
                .await
                .map_err(get_page_err)?
        };

        tx.commit().await.map_err(get_page_err)?;

        Ok(Page::new(elements, total.max(0) as u64, pageable.size))
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn get_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let credentials = sqlx::query_as::<_, Credentials>(
            "SELECT id, user_id, username, password_hash, created_at, updated_at
             FROM credentials WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        match credentials {
            Some(credentials) => {
                let user = self.get_by_id(credentials.user_id).await?;
                Ok(Some(user.with_credentials(credentials)))
            }
            None => Ok(None),
        }
    }

    async fn change_password(&self, user_id: Uuid, password_hash: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE credentials SET password_hash = $1, updated_at = NOW() WHERE user_id = $2",
        )
        .bind(password_hash)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(user_not_found(user_id));
        }
        Self::touch(&mut tx, user_id).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn add_roles(&self, user_id: Uuid, roles: &[String]) -> Result<(), AppError> {
        if roles.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await?;
        Self::ensure_exists(&mut tx, user_id).await?;

        for role in roles {
            sqlx::query(
                "INSERT INTO roles (id, user_id, name) VALUES ($1, $2, $3)
                 ON CONFLICT (user_id, name) DO NOTHING",
            )
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(role)
            .execute(&mut *tx)
            .await?;
        }
        Self::touch(&mut tx, user_id).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn remove_roles(&self, user_id: Uuid, roles: &[String]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        Self::ensure_exists(&mut tx, user_id).await?;

        if !roles.is_empty() {
            sqlx::query("DELETE FROM roles WHERE user_id = $1 AND name = ANY($2)")
                .bind(user_id)
                .bind(roles)
                .execute(&mut *tx)
                .await?;
            Self::touch(&mut tx, user_id).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn enable_disable(&self, user_id: Uuid) -> Result<bool, AppError> {
        let enabled: Option<bool> = sqlx::query_scalar(
            "UPDATE users SET enabled = NOT enabled, updated_at = NOW() WHERE id = $1 RETURNING enabled",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        enabled.ok_or_else(|| user_not_found(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::{Direction, Order};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_order_by_defaults_to_creation_order() {
        assert_eq!(order_by_clause(&Sort::new()), "u.created_at ASC, u.id ASC");
    }

    #[test]
    fn test_order_by_appends_primary_key_tie_breaker() {
        let sort = Sort::by(vec![
            Order::asc("email"),
            Order::new("date_of_birth", Direction::DescNullsLast),
        ]);
        assert_eq!(
            order_by_clause(&sort),
            "u.email ASC, u.date_of_birth DESC NULLS LAST, u.id ASC"
        );

        let sort = Sort::by(vec![Order::desc("id")]);
        assert_eq!(order_by_clause(&sort), "u.id DESC");
    }
}
