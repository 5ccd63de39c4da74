/// User model and database operations
///
/// Users register through the API and authenticate with username + password.
/// Passwords are stored as Argon2id hashes, never in plaintext.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     username VARCHAR(150) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     full_name VARCHAR(30) NOT NULL,
///     date_joined TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// User model representing an account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Username, unique across all users
    pub username: String,

    /// Argon2id password hash (PHC string format)
    ///
    /// Never serialized into API responses.
    pub password_hash: String,

    /// Full display name
    pub full_name: String,

    /// When the account was created
    pub date_joined: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Username (must be unique)
    pub username: String,

    /// Argon2id password hash (NOT the plaintext password)
    pub password_hash: String,

    /// Full display name
    pub full_name: String,
}

impl User {
    /// Creates a new user in the database
    ///
    /// # Errors
    ///
    /// Returns an error if the username already exists (unique constraint
    /// violation) or the database operation fails. Callers distinguish the
    /// duplicate case by inspecting the constraint name on the database
    /// error.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use taskboard_shared::models::user::{CreateUser, User};
    /// # use sqlx::PgPool;
    /// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
    /// let user = User::create(
    ///     &pool,
    ///     CreateUser {
    ///         username: "ivan".to_string(),
    ///         password_hash: "$argon2id$...".to_string(),
    ///         full_name: "Ivan Petrov".to_string(),
    ///     },
    /// )
    /// .await?;
    /// println!("Created user: {}", user.id);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash, full_name)
            VALUES ($1, $2, $3)
            RETURNING id, username, password_hash, full_name, date_joined
            "#,
        )
        .bind(data.username)
        .bind(data.password_hash)
        .bind(data.full_name)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, full_name, date_joined
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by username
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, full_name, date_joined
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Resolves a set of usernames to users
    ///
    /// Returns the users that exist; usernames with no account are simply
    /// absent from the result. Callers diff the input against the result to
    /// report unknown names.
    pub async fn find_by_usernames(
        pool: &PgPool,
        usernames: &[String],
    ) -> Result<Vec<Self>, sqlx::Error> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, full_name, date_joined
            FROM users
            WHERE username = ANY($1)
            "#,
        )
        .bind(usernames)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Lists users with pagination, newest-joined-first
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, full_name, date_joined
            FROM users
            ORDER BY date_joined DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Counts total number of users
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Deletes a user by ID
    ///
    /// Tasks authored by this user keep existing with a NULL author
    /// (ON DELETE SET NULL); performer assignments cascade away. There is no
    /// HTTP endpoint for this — it backs generic admin tooling.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
