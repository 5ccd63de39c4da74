/// Task model and database operations
///
/// Tasks are the core entity of Taskboard: a title, a description, a planned
/// completion date, an optional file attachment, one author and a set of
/// performers.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     author_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     title VARCHAR(200) NOT NULL,
///     description VARCHAR(400) NOT NULL,
///     finished DATE NOT NULL,
///     file VARCHAR(512),
///     created TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE task_performers (
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     PRIMARY KEY (task_id, user_id)
/// );
/// ```
///
/// The author reference is nullable: deleting a user account leaves their
/// tasks in place with `author_id = NULL`. Every SELECT joins the author's
/// username so responses can carry it without a second lookup.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Task model with the author's username resolved
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// User who created the task (NULL if the account was deleted)
    pub author_id: Option<Uuid>,

    /// Username of the author, resolved via join
    pub author_username: Option<String>,

    /// Task title
    pub title: String,

    /// Task description
    pub description: String,

    /// Planned completion date
    pub finished: NaiveDate,

    /// Optional attachment reference
    pub file: Option<String>,

    /// When the task was created (server-assigned, immutable)
    pub created: DateTime<Utc>,
}

/// Input for creating a new task
///
/// `author_id` always comes from the authenticated caller, never from the
/// request body. Performers are already resolved to user IDs.
#[derive(Debug, Clone)]
pub struct CreateTask {
    /// Authenticated caller who becomes the author
    pub author_id: Uuid,

    /// Task title
    pub title: String,

    /// Task description
    pub description: String,

    /// Planned completion date
    pub finished: NaiveDate,

    /// Optional attachment reference
    pub file: Option<String>,

    /// Assigned performer user IDs (must be non-empty)
    pub performers: Vec<Uuid>,
}

/// Input for updating an existing task
///
/// All fields are optional; only present fields are written. The author and
/// creation timestamp are not updatable.
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    /// New title
    pub title: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New planned completion date
    pub finished: Option<NaiveDate>,

    /// New attachment reference (use Some(None) to clear)
    pub file: Option<Option<String>>,

    /// Replacement performer set
    pub performers: Option<Vec<Uuid>>,
}

impl Task {
    /// Creates a new task together with its performer assignments
    ///
    /// The task row and the performer rows are written in one transaction,
    /// so a failure leaves no partial record.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use taskboard_shared::models::task::{CreateTask, Task};
    /// # use sqlx::PgPool;
    /// # use uuid::Uuid;
    /// # async fn example(pool: PgPool, author: Uuid, performer: Uuid) -> Result<(), sqlx::Error> {
    /// let task = Task::create(
    ///     &pool,
    ///     CreateTask {
    ///         author_id: author,
    ///         title: "Ship release".to_string(),
    ///         description: "Cut the 1.0 release".to_string(),
    ///         finished: "2024-03-01".parse().unwrap(),
    ///         file: None,
    ///         performers: vec![performer],
    ///     },
    /// )
    /// .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO tasks (author_id, title, description, finished, file)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(data.author_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.finished)
        .bind(data.file)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO task_performers (task_id, user_id)
            SELECT $1, unnest($2::uuid[])
            "#,
        )
        .bind(id)
        .bind(data.performers)
        .execute(&mut *tx)
        .await?;

        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT t.id, t.author_id, u.username AS author_username,
                   t.title, t.description, t.finished, t.file, t.created
            FROM tasks t
            LEFT JOIN users u ON u.id = t.author_id
            WHERE t.id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT t.id, t.author_id, u.username AS author_username,
                   t.title, t.description, t.finished, t.file, t.created
            FROM tasks t
            LEFT JOIN users u ON u.id = t.author_id
            WHERE t.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Updates a task, replacing the performer set when one is supplied
    ///
    /// Only fields present in `data` are written; the UPDATE statement is
    /// built dynamically from them. Returns the refreshed task, or `None`
    /// if no task with that ID exists.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let mut assignments = Vec::new();
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            assignments.push(format!("title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            assignments.push(format!("description = ${}", bind_count));
        }
        if data.finished.is_some() {
            bind_count += 1;
            assignments.push(format!("finished = ${}", bind_count));
        }
        if data.file.is_some() {
            bind_count += 1;
            assignments.push(format!("file = ${}", bind_count));
        }

        if !assignments.is_empty() {
            let query = format!(
                "UPDATE tasks SET {} WHERE id = $1",
                assignments.join(", ")
            );

            let mut q = sqlx::query(&query).bind(id);

            if let Some(title) = data.title {
                q = q.bind(title);
            }
            if let Some(description) = data.description {
                q = q.bind(description);
            }
            if let Some(finished) = data.finished {
                q = q.bind(finished);
            }
            if let Some(file) = data.file {
                q = q.bind(file);
            }

            let result = q.execute(&mut *tx).await?;
            if result.rows_affected() == 0 {
                return Ok(None);
            }
        }

        if let Some(performers) = data.performers {
            sqlx::query("DELETE FROM task_performers WHERE task_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;

            sqlx::query(
                r#"
                INSERT INTO task_performers (task_id, user_id)
                SELECT $1, unnest($2::uuid[])
                "#,
            )
            .bind(id)
            .bind(performers)
            .execute(&mut *tx)
            .await?;
        }

        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT t.id, t.author_id, u.username AS author_username,
                   t.title, t.description, t.finished, t.file, t.created
            FROM tasks t
            LEFT JOIN users u ON u.id = t.author_id
            WHERE t.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(task)
    }

    /// Deletes a task
    ///
    /// Performer assignments are removed by CASCADE.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists tasks with pagination, newest-created-first
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT t.id, t.author_id, u.username AS author_username,
                   t.title, t.description, t.finished, t.file, t.created
            FROM tasks t
            LEFT JOIN users u ON u.id = t.author_id
            ORDER BY t.created DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Lists tasks authored by one user, newest-created-first
    pub async fn list_by_author(
        pool: &PgPool,
        author_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT t.id, t.author_id, u.username AS author_username,
                   t.title, t.description, t.finished, t.file, t.created
            FROM tasks t
            LEFT JOIN users u ON u.id = t.author_id
            WHERE t.author_id = $1
            ORDER BY t.created DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(author_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Counts all tasks
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Counts tasks authored by one user
    pub async fn count_by_author(pool: &PgPool, author_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Fetches the performer usernames of one task
    pub async fn performers(pool: &PgPool, task_id: Uuid) -> Result<Vec<String>, sqlx::Error> {
        let usernames = sqlx::query_scalar::<_, String>(
            r#"
            SELECT u.username
            FROM task_performers tp
            JOIN users u ON u.id = tp.user_id
            WHERE tp.task_id = $1
            ORDER BY u.username
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await?;

        Ok(usernames)
    }

    /// Fetches performer usernames for a batch of tasks in one query
    ///
    /// Returns `(task_id, username)` pairs; callers group them per task.
    /// Used when serializing a page of tasks to avoid a query per row.
    pub async fn performers_by_task(
        pool: &PgPool,
        task_ids: &[Uuid],
    ) -> Result<Vec<(Uuid, String)>, sqlx::Error> {
        let rows = sqlx::query_as::<_, (Uuid, String)>(
            r#"
            SELECT tp.task_id, u.username
            FROM task_performers tp
            JOIN users u ON u.id = tp.user_id
            WHERE tp.task_id = ANY($1)
            ORDER BY u.username
            "#,
        )
        .bind(task_ids)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_task_default_is_empty() {
        let update = UpdateTask::default();
        assert!(update.title.is_none());
        assert!(update.description.is_none());
        assert!(update.finished.is_none());
        assert!(update.file.is_none());
        assert!(update.performers.is_none());
    }

    #[test]
    fn test_create_task_struct() {
        let author = Uuid::new_v4();
        let performer = Uuid::new_v4();
        let create = CreateTask {
            author_id: author,
            title: "Title".to_string(),
            description: "Description".to_string(),
            finished: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            file: None,
            performers: vec![performer],
        };

        assert_eq!(create.author_id, author);
        assert_eq!(create.performers, vec![performer]);
    }

    // Database-backed tests live in the taskboard-api tests/ directory.
}
