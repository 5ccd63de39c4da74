/// Authorization rule for task mutation
///
/// Taskboard has a single resource-level policy: any authenticated user may
/// read any task, but only the task's author may update or delete it. The
/// check runs per mutating request, after authentication and after the task
/// has been loaded.

use uuid::Uuid;

use crate::models::task::Task;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Caller is not the author of the task
    #[error("You do not have permission to perform this action.")]
    NotAuthor,
}

/// Checks that the caller is the author of the task
///
/// Fails for non-authors and for tasks whose author account was deleted
/// (a NULL author means nobody holds write rights any more).
pub fn ensure_author(task: &Task, caller_id: Uuid) -> Result<(), AuthzError> {
    match task.author_id {
        Some(author_id) if author_id == caller_id => Ok(()),
        _ => Err(AuthzError::NotAuthor),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn task_with_author(author_id: Option<Uuid>) -> Task {
        Task {
            id: Uuid::new_v4(),
            author_id,
            author_username: author_id.map(|_| "author".to_string()),
            title: "Title".to_string(),
            description: "Description".to_string(),
            finished: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            file: None,
            created: Utc::now(),
        }
    }

    #[test]
    fn test_author_is_allowed() {
        let caller = Uuid::new_v4();
        let task = task_with_author(Some(caller));

        assert!(ensure_author(&task, caller).is_ok());
    }

    #[test]
    fn test_non_author_is_rejected() {
        let task = task_with_author(Some(Uuid::new_v4()));

        assert!(matches!(
            ensure_author(&task, Uuid::new_v4()),
            Err(AuthzError::NotAuthor)
        ));
    }

    #[test]
    fn test_orphaned_task_rejects_everyone() {
        let task = task_with_author(None);

        assert!(ensure_author(&task, Uuid::new_v4()).is_err());
    }
}
