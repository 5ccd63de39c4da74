/// Integration tests for the user model
///
/// Covers the parts of the user model with no HTTP surface of their own:
/// listing order for back-office tooling and the author-null cascade on
/// account deletion. Requires DATABASE_URL and JWT_SECRET.

mod common;

use common::TestContext;
use taskboard_shared::models::task::{CreateTask, Task};
use taskboard_shared::models::user::User;

#[tokio::test]
async fn test_user_listing_is_newest_joined_first() {
    let ctx = TestContext::new().await.unwrap();

    let older = common::create_test_user(&ctx.db, "Joined First").await.unwrap();
    let newer = common::create_test_user(&ctx.db, "Joined Second").await.unwrap();

    let count = User::count(&ctx.db).await.unwrap();
    assert!(count >= 2);

    // The database is shared across tests, so compare relative positions
    // rather than absolute ones.
    let listed = User::list(&ctx.db, count, 0).await.unwrap();
    let position = |id| listed.iter().position(|u| u.id == id);

    let older_pos = position(older.id).expect("older user should be listed");
    let newer_pos = position(newer.id).expect("newer user should be listed");
    assert!(newer_pos < older_pos, "newest-joined user must come first");

    User::delete(&ctx.db, older.id).await.unwrap();
    User::delete(&ctx.db, newer.id).await.unwrap();
    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_deleting_author_nulls_task_reference() {
    let ctx = TestContext::new().await.unwrap();

    let author = common::create_test_user(&ctx.db, "To Be Deleted").await.unwrap();

    let task = Task::create(
        &ctx.db,
        CreateTask {
            author_id: author.id,
            title: "Survives its author".to_string(),
            description: "Author reference goes NULL on account deletion".to_string(),
            finished: "2024-09-13".parse().unwrap(),
            file: None,
            performers: vec![ctx.user_2.id],
        },
    )
    .await
    .unwrap();

    assert_eq!(task.author_id, Some(author.id));
    assert_eq!(task.author_username.as_deref(), Some(author.username.as_str()));

    assert!(User::delete(&ctx.db, author.id).await.unwrap());

    let orphaned = Task::find_by_id(&ctx.db, task.id).await.unwrap().unwrap();
    assert_eq!(orphaned.author_id, None);
    assert_eq!(orphaned.author_username, None);

    // Performer assignments are untouched by the author's deletion
    let performers = Task::performers(&ctx.db, task.id).await.unwrap();
    assert_eq!(performers, vec![ctx.user_2.username.clone()]);

    Task::delete(&ctx.db, task.id).await.unwrap();
    ctx.cleanup().await.unwrap();
}
