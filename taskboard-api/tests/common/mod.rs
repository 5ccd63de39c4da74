/// Common test utilities for integration tests
///
/// Shared infrastructure for the API integration tests:
/// - Test database setup (connection + migrations)
/// - Test user creation with hashed passwords
/// - Bearer token minting
/// - Request/response helpers driving the router directly
///
/// Tests share one database, so every test creates its own users with
/// unique usernames and cleans them up afterwards.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use sqlx::PgPool;
use taskboard_api::app::{build_router, AppState};
use taskboard_api::config::Config;
use taskboard_shared::auth::jwt::{create_token, Claims};
use taskboard_shared::auth::password::hash_password;
use taskboard_shared::models::user::{CreateUser, User};
use tower::Service as _;
use uuid::Uuid;

/// Default password used for test accounts
pub const TEST_PASSWORD: &str = "test_password";

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub config: Config,
    pub user_1: User,
    pub user_2: User,
}

impl TestContext {
    /// Creates a new test context with two registered users
    pub async fn new() -> anyhow::Result<Self> {
        let config = Config::from_env()?;

        let db = PgPool::connect(&config.database.url).await?;

        // Path relative to the crate's Cargo.toml
        sqlx::migrate!("../migrations").run(&db).await?;

        let user_1 = create_test_user(&db, "Test Testov").await?;
        let user_2 = create_test_user(&db, "Other Person").await?;

        let state = AppState::new(db.clone(), config.clone());
        let app = build_router(state);

        Ok(TestContext {
            db,
            app,
            config,
            user_1,
            user_2,
        })
    }

    /// Mints a bearer token for the given user
    pub fn token_for(&self, user: &User) -> String {
        let claims = Claims::new(user.id, self.config.token_lifetime());
        create_token(&claims, &self.config.jwt.secret).expect("token should be created")
    }

    /// Sends a request through the router and decodes the JSON body
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .expect("request should build"),
            None => builder.body(Body::empty()).expect("request should build"),
        };

        let response = self
            .app
            .clone()
            .call(request)
            .await
            .expect("router should respond");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");

        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };

        (status, json)
    }

    /// Removes the rows created by this test (tasks cascade from users via
    /// the performer join; authored tasks are deleted explicitly)
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        for user in [&self.user_1, &self.user_2] {
            sqlx::query("DELETE FROM tasks WHERE author_id = $1")
                .bind(user.id)
                .execute(&self.db)
                .await?;
            User::delete(&self.db, user.id).await?;
        }
        Ok(())
    }
}

/// Creates a user with a unique username and the default test password
pub async fn create_test_user(db: &PgPool, full_name: &str) -> anyhow::Result<User> {
    let user = User::create(
        db,
        CreateUser {
            username: format!("test-user-{}", Uuid::new_v4()),
            password_hash: hash_password(TEST_PASSWORD)?,
            full_name: full_name.to_string(),
        },
    )
    .await?;

    Ok(user)
}

/// Creates a task for `author` through the API and returns its JSON
pub async fn create_task_via_api(
    ctx: &TestContext,
    author: &User,
    title: &str,
    performers: Vec<String>,
) -> serde_json::Value {
    let token = ctx.token_for(author);
    let (status, json) = ctx
        .request(
            Method::POST,
            "/api/v1/tasks/",
            Some(&token),
            Some(serde_json::json!({
                "title": title,
                "description": format!("Description of {}", title),
                "finished": "2024-09-13",
                "performers": performers,
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "task creation failed: {}", json);
    json
}
