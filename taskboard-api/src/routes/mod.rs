/// API route handlers
///
/// Handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration and token issuance
/// - `tasks`: Task CRUD plus the "my tasks" listing

pub mod auth;
pub mod health;
pub mod tasks;
