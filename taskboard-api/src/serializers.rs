/// Wire representations and validation
///
/// This module converts between the JSON wire format and the entity types:
/// request payloads with per-field validation, and response shapes.
///
/// Validation follows two rules everywhere:
///
/// 1. Every check runs; failures are collected per field and returned in
///    one response, never short-circuited to the first error.
/// 2. Missing fields and blank fields are distinct conditions with distinct
///    messages ("This field is required." vs "This field may not be
///    blank."), which is why request payloads model every field as an
///    `Option` and presence is checked by hand rather than by serde.
///
/// Declarative length bounds use the `validator` derive; cross-entity
/// checks (username uniqueness, performer resolution) query the database.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, ValidationErrors};
use taskboard_shared::models::task::Task;
use taskboard_shared::models::user::User;

pub const MSG_REQUIRED: &str = "This field is required.";
pub const MSG_BLANK: &str = "This field may not be blank.";
pub const MSG_EMPTY_LIST: &str = "This list may not be empty.";
pub const MSG_BAD_DATE: &str =
    "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.";
pub const MSG_USERNAME_TAKEN: &str = "A user with that username already exists.";
pub const MSG_WRONG_PASSWORD: &str = "Incorrect password.";

/// Folds `validator` derive results into the per-field error map
fn merge_validator_errors(errors: &mut ValidationErrors, result: validator::ValidationErrors) {
    for (field, field_errors) in result.field_errors() {
        for error in field_errors {
            let message = error
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| "Invalid value.".to_string());
            errors.add(field, message);
        }
    }
}

/// Deserializes a field into `Some(value)` even when the value is null,
/// so "absent" and "explicitly null" stay distinguishable.
fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

/// Registration request body
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Desired username
    #[validate(length(
        max = 150,
        message = "Ensure this field has no more than 150 characters."
    ))]
    pub username: Option<String>,

    /// Plaintext password (hashed before storage, never echoed back)
    pub password: Option<String>,

    /// Full display name
    #[validate(length(
        max = 30,
        message = "Ensure this field has no more than 30 characters."
    ))]
    pub full_name: Option<String>,
}

/// A registration payload that passed validation
#[derive(Debug, Clone)]
pub struct ValidatedRegistration {
    pub username: String,
    pub password: String,
    pub full_name: String,
}

/// Validates a registration request
///
/// Checks, all evaluated: each field present and non-blank, length bounds,
/// and username not already taken (the database unique constraint still
/// backstops concurrent registrations).
pub async fn validate_register(
    pool: &PgPool,
    req: &RegisterRequest,
) -> Result<ValidatedRegistration, ApiError> {
    let mut errors = ValidationErrors::new();

    if let Err(e) = req.validate() {
        merge_validator_errors(&mut errors, e);
    }

    match req.username.as_deref() {
        None => errors.add("username", MSG_REQUIRED),
        Some(u) if u.trim().is_empty() => errors.add("username", MSG_BLANK),
        Some(u) => {
            if User::find_by_username(pool, u).await?.is_some() {
                errors.add("username", MSG_USERNAME_TAKEN);
            }
        }
    }

    match req.password.as_deref() {
        None => errors.add("password", MSG_REQUIRED),
        Some(p) if p.trim().is_empty() => errors.add("password", MSG_BLANK),
        Some(_) => {}
    }

    match req.full_name.as_deref() {
        None => errors.add("full_name", MSG_REQUIRED),
        Some(n) if n.trim().is_empty() => errors.add("full_name", MSG_BLANK),
        Some(_) => {}
    }

    errors.into_result()?;

    match (&req.username, &req.password, &req.full_name) {
        (Some(username), Some(password), Some(full_name)) => Ok(ValidatedRegistration {
            username: username.clone(),
            password: password.clone(),
            full_name: full_name.clone(),
        }),
        _ => Err(ApiError::Internal(
            "Validated registration with missing fields".to_string(),
        )),
    }
}

/// Token issuance request body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenRequest {
    /// Username of the account
    pub username: Option<String>,

    /// Plaintext password to verify
    pub password: Option<String>,
}

/// Credentials extracted from a valid token request
#[derive(Debug, Clone)]
pub struct ValidatedCredentials {
    pub username: String,
    pub password: String,
}

/// Validates a token issuance request (presence and blankness only —
/// whether the credentials are correct is decided by the handler)
pub fn validate_token_request(req: &TokenRequest) -> Result<ValidatedCredentials, ApiError> {
    let mut errors = ValidationErrors::new();

    match req.username.as_deref() {
        None => errors.add("username", MSG_REQUIRED),
        Some(u) if u.trim().is_empty() => errors.add("username", MSG_BLANK),
        Some(_) => {}
    }

    match req.password.as_deref() {
        None => errors.add("password", MSG_REQUIRED),
        Some(p) if p.trim().is_empty() => errors.add("password", MSG_BLANK),
        Some(_) => {}
    }

    errors.into_result()?;

    match (&req.username, &req.password) {
        (Some(username), Some(password)) => Ok(ValidatedCredentials {
            username: username.clone(),
            password: password.clone(),
        }),
        _ => Err(ApiError::Internal(
            "Validated credentials with missing fields".to_string(),
        )),
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Task create/update request body
///
/// Shared by POST (all required fields must be present), PUT (same) and
/// PATCH (any subset). Client-supplied `author` or `created` values are
/// simply not modeled here and therefore ignored.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct TaskWritePayload {
    /// Task title
    #[validate(length(
        max = 200,
        message = "Ensure this field has no more than 200 characters."
    ))]
    pub title: Option<String>,

    /// Task description
    #[validate(length(
        max = 400,
        message = "Ensure this field has no more than 400 characters."
    ))]
    pub description: Option<String>,

    /// Planned completion date, `YYYY-MM-DD`
    pub finished: Option<String>,

    /// Performer usernames (must be non-empty and all resolvable)
    pub performers: Option<Vec<String>>,

    /// Optional attachment reference; explicit null clears it
    #[serde(default, deserialize_with = "double_option")]
    pub file: Option<Option<String>>,
}

/// A task write that passed validation
///
/// Fields absent from a partial update stay `None`; a full write has every
/// required field populated. Performer usernames are resolved to user IDs,
/// deduplicated, in request order.
#[derive(Debug, Clone, Default)]
pub struct ValidatedTaskWrite {
    pub title: Option<String>,
    pub description: Option<String>,
    pub finished: Option<NaiveDate>,
    pub file: Option<Option<String>>,
    pub performers: Option<Vec<Uuid>>,
}

/// Validates a task write payload
///
/// With `partial = false` (create, PUT) absent required fields are errors;
/// with `partial = true` (PATCH) only supplied fields are checked. All
/// failures are collected per field.
pub async fn validate_task_write(
    pool: &PgPool,
    payload: &TaskWritePayload,
    partial: bool,
) -> Result<ValidatedTaskWrite, ApiError> {
    let mut errors = ValidationErrors::new();
    let mut validated = ValidatedTaskWrite {
        file: payload.file.clone(),
        ..Default::default()
    };

    if let Err(e) = payload.validate() {
        merge_validator_errors(&mut errors, e);
    }

    match payload.title.as_deref() {
        None if !partial => errors.add("title", MSG_REQUIRED),
        None => {}
        Some(t) if t.trim().is_empty() => errors.add("title", MSG_BLANK),
        Some(t) => validated.title = Some(t.to_string()),
    }

    match payload.description.as_deref() {
        None if !partial => errors.add("description", MSG_REQUIRED),
        None => {}
        Some(d) if d.trim().is_empty() => errors.add("description", MSG_BLANK),
        Some(d) => validated.description = Some(d.to_string()),
    }

    match payload.finished.as_deref() {
        None if !partial => errors.add("finished", MSG_REQUIRED),
        None => {}
        Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => validated.finished = Some(date),
            Err(_) => errors.add("finished", MSG_BAD_DATE),
        },
    }

    match &payload.performers {
        None if !partial => errors.add("performers", MSG_REQUIRED),
        None => {}
        Some(names) if names.is_empty() => errors.add("performers", MSG_EMPTY_LIST),
        Some(names) => {
            let users = User::find_by_usernames(pool, names).await?;
            let by_name: HashMap<&str, Uuid> =
                users.iter().map(|u| (u.username.as_str(), u.id)).collect();

            let mut ids = Vec::new();
            let mut seen = HashSet::new();
            let mut all_resolved = true;

            for name in names {
                match by_name.get(name.as_str()) {
                    Some(id) => {
                        if seen.insert(*id) {
                            ids.push(*id);
                        }
                    }
                    None => {
                        all_resolved = false;
                        errors.add(
                            "performers",
                            format!("Object with username={} does not exist.", name),
                        );
                    }
                }
            }

            if all_resolved {
                validated.performers = Some(ids);
            }
        }
    }

    errors.into_result()?;

    Ok(validated)
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// User representation returned by the registration endpoint
///
/// The password (hash) never appears in responses.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub username: String,
    pub full_name: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            full_name: user.full_name,
        }
    }
}

/// Token issuance response
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Task representation returned by all task endpoints
///
/// The author appears as a username (null if the account was deleted),
/// performers as a list of usernames. The creation timestamp is internal
/// and never serialized.
#[derive(Debug, Clone, Serialize)]
pub struct TaskResponse {
    pub id: Uuid,
    pub author: Option<String>,
    pub performers: Vec<String>,
    pub title: String,
    pub description: String,
    pub finished: NaiveDate,
    pub file: Option<String>,
}

impl TaskResponse {
    /// Combines a task row with its performer usernames
    pub fn new(task: Task, performers: Vec<String>) -> Self {
        Self {
            id: task.id,
            author: task.author_username,
            performers,
            title: task.title,
            description: task.description,
            finished: task.finished,
            file: task.file,
        }
    }

    /// Serializes a page of tasks, grouping a batch performer lookup
    /// (`(task_id, username)` pairs) back onto each task
    pub fn from_page(tasks: Vec<Task>, performer_pairs: Vec<(Uuid, String)>) -> Vec<Self> {
        let mut by_task: HashMap<Uuid, Vec<String>> = HashMap::new();
        for (task_id, username) in performer_pairs {
            by_task.entry(task_id).or_default().push(username);
        }

        tasks
            .into_iter()
            .map(|task| {
                let performers = by_task.remove(&task.id).unwrap_or_default();
                TaskResponse::new(task, performers)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_token_request_presence_checks() {
        let err = validate_token_request(&TokenRequest::default()).unwrap_err();
        match err {
            ApiError::Validation(errors) => {
                assert_eq!(errors.field("username").unwrap(), &[MSG_REQUIRED.to_string()]);
                assert_eq!(errors.field("password").unwrap(), &[MSG_REQUIRED.to_string()]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_token_request_blank_checks() {
        let req = TokenRequest {
            username: Some("".to_string()),
            password: Some("   ".to_string()),
        };
        let err = validate_token_request(&req).unwrap_err();
        match err {
            ApiError::Validation(errors) => {
                assert_eq!(errors.field("username").unwrap(), &[MSG_BLANK.to_string()]);
                assert_eq!(errors.field("password").unwrap(), &[MSG_BLANK.to_string()]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_token_request_valid() {
        let req = TokenRequest {
            username: Some("ivan".to_string()),
            password: Some("secret".to_string()),
        };
        let creds = validate_token_request(&req).unwrap();
        assert_eq!(creds.username, "ivan");
        assert_eq!(creds.password, "secret");
    }

    #[test]
    fn test_task_payload_deserializes_explicit_null_file() {
        let payload: TaskWritePayload =
            serde_json::from_str(r#"{"file": null}"#).unwrap();
        assert_eq!(payload.file, Some(None));

        let payload: TaskWritePayload = serde_json::from_str("{}").unwrap();
        assert_eq!(payload.file, None);

        let payload: TaskWritePayload =
            serde_json::from_str(r#"{"file": "/media/task/report.pdf"}"#).unwrap();
        assert_eq!(payload.file, Some(Some("/media/task/report.pdf".to_string())));
    }

    #[test]
    fn test_register_request_length_bounds() {
        let req = RegisterRequest {
            username: Some("a".repeat(151)),
            password: Some("pw".to_string()),
            full_name: Some("b".repeat(31)),
        };

        let mut errors = ValidationErrors::new();
        merge_validator_errors(&mut errors, req.validate().unwrap_err());

        assert_eq!(
            errors.field("username").unwrap(),
            &["Ensure this field has no more than 150 characters.".to_string()]
        );
        assert_eq!(
            errors.field("full_name").unwrap(),
            &["Ensure this field has no more than 30 characters.".to_string()]
        );
    }

    #[test]
    fn test_task_response_excludes_created() {
        let task = Task {
            id: Uuid::new_v4(),
            author_id: None,
            author_username: Some("ivan".to_string()),
            title: "Title".to_string(),
            description: "Description".to_string(),
            finished: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            file: None,
            created: Utc::now(),
        };

        let response = TaskResponse::new(task, vec!["petya".to_string()]);
        let json = serde_json::to_value(&response).unwrap();

        assert!(json.get("created").is_none());
        assert_eq!(json["author"], "ivan");
        assert_eq!(json["finished"], "2024-03-01");
        assert_eq!(json["performers"], serde_json::json!(["petya"]));
        assert_eq!(json["file"], serde_json::Value::Null);
    }

    #[test]
    fn test_from_page_groups_performers() {
        let t1 = Uuid::new_v4();
        let t2 = Uuid::new_v4();
        let mk = |id: Uuid, title: &str| Task {
            id,
            author_id: None,
            author_username: None,
            title: title.to_string(),
            description: "d".to_string(),
            finished: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            file: None,
            created: Utc::now(),
        };

        let pairs = vec![
            (t1, "anna".to_string()),
            (t2, "boris".to_string()),
            (t1, "clara".to_string()),
        ];

        let responses = TaskResponse::from_page(vec![mk(t1, "one"), mk(t2, "two")], pairs);

        assert_eq!(responses[0].performers, vec!["anna", "clara"]);
        assert_eq!(responses[1].performers, vec!["boris"]);
    }
}
