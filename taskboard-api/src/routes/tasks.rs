/// Task endpoints
///
/// # Endpoints
///
/// - `GET    /api/v1/tasks/` - List all tasks (paginated)
/// - `GET    /api/v1/tasks/my/` - List the caller's tasks (paginated)
/// - `POST   /api/v1/tasks/` - Create a task (caller becomes author)
/// - `GET    /api/v1/tasks/{id}/` - Fetch one task
/// - `PUT    /api/v1/tasks/{id}/` - Full update (author only)
/// - `PATCH  /api/v1/tasks/{id}/` - Partial update (author only)
/// - `DELETE /api/v1/tasks/{id}/` - Delete (author only)
///
/// All routes sit behind the bearer-auth middleware; handlers receive the
/// authenticated caller through the `AuthUser` extension. Reads are open to
/// any authenticated user, mutations check the author rule after loading
/// the task, so a non-author sees 403 even for an invalid body.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    pagination::{Page, PageQuery, Pagination},
    serializers::{validate_task_write, TaskResponse, TaskWritePayload},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use taskboard_shared::{
    auth::{authorization::ensure_author, middleware::AuthUser},
    models::task::{CreateTask, Task, UpdateTask},
};
use uuid::Uuid;

const TASKS_PATH: &str = "/api/v1/tasks/";
const MY_TASKS_PATH: &str = "/api/v1/tasks/my/";

/// List all tasks, newest-created-first
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(_caller): Extension<AuthUser>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<TaskResponse>>> {
    let pagination = Pagination::from_query(&query, state.config.api.page_size)?;

    let count = Task::count(&state.db).await?;
    let tasks = Task::list(&state.db, pagination.limit(), pagination.offset()).await?;

    let results = serialize_page(&state, tasks).await?;
    let page = pagination.build(TASKS_PATH, count, results)?;

    Ok(Json(page))
}

/// List the tasks authored by the caller, newest-created-first
pub async fn list_my_tasks(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<TaskResponse>>> {
    let pagination = Pagination::from_query(&query, state.config.api.page_size)?;

    let count = Task::count_by_author(&state.db, caller.id).await?;
    let tasks = Task::list_by_author(
        &state.db,
        caller.id,
        pagination.limit(),
        pagination.offset(),
    )
    .await?;

    let results = serialize_page(&state, tasks).await?;
    let page = pagination.build(MY_TASKS_PATH, count, results)?;

    Ok(Json(page))
}

/// Fetch a single task by ID
pub async fn get_task(
    State(state): State<AppState>,
    Extension(_caller): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskResponse>> {
    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(ApiError::not_found)?;

    let performers = Task::performers(&state.db, task.id).await?;

    Ok(Json(TaskResponse::new(task, performers)))
}

/// Create a task
///
/// The caller becomes the author regardless of anything in the request
/// body; `created` is assigned by the server.
pub async fn create_task(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Json(payload): Json<TaskWritePayload>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    let validated = validate_task_write(&state.db, &payload, false).await?;

    let (Some(title), Some(description), Some(finished), Some(performers)) = (
        validated.title,
        validated.description,
        validated.finished,
        validated.performers,
    ) else {
        return Err(ApiError::Internal(
            "Full task write validated with missing fields".to_string(),
        ));
    };

    let task = Task::create(
        &state.db,
        CreateTask {
            author_id: caller.id,
            title,
            description,
            finished,
            file: validated.file.flatten(),
            performers,
        },
    )
    .await?;

    tracing::info!(task_id = %task.id, author_id = %caller.id, "Task created");

    let performers = Task::performers(&state.db, task.id).await?;

    Ok((StatusCode::CREATED, Json(TaskResponse::new(task, performers))))
}

/// Full update (PUT): every required field must be present
pub async fn replace_task(
    state: State<AppState>,
    caller: Extension<AuthUser>,
    id: Path<Uuid>,
    payload: Option<Json<TaskWritePayload>>,
) -> ApiResult<Json<TaskResponse>> {
    update_task(state, caller, id, payload, false).await
}

/// Partial update (PATCH): only supplied fields are validated and written
pub async fn patch_task(
    state: State<AppState>,
    caller: Extension<AuthUser>,
    id: Path<Uuid>,
    payload: Option<Json<TaskWritePayload>>,
) -> ApiResult<Json<TaskResponse>> {
    update_task(state, caller, id, payload, true).await
}

/// Shared update path for PUT and PATCH
///
/// The body is extracted as `Option` so that existence and authorship are
/// settled before any validation: a non-author probing with an empty or
/// garbled body still gets the 403.
async fn update_task(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    payload: Option<Json<TaskWritePayload>>,
    partial: bool,
) -> ApiResult<Json<TaskResponse>> {
    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(ApiError::not_found)?;

    ensure_author(&task, caller.id)?;

    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let validated = validate_task_write(&state.db, &payload, partial).await?;

    let updated = Task::update(
        &state.db,
        task.id,
        UpdateTask {
            title: validated.title,
            description: validated.description,
            finished: validated.finished,
            file: validated.file,
            performers: validated.performers,
        },
    )
    .await?
    .ok_or_else(ApiError::not_found)?;

    tracing::info!(task_id = %updated.id, author_id = %caller.id, "Task updated");

    let performers = Task::performers(&state.db, updated.id).await?;

    Ok(Json(TaskResponse::new(updated, performers)))
}

/// Delete a task (author only)
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(ApiError::not_found)?;

    ensure_author(&task, caller.id)?;

    Task::delete(&state.db, task.id).await?;

    tracing::info!(task_id = %task.id, author_id = %caller.id, "Task deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Fetches and groups performer usernames for a page of tasks
async fn serialize_page(state: &AppState, tasks: Vec<Task>) -> ApiResult<Vec<TaskResponse>> {
    let task_ids: Vec<Uuid> = tasks.iter().map(|t| t.id).collect();
    let pairs = Task::performers_by_task(&state.db, &task_ids).await?;

    Ok(TaskResponse::from_page(tasks, pairs))
}
