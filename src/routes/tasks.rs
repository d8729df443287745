use crate::{
    error::AppError,
    models::{TaskInput, TaskUpdate},
    routes::parse_body,
    state::AppState,
};
use actix_web::{delete, get, post, route, web, HttpResponse, Responder};
use serde_json::Value;
use validator::Validate;

fn not_found() -> AppError {
    AppError::NotFound("Task not found".into())
}

/// Retrieves every task, oldest first.
#[get("/tasks")]
pub async fn get_tasks(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let tasks = state.tasks.list().await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Retrieves the tasks whose `is_completed` flag is `false`.
#[get("/pending-list")]
pub async fn pending_list(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let tasks = state.tasks.list_pending().await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a new task.
///
/// ## Request Body:
/// - `title`: required, at most 255 characters.
/// - `is_completed` (optional): defaults to `false`.
///
/// ## Responses:
/// - `201 Created`: Returns the newly created `Task` object as JSON.
/// - `422 Unprocessable Entity`: If input validation on `TaskInput` fails.
/// - `500 Internal Server Error`: For database errors or other unexpected issues.
#[post("/tasks")]
pub async fn create_task(
    state: web::Data<AppState>,
    body: web::Json<Value>,
) -> Result<impl Responder, AppError> {
    let task_data: TaskInput = parse_body(body.into_inner())?;
    task_data.validate()?;
    let task = state.tasks.create(task_data.into_new_task()).await?;
    Ok(HttpResponse::Created().json(task))
}

/// Retrieves a specific task by its ID.
///
/// ## Responses:
/// - `200 OK`: Returns the `Task` object as JSON.
/// - `404 Not Found`: `{"message": "Task not found"}`.
#[get("/tasks/{id}")]
pub async fn get_task(
    state: web::Data<AppState>,
    task_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let task = state.tasks.get(task_id.into_inner()).await?.ok_or_else(not_found)?;
    Ok(HttpResponse::Ok().json(task))
}

/// Marks a task as completed or pending.
///
/// ## Request Body:
/// - `is_completed`: required boolean.
///
/// ## Responses:
/// - `200 OK`: Returns the updated `Task` object as JSON.
/// - `404 Not Found`: If the task does not exist.
/// - `422 Unprocessable Entity`: If `is_completed` is missing or not a boolean. Checked
///   only once the task is known to exist.
#[route("/tasks/{id}", method = "PUT", method = "PATCH")]
pub async fn update_task(
    state: web::Data<AppState>,
    task_id: web::Path<i64>,
    body: web::Json<Value>,
) -> Result<impl Responder, AppError> {
    let id = task_id.into_inner();
    if state.tasks.get(id).await?.is_none() {
        return Err(not_found());
    }
    let task_data: TaskUpdate = parse_body(body.into_inner())?;
    task_data.validate()?;

    let is_completed = task_data.is_completed.unwrap_or_default();
    let task = state
        .tasks
        .set_completed(id, is_completed)
        .await?
        .ok_or_else(not_found)?;
    Ok(HttpResponse::Ok().json(task))
}

/// Deletes a task by its ID.
///
/// ## Responses:
/// - `204 No Content`: On successful deletion.
/// - `404 Not Found`: If the task does not exist.
#[delete("/tasks/{id}")]
pub async fn delete_task(
    state: web::Data<AppState>,
    task_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    if !state.tasks.delete(task_id.into_inner()).await? {
        return Err(not_found());
    }
    Ok(HttpResponse::NoContent().finish())
}
