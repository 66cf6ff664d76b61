use axum::{extract::State, http::StatusCode, Json};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::SqlitePool;
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::AppError,
    extract::{AppJson, AppPath, AppQuery},
    models::{CreateTask, MessageResponse, Task, UpdateTask},
};

const DEADLINE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct Pagination {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

fn require_text(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::ValidationError(format!("{field} is required")));
    }
    Ok(())
}

fn validate_deadline(deadline: Option<&str>) -> Result<(), AppError> {
    if let Some(deadline) = deadline {
        NaiveDate::parse_from_str(deadline, DEADLINE_FORMAT).map_err(|_| {
            AppError::ValidationError(format!(
                "Invalid deadline '{deadline}', expected YYYY-MM-DD"
            ))
        })?;
    }
    Ok(())
}

impl CreateTask {
    fn validate(&self) -> Result<(), AppError> {
        require_text("title", &self.title)?;
        require_text("priority", &self.priority)?;
        require_text("status", &self.status)?;
        validate_deadline(self.deadline.as_deref())
    }
}

impl UpdateTask {
    fn validate(&self) -> Result<(), AppError> {
        for (field, value) in [
            ("title", &self.title),
            ("priority", &self.priority),
            ("status", &self.status),
        ] {
            if let Some(value) = value {
                require_text(field, value)?;
            }
        }
        validate_deadline(provided(&self.deadline))
    }
}

fn provided(field: &Option<Option<String>>) -> Option<&str> {
    field.as_ref().and_then(|value| value.as_deref())
}

async fn fetch_task(pool: &SqlitePool, id: i64) -> Result<Option<Task>, AppError> {
    let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(task)
}

#[utoipa::path(
    post,
    path = "/tasks",
    tag = "tasks",
    request_body = CreateTask,
    responses(
        (status = 201, description = "Task created successfully", body = Task),
        (status = 400, description = "Invalid task payload"),
        (status = 500, description = "Failed to create task")
    )
)]
pub async fn create_task(
    State(pool): State<SqlitePool>,
    AppJson(payload): AppJson<CreateTask>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    payload.validate()?;

    let id = sqlx::query(
        "INSERT INTO tasks (title, description, priority, deadline, status, category, user_id)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(&payload.priority)
    .bind(&payload.deadline)
    .bind(&payload.status)
    .bind(&payload.category)
    .bind(payload.user_id)
    .execute(&pool)
    .await
    .map_err(AppError::create_failed("task"))?
    .last_insert_rowid();

    let task = fetch_task(&pool, id)
        .await?
        .ok_or_else(|| AppError::InternalError(format!("Task {id} vanished after insert")))?;

    tracing::info!(task_id = task.id, user_id = task.user_id, "task created");

    Ok((StatusCode::CREATED, Json(task)))
}

#[utoipa::path(
    get,
    path = "/tasks",
    tag = "tasks",
    params(Pagination),
    responses(
        (status = 200, description = "List all tasks", body = Vec<Task>),
        (status = 400, description = "Negative skip or limit")
    )
)]
pub async fn get_tasks(
    State(pool): State<SqlitePool>,
    AppQuery(params): AppQuery<Pagination>,
) -> Result<Json<Vec<Task>>, AppError> {
    let skip = params.skip.unwrap_or(0);
    // SQLite treats a negative LIMIT as unbounded.
    let limit = params.limit.unwrap_or(-1);

    if skip < 0 || params.limit.is_some_and(|l| l < 0) {
        return Err(AppError::ValidationError(
            "skip and limit must not be negative".to_string(),
        ));
    }

    // Not scoped to a user: every task is listed.
    let tasks = sqlx::query_as::<_, Task>("SELECT * FROM tasks ORDER BY id LIMIT ? OFFSET ?")
        .bind(limit)
        .bind(skip)
        .fetch_all(&pool)
        .await?;

    Ok(Json(tasks))
}

#[utoipa::path(
    get,
    path = "/tasks/{id}",
    tag = "tasks",
    params(
        ("id" = i64, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Get task details", body = Task),
        (status = 404, description = "Task not found")
    )
)]
pub async fn get_task(
    State(pool): State<SqlitePool>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<Task>, AppError> {
    let task = fetch_task(&pool, id)
        .await?
        .ok_or_else(AppError::task_not_found)?;

    Ok(Json(task))
}

#[utoipa::path(
    put,
    path = "/tasks/{id}",
    tag = "tasks",
    params(
        ("id" = i64, Path, description = "Task ID")
    ),
    request_body = UpdateTask,
    responses(
        (status = 200, description = "Task updated", body = Task),
        (status = 400, description = "Invalid field value"),
        (status = 404, description = "Task not found")
    )
)]
pub async fn update_task(
    State(pool): State<SqlitePool>,
    AppPath(id): AppPath<i64>,
    AppJson(payload): AppJson<UpdateTask>,
) -> Result<Json<Task>, AppError> {
    payload.validate()?;

    // Required columns: a NULL bind keeps the value. Optional columns: the
    // flag says whether the key was sent, so an explicit null clears it.
    let result = sqlx::query(
        "UPDATE tasks SET
            title = COALESCE(?, title),
            description = CASE WHEN ? THEN ? ELSE description END,
            priority = COALESCE(?, priority),
            deadline = CASE WHEN ? THEN ? ELSE deadline END,
            status = COALESCE(?, status),
            category = CASE WHEN ? THEN ? ELSE category END,
            user_id = COALESCE(?, user_id)
        WHERE id = ?",
    )
    .bind(&payload.title)
    .bind(payload.description.is_some())
    .bind(provided(&payload.description))
    .bind(&payload.priority)
    .bind(payload.deadline.is_some())
    .bind(provided(&payload.deadline))
    .bind(&payload.status)
    .bind(payload.category.is_some())
    .bind(provided(&payload.category))
    .bind(payload.user_id)
    .bind(id)
    .execute(&pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::task_not_found());
    }

    let task = fetch_task(&pool, id)
        .await?
        .ok_or_else(AppError::task_not_found)?;

    tracing::info!(task_id = id, "task updated");

    Ok(Json(task))
}

#[utoipa::path(
    delete,
    path = "/tasks/{id}",
    tag = "tasks",
    params(
        ("id" = i64, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task deleted successfully", body = MessageResponse),
        (status = 404, description = "Task not found")
    )
)]
pub async fn delete_task(
    State(pool): State<SqlitePool>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::task_not_found());
    }

    tracing::info!(task_id = id, "task deleted");

    Ok(Json(MessageResponse::new("Task deleted successfully")))
}
