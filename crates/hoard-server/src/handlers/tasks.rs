//! Task endpoints: completion and the admin task surface.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use hoard_core::Task;

use crate::api::AppState;
use crate::auth::require_admin;
use crate::error::ApiError;

/// Wire shape for a task.
#[derive(Debug, Serialize)]
pub struct TaskView {
    pub id: Uuid,
    pub title: String,
    pub points: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Task> for TaskView {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            points: task.points,
            is_active: task.is_active,
            created_at: task.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Completion
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct CompleteTaskRequest {
    pub display_name: String,
    pub task_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct CompleteTaskResponse {
    pub message: &'static str,
    pub points_added: i64,
    pub new_balance: i64,
}

/// Complete a task and collect its reward.  A task can be completed at
/// most once per account.
pub async fn complete_task(
    State(state): State<AppState>,
    Json(req): Json<CompleteTaskRequest>,
) -> Result<Json<CompleteTaskResponse>, ApiError> {
    if req.display_name.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Display name and task ID are required".to_string(),
        ));
    }

    let now = Utc::now();
    let db = state.db.lock().await;

    let mut account = db
        .get_account_by_display_name(&req.display_name)
        .map_err(ApiError::not_found("User"))?;
    let task = db.get_task(req.task_id).map_err(ApiError::not_found("Task"))?;

    if db.has_completed_task(account.id, task.id)? {
        return Err(ApiError::BadRequest("Task already completed".to_string()));
    }

    db.insert_task_completion(account.id, task.id, now)?;
    account.add_earnings(task.points);
    account.last_active = now;
    db.update_account(&account)?;

    info!(
        display_name = %account.display_name,
        task = %task.title,
        points = task.points,
        "task completed"
    );

    Ok(Json(CompleteTaskResponse {
        message: "Task completed successfully",
        points_added: task.points,
        new_balance: account.balance,
    }))
}

#[derive(Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<TaskView>,
}

/// Active tasks the user has not completed yet.
pub async fn tasks_for_user(
    State(state): State<AppState>,
    Path(display_name): Path<String>,
) -> Result<Json<TaskListResponse>, ApiError> {
    let db = state.db.lock().await;
    let account = db
        .get_account_by_display_name(&display_name)
        .map_err(ApiError::not_found("User"))?;

    let tasks = db
        .list_open_tasks_for(account.id)?
        .into_iter()
        .map(TaskView::from)
        .collect();

    Ok(Json(TaskListResponse { tasks }))
}

/// A single task by id.
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TaskView>, ApiError> {
    let db = state.db.lock().await;
    let task = db.get_task(id).map_err(ApiError::not_found("Task"))?;
    Ok(Json(task.into()))
}

/// Tasks an account has completed, in completion order.
pub async fn completed_tasks(
    State(state): State<AppState>,
    Path(external_id): Path<String>,
) -> Result<Json<TaskListResponse>, ApiError> {
    let db = state.db.lock().await;
    let account = db
        .get_account_by_external_id(&external_id)
        .map_err(ApiError::not_found("User"))?;

    let tasks = db
        .list_completed_tasks(account.id)?
        .into_iter()
        .map(TaskView::from)
        .collect();

    Ok(Json(TaskListResponse { tasks }))
}

// ---------------------------------------------------------------------------
// Admin surface
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    pub points: i64,
}

/// Admin: create one task.
pub async fn create_task(
    headers: HeaderMap,
    State(state): State<AppState>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskView>), ApiError> {
    require_admin(&headers, &state.config)?;
    validate_task_fields(&req)?;

    let db = state.db.lock().await;
    let task = Task::new(req.title.trim(), req.points, Utc::now());
    db.insert_task(&task)?;

    info!(task = %task.title, points = task.points, "task created");

    Ok((StatusCode::CREATED, Json(task.into())))
}

#[derive(Deserialize)]
pub struct BulkCreateTasksRequest {
    pub tasks: Vec<CreateTaskRequest>,
}

#[derive(Serialize)]
pub struct BulkCreateTasksResponse {
    pub message: &'static str,
    pub created: usize,
    pub tasks: Vec<TaskView>,
}

/// Admin: create several tasks in one request.
pub async fn create_tasks_bulk(
    headers: HeaderMap,
    State(state): State<AppState>,
    Json(req): Json<BulkCreateTasksRequest>,
) -> Result<(StatusCode, Json<BulkCreateTasksResponse>), ApiError> {
    require_admin(&headers, &state.config)?;

    if req.tasks.is_empty() {
        return Err(ApiError::BadRequest("At least one task is required".to_string()));
    }
    for task_req in &req.tasks {
        validate_task_fields(task_req)?;
    }

    let now = Utc::now();
    let db = state.db.lock().await;

    let mut created = Vec::with_capacity(req.tasks.len());
    for task_req in &req.tasks {
        let task = Task::new(task_req.title.trim(), task_req.points, now);
        db.insert_task(&task)?;
        created.push(TaskView::from(task));
    }

    info!(count = created.len(), "tasks created in bulk");

    Ok((
        StatusCode::CREATED,
        Json(BulkCreateTasksResponse {
            message: "Tasks created successfully",
            created: created.len(),
            tasks: created,
        }),
    ))
}

#[derive(Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub points: Option<i64>,
    pub is_active: Option<bool>,
}

/// Admin: update a task's title, reward, or visibility.
pub async fn update_task(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<Json<TaskView>, ApiError> {
    require_admin(&headers, &state.config)?;

    let db = state.db.lock().await;
    let mut task = db.get_task(id).map_err(ApiError::not_found("Task"))?;

    if let Some(title) = req.title {
        if title.trim().is_empty() {
            return Err(ApiError::BadRequest("Title must not be empty".to_string()));
        }
        task.title = title.trim().to_string();
    }
    if let Some(points) = req.points {
        if points <= 0 {
            return Err(ApiError::BadRequest(
                "Points must be a positive number".to_string(),
            ));
        }
        task.points = points;
    }
    if let Some(is_active) = req.is_active {
        task.is_active = is_active;
    }

    db.update_task(&task)?;

    Ok(Json(task.into()))
}

fn validate_task_fields(req: &CreateTaskRequest) -> Result<(), ApiError> {
    if req.title.trim().is_empty() || req.points <= 0 {
        return Err(ApiError::BadRequest(
            "Title and a positive points value are required".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::handlers::accounts::{register, RegisterRequest};
    use crate::handlers::test_support::test_state;

    async fn registered(state: &AppState, external_id: &str, name: &str) {
        register(
            State(state.clone()),
            Json(RegisterRequest {
                external_id: external_id.to_string(),
                display_name: name.to_string(),
                referral_code: None,
            }),
        )
        .await
        .unwrap();
    }

    async fn seed_task(state: &AppState, title: &str, points: i64) -> Task {
        let db = state.db.lock().await;
        let task = Task::new(title, points, Utc::now());
        db.insert_task(&task).unwrap();
        task
    }

    #[tokio::test]
    async fn complete_pays_once() {
        let (_dir, state) = test_state();
        registered(&state, "1", "alice").await;
        let task = seed_task(&state, "Follow the channel", 2_500).await;

        let req = CompleteTaskRequest {
            display_name: "alice".to_string(),
            task_id: task.id,
        };
        let Json(resp) = complete_task(State(state.clone()), Json(req)).await.unwrap();
        assert_eq!(resp.points_added, 2_500);
        assert_eq!(resp.new_balance, 32_500);

        let req = CompleteTaskRequest {
            display_name: "alice".to_string(),
            task_id: task.id,
        };
        let err = complete_task(State(state.clone()), Json(req)).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(m) if m == "Task already completed"));
    }

    #[tokio::test]
    async fn open_and_completed_listings() {
        let (_dir, state) = test_state();
        registered(&state, "1", "alice").await;
        let t1 = seed_task(&state, "Follow the channel", 2_500).await;
        seed_task(&state, "Join the group", 5_000).await;

        let req = CompleteTaskRequest {
            display_name: "alice".to_string(),
            task_id: t1.id,
        };
        complete_task(State(state.clone()), Json(req)).await.unwrap();

        let Json(open) = tasks_for_user(State(state.clone()), Path("alice".to_string()))
            .await
            .unwrap();
        assert_eq!(open.tasks.len(), 1);
        assert_eq!(open.tasks[0].title, "Join the group");

        let Json(done) = completed_tasks(State(state.clone()), Path("1".to_string()))
            .await
            .unwrap();
        assert_eq!(done.tasks.len(), 1);
        assert_eq!(done.tasks[0].title, "Follow the channel");
    }

    #[tokio::test]
    async fn unknown_task_is_404() {
        let (_dir, state) = test_state();
        registered(&state, "1", "alice").await;

        let req = CompleteTaskRequest {
            display_name: "alice".to_string(),
            task_id: Uuid::new_v4(),
        };
        let err = complete_task(State(state.clone()), Json(req)).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(m) if m == "Task not found"));
    }

    #[tokio::test]
    async fn admin_create_requires_token() {
        let (_dir, state) = test_state();
        let req = CreateTaskRequest {
            title: "Follow the channel".to_string(),
            points: 2_500,
        };
        let err = create_task(HeaderMap::new(), State(state.clone()), Json(req))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }
}
