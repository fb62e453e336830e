use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use log::warn;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::activity_logs::{record_activity, record_activity_with_values};
use crate::auth::claims::AuthUser;
use crate::error::ApiError;
use crate::schema::tasks;
use crate::state::AppState;

pub const STATUS_TODO: &str = "todo";
pub const PRIORITY_MEDIUM: &str = "medium";

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = tasks)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    pub due_date: Option<DateTime<Utc>>,
    pub assigned_to: Option<Uuid>,
    pub created_by: Uuid,
    pub tags: Vec<String>,
    pub time_logged: i32,
    pub lead_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub assigned_to: Option<Uuid>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub assigned_to: Option<Uuid>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ListTasksQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assigned_to: Option<Uuid>,
}

pub async fn create_task(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let mut conn = state.conn.get()?;
    let now = Utc::now();

    let task = Task {
        id: Uuid::new_v4(),
        title: req.title,
        description: req.description,
        status: req.status.unwrap_or_else(|| STATUS_TODO.to_string()),
        priority: req.priority.unwrap_or_else(|| PRIORITY_MEDIUM.to_string()),
        due_date: req.due_date,
        assigned_to: req.assigned_to,
        created_by: user.user_id,
        tags: req.tags.unwrap_or_default(),
        time_logged: 0,
        lead_id: None,
        created_at: now,
        updated_at: now,
        is_deleted: false,
    };

    diesel::insert_into(tasks::table)
        .values(&task)
        .execute(&mut conn)?;

    let snapshot = serde_json::to_value(&task).ok();
    if let Err(e) = record_activity_with_values(
        &mut conn,
        user.user_id,
        "create",
        "task",
        &task.id.to_string(),
        None,
        snapshot,
    ) {
        warn!("task create activity log failed: {e}");
    }

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let mut conn = state.conn.get()?;

    let mut q = tasks::table
        .filter(tasks::is_deleted.eq(false))
        .into_boxed();

    if let Some(status) = query.status {
        q = q.filter(tasks::status.eq(status));
    }
    if let Some(priority) = query.priority {
        q = q.filter(tasks::priority.eq(priority));
    }
    if let Some(assigned_to) = query.assigned_to {
        q = q.filter(tasks::assigned_to.eq(assigned_to));
    }

    let rows: Vec<Task> = q
        .order(tasks::created_at.desc())
        .offset(query.skip.unwrap_or(0))
        .limit(query.limit.unwrap_or(10))
        .load(&mut conn)?;

    Ok(Json(rows))
}

pub async fn get_task(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Task>, ApiError> {
    let mut conn = state.conn.get()?;

    let task: Task = tasks::table
        .filter(tasks::id.eq(id))
        .filter(tasks::is_deleted.eq(false))
        .first(&mut conn)
        .map_err(|_| ApiError::NotFound("Task"))?;

    Ok(Json(task))
}

pub async fn update_task(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<Json<Task>, ApiError> {
    let mut conn = state.conn.get()?;

    let original: Task = tasks::table
        .filter(tasks::id.eq(id))
        .first(&mut conn)
        .map_err(|_| ApiError::NotFound("Task"))?;

    let now = Utc::now();
    let target = tasks::table.filter(tasks::id.eq(id));

    diesel::update(target)
        .set(tasks::updated_at.eq(now))
        .execute(&mut conn)?;

    if let Some(title) = &req.title {
        diesel::update(target)
            .set(tasks::title.eq(title))
            .execute(&mut conn)?;
    }
    if let Some(description) = &req.description {
        diesel::update(target)
            .set(tasks::description.eq(description))
            .execute(&mut conn)?;
    }
    if let Some(status) = &req.status {
        diesel::update(target)
            .set(tasks::status.eq(status))
            .execute(&mut conn)?;
    }
    if let Some(priority) = &req.priority {
        diesel::update(target)
            .set(tasks::priority.eq(priority))
            .execute(&mut conn)?;
    }
    if let Some(due_date) = req.due_date {
        diesel::update(target)
            .set(tasks::due_date.eq(due_date))
            .execute(&mut conn)?;
    }
    if let Some(assigned_to) = req.assigned_to {
        diesel::update(target)
            .set(tasks::assigned_to.eq(assigned_to))
            .execute(&mut conn)?;
    }
    if let Some(tags) = &req.tags {
        diesel::update(target)
            .set(tasks::tags.eq(tags))
            .execute(&mut conn)?;
    }

    let updated: Task = tasks::table
        .filter(tasks::id.eq(id))
        .first(&mut conn)
        .map_err(|_| ApiError::NotFound("Task"))?;

    if let Err(e) = record_activity_with_values(
        &mut conn,
        user.user_id,
        "update",
        "task",
        &id.to_string(),
        serde_json::to_value(&original).ok(),
        serde_json::to_value(&updated).ok(),
    ) {
        warn!("task update activity log failed: {e}");
    }

    Ok(Json(updated))
}

pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut conn = state.conn.get()?;

    let updated = diesel::update(tasks::table.filter(tasks::id.eq(id)))
        .set((tasks::is_deleted.eq(true), tasks::updated_at.eq(Utc::now())))
        .execute(&mut conn)?;

    if updated == 0 {
        return Err(ApiError::NotFound("Task"));
    }

    if let Err(e) = record_activity(&mut conn, user.user_id, "delete", "task", &id.to_string()) {
        warn!("task delete activity log failed: {e}");
    }

    Ok(Json(serde_json::json!({ "message": "Task deleted successfully" })))
}

#[derive(Debug, Deserialize)]
pub struct MyTasksQuery {
    pub status: Option<String>,
}

pub async fn my_tasks(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<MyTasksQuery>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let mut conn = state.conn.get()?;

    let mut q = tasks::table
        .filter(tasks::assigned_to.eq(user.user_id))
        .filter(tasks::is_deleted.eq(false))
        .into_boxed();

    if let Some(status) = query.status {
        q = q.filter(tasks::status.eq(status));
    }

    let rows: Vec<Task> = q
        .order(tasks::created_at.desc())
        .limit(100)
        .load(&mut conn)?;

    Ok(Json(rows))
}

pub fn configure_task_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/tasks/:id",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/api/tasks/my/list", get(my_tasks))
}
