use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::claims::AuthUser;
use crate::error::ApiError;
use crate::schema::{comments, tasks};
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = comments)]
pub struct Comment {
    pub id: Uuid,
    pub task_id: Uuid,
    pub content: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub task_id: Uuid,
    pub content: String,
}

pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let mut conn = state.conn.get()?;

    let task_exists: i64 = tasks::table
        .filter(tasks::id.eq(req.task_id))
        .count()
        .get_result(&mut conn)?;
    if task_exists == 0 {
        return Err(ApiError::NotFound("Task"));
    }

    let now = Utc::now();
    let comment = Comment {
        id: Uuid::new_v4(),
        task_id: req.task_id,
        content: req.content,
        created_by: user.user_id,
        created_at: now,
        updated_at: now,
        is_deleted: false,
    };

    diesel::insert_into(comments::table)
        .values(&comment)
        .execute(&mut conn)?;

    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn get_task_comments(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(task_id): Path<Uuid>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    let mut conn = state.conn.get()?;

    let rows: Vec<Comment> = comments::table
        .filter(comments::task_id.eq(task_id))
        .filter(comments::is_deleted.eq(false))
        .order(comments::created_at.desc())
        .limit(100)
        .load(&mut conn)?;

    Ok(Json(rows))
}

pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut conn = state.conn.get()?;

    let updated = diesel::update(comments::table.filter(comments::id.eq(id)))
        .set(comments::is_deleted.eq(true))
        .execute(&mut conn)?;

    if updated == 0 {
        return Err(ApiError::NotFound("Comment"));
    }

    Ok(Json(serde_json::json!({ "message": "Comment deleted successfully" })))
}

pub fn configure_comment_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/comments", post(create_comment))
        .route("/api/comments/task/:task_id", get(get_task_comments))
        .route("/api/comments/:id", delete(delete_comment))
}
