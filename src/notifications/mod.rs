use axum::extract::{Path, Query, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::claims::AuthUser;
use crate::error::ApiError;
use crate::schema::notifications;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = notifications)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub related_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ListNotificationsQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    #[serde(default)]
    pub unread_only: bool,
}

pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<ListNotificationsQuery>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let mut conn = state.conn.get()?;

    let mut q = notifications::table
        .filter(notifications::user_id.eq(user.user_id))
        .into_boxed();

    if query.unread_only {
        q = q.filter(notifications::is_read.eq(false));
    }

    let rows: Vec<Notification> = q
        .order(notifications::created_at.desc())
        .offset(query.skip.unwrap_or(0))
        .limit(query.limit.unwrap_or(10))
        .load(&mut conn)?;

    Ok(Json(rows))
}

pub async fn mark_as_read(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut conn = state.conn.get()?;

    let updated = diesel::update(notifications::table.filter(notifications::id.eq(id)))
        .set(notifications::is_read.eq(true))
        .execute(&mut conn)?;

    if updated == 0 {
        return Err(ApiError::NotFound("Notification"));
    }

    Ok(Json(serde_json::json!({ "message": "Notification marked as read" })))
}

pub async fn mark_all_as_read(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut conn = state.conn.get()?;

    diesel::update(notifications::table.filter(notifications::user_id.eq(user.user_id)))
        .set(notifications::is_read.eq(true))
        .execute(&mut conn)?;

    Ok(Json(serde_json::json!({ "message": "All notifications marked as read" })))
}

pub fn configure_notification_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/notifications", get(list_notifications))
        .route("/api/notifications/mark-all-read", put(mark_all_as_read))
        .route("/api/notifications/:id/read", put(mark_as_read))
}
