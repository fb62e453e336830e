use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::claims::AuthUser;
use crate::error::ApiError;
use crate::schema::activity_logs;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = activity_logs)]
pub struct ActivityLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub old_value: Option<serde_json::Value>,
    pub new_value: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Append-only audit entry. Callers treat failures as non-fatal and log them.
pub fn record_activity(
    conn: &mut crate::state::DbConn,
    user_id: Uuid,
    action: &str,
    entity_type: &str,
    entity_id: &str,
) -> Result<(), diesel::result::Error> {
    record_activity_with_values(conn, user_id, action, entity_type, entity_id, None, None)
}

pub fn record_activity_with_values(
    conn: &mut crate::state::DbConn,
    user_id: Uuid,
    action: &str,
    entity_type: &str,
    entity_id: &str,
    old_value: Option<serde_json::Value>,
    new_value: Option<serde_json::Value>,
) -> Result<(), diesel::result::Error> {
    let entry = ActivityLog {
        id: Uuid::new_v4(),
        user_id,
        action: action.to_string(),
        entity_type: entity_type.to_string(),
        entity_id: entity_id.to_string(),
        old_value,
        new_value,
        created_at: Utc::now(),
    };
    diesel::insert_into(activity_logs::table)
        .values(&entry)
        .execute(conn)?;
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct ListLogsQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub entity_type: Option<String>,
}

pub async fn list_activity_logs(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Query(query): Query<ListLogsQuery>,
) -> Result<Json<Vec<ActivityLog>>, ApiError> {
    let mut conn = state.conn.get()?;

    let mut q = activity_logs::table.into_boxed();
    if let Some(entity_type) = query.entity_type {
        q = q.filter(activity_logs::entity_type.eq(entity_type));
    }

    let logs: Vec<ActivityLog> = q
        .order(activity_logs::created_at.desc())
        .offset(query.skip.unwrap_or(0))
        .limit(query.limit.unwrap_or(10))
        .load(&mut conn)?;

    Ok(Json(logs))
}

pub fn configure_activity_log_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/activity-logs", get(list_activity_logs))
}
