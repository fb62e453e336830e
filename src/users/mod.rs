use axum::extract::{Path, Query, State};
use axum::routing::{get, patch};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::claims::AuthUser;
use crate::auth::password::hash_password;
use crate::error::ApiError;
use crate::schema::users;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub role: String,
    pub department: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
}

impl User {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
    pub department: Option<String>,
    pub phone: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub role: Option<String>,
}

pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<User>, ApiError> {
    let mut conn = state.conn.get()?;

    let row: User = users::table
        .filter(users::id.eq(user.user_id))
        .filter(users::is_deleted.eq(false))
        .first(&mut conn)
        .map_err(|_| ApiError::NotFound("User"))?;

    Ok(Json(row))
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    let mut conn = state.conn.get()?;
    let now = Utc::now();
    let target = users::table.filter(users::id.eq(user.user_id));

    diesel::update(target)
        .set(users::updated_at.eq(now))
        .execute(&mut conn)?;

    if let Some(email) = req.email {
        diesel::update(target)
            .set(users::email.eq(email))
            .execute(&mut conn)?;
    }
    if let Some(username) = req.username {
        diesel::update(target)
            .set(users::username.eq(username))
            .execute(&mut conn)?;
    }
    if let Some(first_name) = req.first_name {
        diesel::update(target)
            .set(users::first_name.eq(first_name))
            .execute(&mut conn)?;
    }
    if let Some(last_name) = req.last_name {
        diesel::update(target)
            .set(users::last_name.eq(last_name))
            .execute(&mut conn)?;
    }
    if let Some(password) = req.password {
        let hashed = hash_password(&password)?;
        diesel::update(target)
            .set(users::hashed_password.eq(hashed))
            .execute(&mut conn)?;
    }
    if let Some(department) = req.department {
        diesel::update(target)
            .set(users::department.eq(department))
            .execute(&mut conn)?;
    }
    if let Some(phone) = req.phone {
        diesel::update(target)
            .set(users::phone.eq(phone))
            .execute(&mut conn)?;
    }
    if let Some(is_active) = req.is_active {
        diesel::update(target)
            .set(users::is_active.eq(is_active))
            .execute(&mut conn)?;
    }

    let row: User = users::table
        .filter(users::id.eq(user.user_id))
        .first(&mut conn)
        .map_err(|_| ApiError::NotFound("User"))?;

    Ok(Json(row))
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<User>>, ApiError> {
    let mut conn = state.conn.get()?;

    let mut q = users::table
        .filter(users::is_deleted.eq(false))
        .into_boxed();

    if let Some(role) = query.role {
        q = q.filter(users::role.eq(role));
    }

    let rows: Vec<User> = q
        .order(users::created_at.desc())
        .offset(query.skip.unwrap_or(0))
        .limit(query.limit.unwrap_or(10))
        .load(&mut conn)?;

    Ok(Json(rows))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
    let mut conn = state.conn.get()?;

    let row: User = users::table
        .filter(users::id.eq(id))
        .filter(users::is_deleted.eq(false))
        .first(&mut conn)
        .map_err(|_| ApiError::NotFound("User"))?;

    Ok(Json(row))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    user.require_admin("delete users")?;
    let mut conn = state.conn.get()?;

    let updated = diesel::update(users::table.filter(users::id.eq(id)))
        .set((users::is_deleted.eq(true), users::updated_at.eq(Utc::now())))
        .execute(&mut conn)?;

    if updated == 0 {
        return Err(ApiError::NotFound("User"));
    }

    Ok(Json(serde_json::json!({ "message": "User deleted successfully" })))
}

#[derive(Debug, Deserialize)]
pub struct RoleQuery {
    pub role: String,
}

pub async fn update_user_role(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<RoleQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    user.require_admin("change user roles")?;

    if !matches!(query.role.as_str(), "admin" | "manager" | "employee") {
        return Err(ApiError::Validation(format!("Unknown role: {}", query.role)));
    }

    let mut conn = state.conn.get()?;
    let updated = diesel::update(users::table.filter(users::id.eq(id)))
        .set((users::role.eq(&query.role), users::updated_at.eq(Utc::now())))
        .execute(&mut conn)?;

    if updated == 0 {
        return Err(ApiError::NotFound("User"));
    }

    Ok(Json(serde_json::json!({
        "message": format!("User role updated to {}", query.role)
    })))
}

pub fn configure_user_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users/me", get(get_profile).put(update_profile))
        .route("/api/users", get(list_users))
        .route("/api/users/:id", get(get_user).delete(delete_user))
        .route("/api/users/:id/role", patch(update_user_role))
}
