pub mod claims;
pub mod password;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use diesel::prelude::*;
use log::warn;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::activity_logs::record_activity;
use crate::error::ApiError;
use crate::schema::users;
use crate::state::AppState;
use crate::users::User;
use claims::{issue_token, ROLE_EMPLOYEE};
use password::{hash_password, verify_password};

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub role: Option<String>,
    pub department: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: User,
}

pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    let mut conn = state.conn.get()?;

    let email_taken: i64 = users::table
        .filter(users::email.eq(&req.email))
        .count()
        .get_result(&mut conn)?;
    if email_taken > 0 {
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let username_taken: i64 = users::table
        .filter(users::username.eq(&req.username))
        .count()
        .get_result(&mut conn)?;
    if username_taken > 0 {
        return Err(ApiError::Conflict("Username already taken".into()));
    }

    let role = req.role.unwrap_or_else(|| ROLE_EMPLOYEE.to_string());
    if !matches!(role.as_str(), "admin" | "manager" | "employee") {
        return Err(ApiError::Validation(format!("Unknown role: {role}")));
    }

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        email: req.email,
        username: req.username,
        first_name: req.first_name,
        last_name: req.last_name,
        hashed_password: hash_password(&req.password)?,
        role,
        department: req.department,
        phone: req.phone,
        is_active: true,
        last_login: None,
        created_at: now,
        updated_at: now,
        is_deleted: false,
    };

    diesel::insert_into(users::table)
        .values(&user)
        .execute(&mut conn)?;

    let access_token = issue_token(
        user.id,
        Some(user.email.clone()),
        Some(user.role.clone()),
        &state.config.jwt_secret,
        state.config.token_ttl_minutes,
    )?;

    if let Err(e) = record_activity(&mut conn, user.id, "signup", "user", &user.id.to_string()) {
        warn!("signup activity log failed: {e}");
    }

    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            access_token,
            token_type: "bearer".to_string(),
            user,
        }),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let mut conn = state.conn.get()?;

    let mut user: User = users::table
        .filter(users::email.eq(&req.email))
        .filter(users::is_deleted.eq(false))
        .first(&mut conn)
        .map_err(|_| ApiError::BadCredentials)?;

    if !verify_password(&req.password, &user.hashed_password) {
        return Err(ApiError::BadCredentials);
    }

    if !user.is_active {
        return Err(ApiError::Forbidden("User account is inactive".into()));
    }

    let now = Utc::now();
    diesel::update(users::table.filter(users::id.eq(user.id)))
        .set((users::last_login.eq(now), users::updated_at.eq(now)))
        .execute(&mut conn)?;
    user.last_login = Some(now);
    user.updated_at = now;

    let access_token = issue_token(
        user.id,
        Some(user.email.clone()),
        Some(user.role.clone()),
        &state.config.jwt_secret,
        state.config.token_ttl_minutes,
    )?;

    if let Err(e) = record_activity(&mut conn, user.id, "login", "user", &user.id.to_string()) {
        warn!("login activity log failed: {e}");
    }

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        user,
    }))
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub user_id: Uuid,
}

pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut conn = state.conn.get()?;

    let user: User = users::table
        .filter(users::id.eq(req.user_id))
        .filter(users::is_deleted.eq(false))
        .first(&mut conn)
        .map_err(|_| ApiError::Unauthorized)?;

    let access_token = issue_token(
        user.id,
        Some(user.email),
        Some(user.role),
        &state.config.jwt_secret,
        state.config.token_ttl_minutes,
    )?;

    Ok(Json(serde_json::json!({
        "access_token": access_token,
        "token_type": "bearer"
    })))
}

pub fn configure_auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh-token", post(refresh_token))
}
