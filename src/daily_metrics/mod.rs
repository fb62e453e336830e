use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::claims::AuthUser;
use crate::error::ApiError;
use crate::schema::{campaigns, daily_metrics};
use crate::state::{AppState, DbConn};

pub const STATUS_DRAFT: &str = "draft";
pub const STATUS_SUBMITTED: &str = "submitted";
pub const STATUS_APPROVED: &str = "approved";
pub const STATUS_LOCKED: &str = "locked";

/// A locked day no longer accepts submissions.
pub fn accepts_submission(status: &str) -> bool {
    status != STATUS_LOCKED
}

/// Approval is only valid for a day somebody has submitted.
pub fn accepts_approval(status: &str) -> bool {
    status == STATUS_SUBMITTED
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = daily_metrics)]
pub struct DailyMetrics {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub metric_date: NaiveDate,
    pub daily_calling_target: i32,
    pub daily_data_target: i32,
    pub achieved_calling_count: i32,
    pub achieved_data_count: i32,
    pub qualified_calling: i32,
    pub qualified_data: i32,
    pub disqualified_calling: i32,
    pub disqualified_data: i32,
    pub disqualification_reasons: serde_json::Value,
    pub status: String,
    pub submitted_by: Option<Uuid>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn ensure_campaign(conn: &mut DbConn, id: Uuid) -> Result<(), ApiError> {
    let found: i64 = campaigns::table
        .filter(campaigns::id.eq(id))
        .filter(campaigns::is_deleted.eq(false))
        .count()
        .get_result(conn)?;
    if found == 0 {
        return Err(ApiError::NotFound("Campaign"));
    }
    Ok(())
}

fn load_metrics(
    conn: &mut DbConn,
    campaign_id: Uuid,
    date: NaiveDate,
) -> Result<Option<DailyMetrics>, diesel::result::Error> {
    daily_metrics::table
        .filter(daily_metrics::campaign_id.eq(campaign_id))
        .filter(daily_metrics::metric_date.eq(date))
        .first(conn)
        .optional()
}

#[derive(Debug, Deserialize)]
pub struct CreateMetricsRequest {
    pub daily_calling_target: Option<i32>,
    pub daily_data_target: Option<i32>,
}

pub async fn create_daily_metrics(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateMetricsRequest>,
) -> Result<(StatusCode, Json<DailyMetrics>), ApiError> {
    user.require_manager("create daily metrics")?;
    let mut conn = state.conn.get()?;
    ensure_campaign(&mut conn, id)?;

    let today = Utc::now().date_naive();
    if load_metrics(&mut conn, id, today)?.is_some() {
        return Err(ApiError::Conflict(
            "Daily metrics already exist for today".into(),
        ));
    }

    let now = Utc::now();
    let metrics = DailyMetrics {
        id: Uuid::new_v4(),
        campaign_id: id,
        metric_date: today,
        daily_calling_target: req.daily_calling_target.unwrap_or(0),
        daily_data_target: req.daily_data_target.unwrap_or(0),
        achieved_calling_count: 0,
        achieved_data_count: 0,
        qualified_calling: 0,
        qualified_data: 0,
        disqualified_calling: 0,
        disqualified_data: 0,
        disqualification_reasons: serde_json::json!({}),
        status: STATUS_DRAFT.to_string(),
        submitted_by: None,
        approved_by: None,
        approved_at: None,
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(daily_metrics::table)
        .values(&metrics)
        .execute(&mut conn)?;

    Ok((StatusCode::CREATED, Json(metrics)))
}

#[derive(Debug, Deserialize)]
pub struct SubmitMetricsRequest {
    pub date: Option<NaiveDate>,
    pub achieved_calling_count: Option<i32>,
    pub achieved_data_count: Option<i32>,
    pub qualified_calling: Option<i32>,
    pub qualified_data: Option<i32>,
    pub disqualified_calling: Option<i32>,
    pub disqualified_data: Option<i32>,
    pub disqualification_reasons: Option<serde_json::Value>,
}

pub async fn submit_daily_metrics(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<SubmitMetricsRequest>,
) -> Result<Json<DailyMetrics>, ApiError> {
    let mut conn = state.conn.get()?;
    ensure_campaign(&mut conn, id)?;

    let date = req.date.unwrap_or_else(|| Utc::now().date_naive());
    let existing =
        load_metrics(&mut conn, id, date)?.ok_or(ApiError::NotFound("Daily metrics"))?;

    if !accepts_submission(&existing.status) {
        return Err(ApiError::Validation(
            "Daily metrics are locked and can no longer be submitted".into(),
        ));
    }

    let now = Utc::now();
    diesel::update(daily_metrics::table.filter(daily_metrics::id.eq(existing.id)))
        .set((
            daily_metrics::achieved_calling_count
                .eq(req.achieved_calling_count.unwrap_or(existing.achieved_calling_count)),
            daily_metrics::achieved_data_count
                .eq(req.achieved_data_count.unwrap_or(existing.achieved_data_count)),
            daily_metrics::qualified_calling
                .eq(req.qualified_calling.unwrap_or(existing.qualified_calling)),
            daily_metrics::qualified_data
                .eq(req.qualified_data.unwrap_or(existing.qualified_data)),
            daily_metrics::disqualified_calling
                .eq(req.disqualified_calling.unwrap_or(existing.disqualified_calling)),
            daily_metrics::disqualified_data
                .eq(req.disqualified_data.unwrap_or(existing.disqualified_data)),
            daily_metrics::disqualification_reasons.eq(req
                .disqualification_reasons
                .unwrap_or(existing.disqualification_reasons)),
            daily_metrics::status.eq(STATUS_SUBMITTED),
            daily_metrics::submitted_by.eq(user.user_id),
            daily_metrics::updated_at.eq(now),
        ))
        .execute(&mut conn)?;

    let updated = load_metrics(&mut conn, id, date)?.ok_or(ApiError::NotFound("Daily metrics"))?;
    Ok(Json(updated))
}

pub async fn approve_daily_metrics(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<GetMetricsQuery>,
) -> Result<Json<DailyMetrics>, ApiError> {
    user.require_manager("approve daily metrics")?;
    let mut conn = state.conn.get()?;
    ensure_campaign(&mut conn, id)?;

    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let existing =
        load_metrics(&mut conn, id, date)?.ok_or(ApiError::NotFound("Daily metrics"))?;

    if !accepts_approval(&existing.status) {
        return Err(ApiError::Validation(
            "Only submitted daily metrics can be approved".into(),
        ));
    }

    let now = Utc::now();
    diesel::update(daily_metrics::table.filter(daily_metrics::id.eq(existing.id)))
        .set((
            daily_metrics::status.eq(STATUS_APPROVED),
            daily_metrics::approved_by.eq(user.user_id),
            daily_metrics::approved_at.eq(now),
            daily_metrics::updated_at.eq(now),
        ))
        .execute(&mut conn)?;

    let updated = load_metrics(&mut conn, id, date)?.ok_or(ApiError::NotFound("Daily metrics"))?;
    Ok(Json(updated))
}

#[derive(Debug, Deserialize)]
pub struct GetMetricsQuery {
    pub date: Option<NaiveDate>,
}

pub async fn get_daily_metrics(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<GetMetricsQuery>,
) -> Result<Json<DailyMetrics>, ApiError> {
    let mut conn = state.conn.get()?;
    ensure_campaign(&mut conn, id)?;

    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let metrics = load_metrics(&mut conn, id, date)?.ok_or(ApiError::NotFound("Daily metrics"))?;
    Ok(Json(metrics))
}

pub fn configure_daily_metrics_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/campaigns/:id/daily_metrics",
            get(get_daily_metrics).post(create_daily_metrics),
        )
        .route(
            "/api/campaigns/:id/daily_metrics/submit",
            put(submit_daily_metrics),
        )
        .route(
            "/api/campaigns/:id/daily_metrics/approve",
            put(approve_daily_metrics),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_and_submitted_accept_resubmission() {
        assert!(accepts_submission(STATUS_DRAFT));
        assert!(accepts_submission(STATUS_SUBMITTED));
        assert!(accepts_submission(STATUS_APPROVED));
        assert!(!accepts_submission(STATUS_LOCKED));
    }

    #[test]
    fn only_submitted_accepts_approval() {
        assert!(accepts_approval(STATUS_SUBMITTED));
        assert!(!accepts_approval(STATUS_DRAFT));
        assert!(!accepts_approval(STATUS_APPROVED));
        assert!(!accepts_approval(STATUS_LOCKED));
    }
}
