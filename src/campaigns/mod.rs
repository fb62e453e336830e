pub mod rollup;

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
use crate::leads::Lead;
use crate::schema::{campaigns, leads};
use crate::state::{AppState, DbConn};

pub const STATUS_DRAFT: &str = "draft";

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = campaigns)]
pub struct Campaign {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub campaign_type: String,
    pub status: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub assigned_team_members: Vec<Uuid>,
    pub budget: Option<f64>,
    pub target_leads: Option<i32>,
    pub total_leads: i32,
    pub qualified_leads: i32,
    pub disqualified_leads: i32,
    pub converted_leads: i32,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateCampaignRequest {
    pub name: String,
    pub description: Option<String>,
    pub campaign_type: String,
    pub status: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub assigned_team_members: Option<Vec<Uuid>>,
    pub budget: Option<f64>,
    pub target_leads: Option<i32>,
}

pub async fn create_campaign(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<Campaign>), ApiError> {
    user.require_manager("create campaigns")?;
    let mut conn = state.conn.get()?;
    let now = Utc::now();

    let campaign = Campaign {
        id: Uuid::new_v4(),
        name: req.name,
        description: req.description,
        campaign_type: req.campaign_type,
        status: req.status.unwrap_or_else(|| STATUS_DRAFT.to_string()),
        start_date: req.start_date,
        end_date: req.end_date,
        assigned_team_members: req.assigned_team_members.unwrap_or_default(),
        budget: req.budget,
        target_leads: req.target_leads,
        total_leads: 0,
        qualified_leads: 0,
        disqualified_leads: 0,
        converted_leads: 0,
        created_by: user.user_id,
        created_at: now,
        updated_at: now,
        is_deleted: false,
    };

    diesel::insert_into(campaigns::table)
        .values(&campaign)
        .execute(&mut conn)?;

    Ok((StatusCode::CREATED, Json(campaign)))
}

#[derive(Debug, Deserialize)]
pub struct ListCampaignsQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
    pub campaign_type: Option<String>,
}

pub async fn list_campaigns(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Query(query): Query<ListCampaignsQuery>,
) -> Result<Json<Vec<Campaign>>, ApiError> {
    let mut conn = state.conn.get()?;

    let mut q = campaigns::table
        .filter(campaigns::is_deleted.eq(false))
        .into_boxed();

    if let Some(status) = query.status {
        q = q.filter(campaigns::status.eq(status));
    }
    if let Some(campaign_type) = query.campaign_type {
        q = q.filter(campaigns::campaign_type.eq(campaign_type));
    }

    let rows: Vec<Campaign> = q
        .order(campaigns::created_at.desc())
        .offset(query.skip.unwrap_or(0))
        .limit(query.limit.unwrap_or(50))
        .load(&mut conn)?;

    Ok(Json(rows))
}

fn load_campaign(conn: &mut DbConn, id: Uuid) -> Result<Campaign, ApiError> {
    campaigns::table
        .filter(campaigns::id.eq(id))
        .filter(campaigns::is_deleted.eq(false))
        .first(conn)
        .map_err(|_| ApiError::NotFound("Campaign"))
}

pub async fn get_campaign(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Campaign>, ApiError> {
    let mut conn = state.conn.get()?;
    let campaign = load_campaign(&mut conn, id)?;
    Ok(Json(campaign))
}

#[derive(Debug, Deserialize)]
pub struct UpdateCampaignRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub campaign_type: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub assigned_team_members: Option<Vec<Uuid>>,
    pub budget: Option<f64>,
    pub target_leads: Option<i32>,
}

pub async fn update_campaign(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCampaignRequest>,
) -> Result<Json<Campaign>, ApiError> {
    user.require_manager("update campaigns")?;
    let mut conn = state.conn.get()?;
    load_campaign(&mut conn, id)?;

    let target = campaigns::table.filter(campaigns::id.eq(id));

    diesel::update(target)
        .set(campaigns::updated_at.eq(Utc::now()))
        .execute(&mut conn)?;

    if let Some(name) = &req.name {
        diesel::update(target)
            .set(campaigns::name.eq(name))
            .execute(&mut conn)?;
    }
    if let Some(description) = &req.description {
        diesel::update(target)
            .set(campaigns::description.eq(description))
            .execute(&mut conn)?;
    }
    if let Some(campaign_type) = &req.campaign_type {
        diesel::update(target)
            .set(campaigns::campaign_type.eq(campaign_type))
            .execute(&mut conn)?;
    }
    if let Some(status) = &req.status {
        diesel::update(target)
            .set(campaigns::status.eq(status))
            .execute(&mut conn)?;
    }
    if let Some(start_date) = req.start_date {
        diesel::update(target)
            .set(campaigns::start_date.eq(start_date))
            .execute(&mut conn)?;
    }
    if let Some(end_date) = req.end_date {
        diesel::update(target)
            .set(campaigns::end_date.eq(end_date))
            .execute(&mut conn)?;
    }
    if let Some(members) = &req.assigned_team_members {
        diesel::update(target)
            .set(campaigns::assigned_team_members.eq(members))
            .execute(&mut conn)?;
    }
    if let Some(budget) = req.budget {
        diesel::update(target)
            .set(campaigns::budget.eq(budget))
            .execute(&mut conn)?;
    }
    if let Some(target_leads) = req.target_leads {
        diesel::update(target)
            .set(campaigns::target_leads.eq(target_leads))
            .execute(&mut conn)?;
    }

    let campaign = load_campaign(&mut conn, id)?;
    Ok(Json(campaign))
}

pub async fn delete_campaign(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    user.require_admin("delete campaigns")?;
    let mut conn = state.conn.get()?;

    let updated = diesel::update(campaigns::table.filter(campaigns::id.eq(id)))
        .set((
            campaigns::is_deleted.eq(true),
            campaigns::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;
    if updated == 0 {
        return Err(ApiError::NotFound("Campaign"));
    }

    Ok(Json(serde_json::json!({ "message": "Campaign deleted successfully" })))
}

#[derive(Debug, Deserialize)]
pub struct SetTargetsRequest {
    pub date: NaiveDate,
    pub data_target: Option<i32>,
    pub calling_target: Option<i32>,
}

pub async fn set_daily_targets(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<SetTargetsRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    user.require_manager("set campaign targets")?;
    let mut conn = state.conn.get()?;
    load_campaign(&mut conn, id)?;

    rollup::upsert_target(&mut conn, id, req.date, req.data_target, req.calling_target)?;
    let targets = rollup::list_targets(&mut conn, id)?;

    Ok(Json(serde_json::json!({
        "message": "Daily targets updated successfully",
        "targets": targets,
    })))
}

#[derive(Debug, Deserialize)]
pub struct SetAchievedRequest {
    pub target_date: NaiveDate,
    pub data_achieved: Option<i32>,
    pub calling_achieved: Option<i32>,
}

pub async fn set_daily_achieved(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<SetAchievedRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut conn = state.conn.get()?;
    load_campaign(&mut conn, id)?;

    rollup::set_achieved(
        &mut conn,
        id,
        req.target_date,
        req.data_achieved,
        req.calling_achieved,
    )?;

    Ok(Json(serde_json::json!({ "message": "Achieved counts updated successfully" })))
}

pub async fn campaign_stats(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut conn = state.conn.get()?;
    let campaign = load_campaign(&mut conn, id)?;

    let breakdown: Vec<(String, String, i64)> = leads::table
        .filter(leads::campaign_id.eq(id))
        .filter(leads::is_deleted.eq(false))
        .group_by((leads::status, leads::source))
        .select((leads::status, leads::source, diesel::dsl::count_star()))
        .load(&mut conn)?;

    let lead_breakdown: Vec<serde_json::Value> = breakdown
        .into_iter()
        .map(|(status, source, count)| {
            serde_json::json!({ "status": status, "source": source, "count": count })
        })
        .collect();

    let today_target = rollup::today_target(&mut conn, id)?;
    let conversion_rate = rollup::conversion_rate(
        campaign.converted_leads as i64,
        campaign.total_leads as i64,
    );

    Ok(Json(serde_json::json!({
        "campaign": campaign,
        "lead_breakdown": lead_breakdown,
        "today_target": today_target,
        "total_leads": campaign.total_leads,
        "qualified_leads": campaign.qualified_leads,
        "disqualified_leads": campaign.disqualified_leads,
        "converted_leads": campaign.converted_leads,
        "conversion_rate": conversion_rate,
    })))
}

#[derive(Debug, Deserialize)]
pub struct CampaignLeadsQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn campaign_leads(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<CampaignLeadsQuery>,
) -> Result<Json<Vec<Lead>>, ApiError> {
    let mut conn = state.conn.get()?;
    load_campaign(&mut conn, id)?;

    let rows: Vec<Lead> = leads::table
        .filter(leads::campaign_id.eq(id))
        .filter(leads::is_deleted.eq(false))
        .order(leads::created_at.desc())
        .offset(query.skip.unwrap_or(0))
        .limit(query.limit.unwrap_or(50))
        .load(&mut conn)?;

    Ok(Json(rows))
}

pub fn configure_campaign_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/campaigns", get(list_campaigns).post(create_campaign))
        .route(
            "/api/campaigns/:id",
            get(get_campaign).put(update_campaign).delete(delete_campaign),
        )
        .route("/api/campaigns/:id/targets", put(set_daily_targets))
        .route("/api/campaigns/:id/achieved", put(set_daily_achieved))
        .route("/api/campaigns/:id/stats", get(campaign_stats))
        .route("/api/campaigns/:id/leads", get(campaign_leads))
}
