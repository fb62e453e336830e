pub mod types;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use log::warn;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::claims::AuthUser;
use crate::campaigns::rollup;
use crate::error::ApiError;
use crate::schema::{lead_activities, leads, tasks};
use crate::state::{AppState, DbConn};
use crate::tasks::{Task, PRIORITY_MEDIUM, STATUS_TODO};
use types::{
    append_qualify_note, ActivityType, DisqualificationReason, LeadSource, LeadStatus,
};

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = leads)]
pub struct Lead {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub designation: Option<String>,
    pub industry: Option<String>,
    pub location: Option<String>,
    pub source: String,
    pub status: String,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    pub campaign_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub created_by: Uuid,
    pub score: i32,
    pub disqualification_reason: Option<String>,
    pub disqualification_notes: Option<String>,
    pub last_contacted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = lead_activities)]
pub struct LeadActivity {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub activity_type: String,
    pub description: String,
    pub performed_by: Uuid,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Timeline entries are append-only and written in the same request as
/// the change they describe.
fn record_lead_activity(
    conn: &mut DbConn,
    lead_id: Uuid,
    activity_type: ActivityType,
    description: String,
    performed_by: Uuid,
    metadata: Option<serde_json::Value>,
) -> Result<(), diesel::result::Error> {
    let entry = LeadActivity {
        id: Uuid::new_v4(),
        lead_id,
        activity_type: activity_type.as_str().to_string(),
        description,
        performed_by,
        metadata,
        created_at: Utc::now(),
    };
    diesel::insert_into(lead_activities::table)
        .values(&entry)
        .execute(conn)?;
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateLeadRequest {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub designation: Option<String>,
    pub industry: Option<String>,
    pub location: Option<String>,
    pub source: LeadSource,
    pub status: Option<LeadStatus>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
    pub campaign_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
}

fn insert_lead(
    conn: &mut DbConn,
    req: CreateLeadRequest,
    created_by: Uuid,
) -> Result<Lead, ApiError> {
    let now = Utc::now();
    let lead = Lead {
        id: Uuid::new_v4(),
        name: req.name,
        email: req.email,
        phone: req.phone,
        company: req.company,
        designation: req.designation,
        industry: req.industry,
        location: req.location,
        source: req.source.as_str().to_string(),
        status: req.status.unwrap_or(LeadStatus::New).as_str().to_string(),
        notes: req.notes,
        tags: req.tags.unwrap_or_default(),
        campaign_id: req.campaign_id,
        assigned_to: req.assigned_to,
        created_by,
        score: 0,
        disqualification_reason: None,
        disqualification_notes: None,
        last_contacted_at: None,
        created_at: now,
        updated_at: now,
        is_deleted: false,
    };

    diesel::insert_into(leads::table)
        .values(&lead)
        .execute(conn)?;

    if let Err(e) = record_lead_activity(
        conn,
        lead.id,
        ActivityType::Created,
        format!("Lead created from {}", lead.source),
        created_by,
        Some(serde_json::json!({ "source": lead.source })),
    ) {
        warn!("lead create activity failed: {e}");
    }

    Ok(lead)
}

fn create_followup_task(
    conn: &mut DbConn,
    lead: &Lead,
    assignee: Uuid,
    created_by: Uuid,
) -> Result<(), diesel::result::Error> {
    let now = Utc::now();
    let description = format!(
        "Company: {}\nPhone: {}\nEmail: {}",
        lead.company.as_deref().unwrap_or("N/A"),
        lead.phone.as_deref().unwrap_or("N/A"),
        lead.email.as_deref().unwrap_or("N/A"),
    );
    let task = Task {
        id: Uuid::new_v4(),
        title: format!("Follow up: {}", lead.name),
        description: Some(description),
        status: STATUS_TODO.to_string(),
        priority: PRIORITY_MEDIUM.to_string(),
        due_date: None,
        assigned_to: Some(assignee),
        created_by,
        tags: vec!["lead-followup".to_string()],
        time_logged: 0,
        lead_id: Some(lead.id),
        created_at: now,
        updated_at: now,
        is_deleted: false,
    };
    diesel::insert_into(tasks::table)
        .values(&task)
        .execute(conn)?;
    Ok(())
}

pub async fn create_lead(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<CreateLeadRequest>,
) -> Result<(StatusCode, Json<Lead>), ApiError> {
    let mut conn = state.conn.get()?;
    let lead = insert_lead(&mut conn, req, user.user_id)?;

    if let Some(assignee) = lead.assigned_to {
        if let Err(e) = create_followup_task(&mut conn, &lead, assignee, user.user_id) {
            warn!("follow-up task creation failed for lead {}: {e}", lead.id);
        }
    }
    if let Some(campaign_id) = lead.campaign_id {
        if let Err(e) = rollup::increment_total_leads(&mut conn, campaign_id) {
            warn!("campaign total_leads bump failed for {campaign_id}: {e}");
        }
    }

    Ok((StatusCode::CREATED, Json(lead)))
}

#[derive(Debug, Deserialize)]
pub struct ListLeadsQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<LeadStatus>,
    pub source: Option<LeadSource>,
    pub campaign_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub search: Option<String>,
}

pub async fn list_leads(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<ListLeadsQuery>,
) -> Result<Json<Vec<Lead>>, ApiError> {
    let mut conn = state.conn.get()?;

    let mut q = leads::table.filter(leads::is_deleted.eq(false)).into_boxed();

    if let Some(status) = query.status {
        q = q.filter(leads::status.eq(status.as_str()));
    }
    if let Some(source) = query.source {
        q = q.filter(leads::source.eq(source.as_str()));
    }
    if let Some(campaign_id) = query.campaign_id {
        q = q.filter(leads::campaign_id.eq(campaign_id));
    }
    if let Some(assigned_to) = query.assigned_to {
        q = q.filter(leads::assigned_to.eq(assigned_to));
    }
    if let Some(search) = query.search {
        let pattern = format!("%{search}%");
        q = q.filter(
            leads::name
                .ilike(pattern.clone())
                .nullable()
                .or(leads::email.ilike(pattern.clone()))
                .or(leads::phone.ilike(pattern.clone()))
                .or(leads::company.ilike(pattern)),
        );
    }

    // Employees only ever see their own book of leads.
    if user.is_employee() {
        q = q.filter(leads::assigned_to.eq(user.user_id));
    }

    let rows: Vec<Lead> = q
        .order(leads::created_at.desc())
        .offset(query.skip.unwrap_or(0))
        .limit(query.limit.unwrap_or(50))
        .load(&mut conn)?;

    Ok(Json(rows))
}

fn load_lead(conn: &mut DbConn, id: Uuid) -> Result<Lead, ApiError> {
    leads::table
        .filter(leads::id.eq(id))
        .filter(leads::is_deleted.eq(false))
        .first(conn)
        .map_err(|_| ApiError::NotFound("Lead"))
}

pub async fn get_lead(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Lead>, ApiError> {
    let mut conn = state.conn.get()?;
    let lead = load_lead(&mut conn, id)?;

    if user.is_employee() && lead.assigned_to != Some(user.user_id) {
        return Err(ApiError::Forbidden(
            "You don't have permission to access this lead".into(),
        ));
    }

    Ok(Json(lead))
}

#[derive(Debug, Deserialize)]
pub struct UpdateLeadRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub designation: Option<String>,
    pub industry: Option<String>,
    pub location: Option<String>,
    pub status: Option<LeadStatus>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
    pub campaign_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub score: Option<i32>,
}

pub async fn update_lead(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateLeadRequest>,
) -> Result<Json<Lead>, ApiError> {
    let mut conn = state.conn.get()?;
    load_lead(&mut conn, id)?;

    let target = leads::table.filter(leads::id.eq(id));
    let mut updated_fields: Vec<&'static str> = Vec::new();

    diesel::update(target)
        .set(leads::updated_at.eq(Utc::now()))
        .execute(&mut conn)?;

    if let Some(name) = &req.name {
        diesel::update(target)
            .set(leads::name.eq(name))
            .execute(&mut conn)?;
        updated_fields.push("name");
    }
    if let Some(email) = &req.email {
        diesel::update(target)
            .set(leads::email.eq(email))
            .execute(&mut conn)?;
        updated_fields.push("email");
    }
    if let Some(phone) = &req.phone {
        diesel::update(target)
            .set(leads::phone.eq(phone))
            .execute(&mut conn)?;
        updated_fields.push("phone");
    }
    if let Some(company) = &req.company {
        diesel::update(target)
            .set(leads::company.eq(company))
            .execute(&mut conn)?;
        updated_fields.push("company");
    }
    if let Some(designation) = &req.designation {
        diesel::update(target)
            .set(leads::designation.eq(designation))
            .execute(&mut conn)?;
        updated_fields.push("designation");
    }
    if let Some(industry) = &req.industry {
        diesel::update(target)
            .set(leads::industry.eq(industry))
            .execute(&mut conn)?;
        updated_fields.push("industry");
    }
    if let Some(location) = &req.location {
        diesel::update(target)
            .set(leads::location.eq(location))
            .execute(&mut conn)?;
        updated_fields.push("location");
    }
    if let Some(status) = req.status {
        diesel::update(target)
            .set(leads::status.eq(status.as_str()))
            .execute(&mut conn)?;
        updated_fields.push("status");
    }
    if let Some(notes) = &req.notes {
        diesel::update(target)
            .set(leads::notes.eq(notes))
            .execute(&mut conn)?;
        updated_fields.push("notes");
    }
    if let Some(tags) = &req.tags {
        diesel::update(target)
            .set(leads::tags.eq(tags))
            .execute(&mut conn)?;
        updated_fields.push("tags");
    }
    if let Some(campaign_id) = req.campaign_id {
        diesel::update(target)
            .set(leads::campaign_id.eq(campaign_id))
            .execute(&mut conn)?;
        updated_fields.push("campaign_id");
    }
    if let Some(assigned_to) = req.assigned_to {
        diesel::update(target)
            .set(leads::assigned_to.eq(assigned_to))
            .execute(&mut conn)?;
        updated_fields.push("assigned_to");
    }
    if let Some(score) = req.score {
        diesel::update(target)
            .set(leads::score.eq(score))
            .execute(&mut conn)?;
        updated_fields.push("score");
    }

    if let Err(e) = record_lead_activity(
        &mut conn,
        id,
        ActivityType::Updated,
        "Lead information updated".to_string(),
        user.user_id,
        Some(serde_json::json!({ "updated_fields": updated_fields })),
    ) {
        warn!("lead update activity failed: {e}");
    }

    let lead = load_lead(&mut conn, id)?;
    Ok(Json(lead))
}

pub async fn delete_lead(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    user.require_manager("delete leads")?;
    let mut conn = state.conn.get()?;

    let updated = diesel::update(leads::table.filter(leads::id.eq(id)))
        .set((leads::is_deleted.eq(true), leads::updated_at.eq(Utc::now())))
        .execute(&mut conn)?;
    if updated == 0 {
        return Err(ApiError::NotFound("Lead"));
    }

    Ok(Json(serde_json::json!({ "message": "Lead deleted successfully" })))
}

#[derive(Debug, Deserialize)]
pub struct QualifyRequest {
    pub notes: Option<String>,
}

pub async fn qualify_lead(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<QualifyRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut conn = state.conn.get()?;
    let lead = load_lead(&mut conn, id)?;
    let now = Utc::now();

    diesel::update(leads::table.filter(leads::id.eq(id)))
        .set((
            leads::status.eq(LeadStatus::Qualified.as_str()),
            leads::last_contacted_at.eq(now),
            leads::updated_at.eq(now),
        ))
        .execute(&mut conn)?;

    if let Some(notes) = &req.notes {
        let combined = append_qualify_note(lead.notes.as_deref(), notes);
        diesel::update(leads::table.filter(leads::id.eq(id)))
            .set(leads::notes.eq(combined))
            .execute(&mut conn)?;
    }

    let description = match &req.notes {
        Some(notes) => format!("Lead qualified: {notes}"),
        None => "Lead qualified".to_string(),
    };
    if let Err(e) = record_lead_activity(
        &mut conn,
        id,
        ActivityType::Qualified,
        description,
        user.user_id,
        Some(serde_json::json!({ "notes": req.notes })),
    ) {
        warn!("lead qualify activity failed: {e}");
    }

    if let Some(campaign_id) = lead.campaign_id {
        let source = lead.source.parse().unwrap_or(LeadSource::Other);
        if let Err(e) = rollup::increment_qualified_leads(&mut conn, campaign_id) {
            warn!("campaign qualified_leads bump failed for {campaign_id}: {e}");
        }
        if let Err(e) = rollup::increment_today_qualified(&mut conn, campaign_id, source) {
            warn!("daily qualified bump failed for {campaign_id}: {e}");
        }
    }

    Ok(Json(serde_json::json!({ "message": "Lead qualified successfully" })))
}

#[derive(Debug, Deserialize)]
pub struct DisqualifyRequest {
    pub reason: DisqualificationReason,
    pub notes: Option<String>,
}

pub async fn disqualify_lead(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<DisqualifyRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut conn = state.conn.get()?;
    let lead = load_lead(&mut conn, id)?;
    let now = Utc::now();

    diesel::update(leads::table.filter(leads::id.eq(id)))
        .set((
            leads::status.eq(LeadStatus::Disqualified.as_str()),
            leads::disqualification_reason.eq(req.reason.as_str()),
            leads::disqualification_notes.eq(req.notes.clone()),
            leads::last_contacted_at.eq(now),
            leads::updated_at.eq(now),
        ))
        .execute(&mut conn)?;

    if let Err(e) = record_lead_activity(
        &mut conn,
        id,
        ActivityType::Disqualified,
        format!("Lead disqualified: {}", req.reason.as_str()),
        user.user_id,
        Some(serde_json::json!({ "reason": req.reason.as_str(), "notes": req.notes })),
    ) {
        warn!("lead disqualify activity failed: {e}");
    }

    if let Some(campaign_id) = lead.campaign_id {
        let source = lead.source.parse().unwrap_or(LeadSource::Other);
        if let Err(e) = rollup::increment_disqualified_leads(&mut conn, campaign_id) {
            warn!("campaign disqualified_leads bump failed for {campaign_id}: {e}");
        }
        if let Err(e) = rollup::increment_today_disqualified(&mut conn, campaign_id, source) {
            warn!("daily disqualified bump failed for {campaign_id}: {e}");
        }
    }

    Ok(Json(serde_json::json!({ "message": "Lead disqualified successfully" })))
}

pub async fn get_lead_activities(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<LeadActivity>>, ApiError> {
    let mut conn = state.conn.get()?;

    let rows: Vec<LeadActivity> = lead_activities::table
        .filter(lead_activities::lead_id.eq(id))
        .order(lead_activities::created_at.desc())
        .limit(100)
        .load(&mut conn)?;

    Ok(Json(rows))
}

pub async fn bulk_import_leads(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(reqs): Json<Vec<CreateLeadRequest>>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    user.require_manager("bulk import leads")?;
    let mut conn = state.conn.get()?;

    let mut imported = Vec::with_capacity(reqs.len());
    for req in reqs {
        let lead = insert_lead(&mut conn, req, user.user_id)?;
        if let Some(campaign_id) = lead.campaign_id {
            if let Err(e) = rollup::increment_total_leads(&mut conn, campaign_id) {
                warn!("campaign total_leads bump failed for {campaign_id}: {e}");
            }
        }
        imported.push(lead);
    }

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": format!("{} leads imported successfully", imported.len()),
            "leads": imported,
        })),
    ))
}

pub fn configure_lead_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/leads", get(list_leads).post(create_lead))
        .route("/api/leads/bulk", post(bulk_import_leads))
        .route(
            "/api/leads/:id",
            get(get_lead).put(update_lead).delete(delete_lead),
        )
        .route("/api/leads/:id/qualify", post(qualify_lead))
        .route("/api/leads/:id/disqualify", post(disqualify_lead))
        .route("/api/leads/:id/activities", get(get_lead_activities))
}
