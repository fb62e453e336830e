use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{Duration, NaiveDate, Utc};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Date, Timestamptz, Uuid as SqlUuid};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::claims::AuthUser;
use crate::campaigns::rollup;
use crate::campaigns::Campaign;
use crate::error::ApiError;
use crate::leads::types::LeadStatus;
use crate::schema::{campaigns, leads, users};
use crate::state::AppState;
use crate::users::User;

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Five-stage funnel shares, each as a percentage of the stage total.
/// An empty funnel yields all zeros rather than dividing by zero.
pub fn funnel_percentages(counts: &[i64; 5]) -> [f64; 5] {
    let total: i64 = counts.iter().sum();
    if total == 0 {
        return [0.0; 5];
    }
    let mut out = [0.0; 5];
    for (i, c) in counts.iter().enumerate() {
        out[i] = round2(*c as f64 / total as f64 * 100.0);
    }
    out
}

#[derive(Debug, Deserialize)]
pub struct OverviewQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub campaign_id: Option<Uuid>,
}

#[derive(Debug, QueryableByName, Serialize)]
struct DailyTrendRow {
    #[diesel(sql_type = Date)]
    day: NaiveDate,
    #[diesel(sql_type = BigInt)]
    count: i64,
}

pub async fn leads_overview(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Query(query): Query<OverviewQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut conn = state.conn.get()?;

    let end = query.end_date.unwrap_or_else(|| Utc::now().date_naive());
    let start = query.start_date.unwrap_or(end - Duration::days(30));
    let start_at = start.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
    let end_at = (end + Duration::days(1))
        .and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc();

    // Grouped queries cannot be boxed, so the optional campaign filter is
    // boxed as a predicate instead.
    let campaign_predicate = || -> Box<
        dyn diesel::BoxableExpression<
            leads::table,
            diesel::pg::Pg,
            SqlType = diesel::sql_types::Nullable<diesel::sql_types::Bool>,
        >,
    > {
        match query.campaign_id {
            Some(campaign_id) => Box::new(leads::campaign_id.eq(campaign_id)),
            None => Box::new(diesel::dsl::sql::<
                diesel::sql_types::Nullable<diesel::sql_types::Bool>,
            >("TRUE")),
        }
    };

    let total_leads: i64 = leads::table
        .filter(leads::is_deleted.eq(false))
        .filter(leads::created_at.ge(start_at))
        .filter(leads::created_at.lt(end_at))
        .filter(campaign_predicate())
        .count()
        .get_result(&mut conn)?;

    let by_status: Vec<(String, i64)> = leads::table
        .filter(leads::is_deleted.eq(false))
        .filter(leads::created_at.ge(start_at))
        .filter(leads::created_at.lt(end_at))
        .filter(campaign_predicate())
        .group_by(leads::status)
        .select((leads::status, diesel::dsl::count_star()))
        .load(&mut conn)?;

    let by_source: Vec<(String, i64)> = leads::table
        .filter(leads::is_deleted.eq(false))
        .filter(leads::created_at.ge(start_at))
        .filter(leads::created_at.lt(end_at))
        .filter(campaign_predicate())
        .group_by(leads::source)
        .select((leads::source, diesel::dsl::count_star()))
        .load(&mut conn)?;

    let reasons: Vec<(Option<String>, i64)> = leads::table
        .filter(leads::is_deleted.eq(false))
        .filter(leads::created_at.ge(start_at))
        .filter(leads::created_at.lt(end_at))
        .filter(campaign_predicate())
        .filter(leads::status.eq(LeadStatus::Disqualified.as_str()))
        .group_by(leads::disqualification_reason)
        .select((leads::disqualification_reason, diesel::dsl::count_star()))
        .load(&mut conn)?;
    let mut disqualification_reasons: Vec<(String, i64)> = reasons
        .into_iter()
        .filter_map(|(reason, count)| reason.map(|r| (r, count)))
        .collect();
    disqualification_reasons.sort_by(|a, b| b.1.cmp(&a.1));

    let trend_sql = if query.campaign_id.is_some() {
        "SELECT date(created_at) AS day, count(*) AS count FROM leads \
         WHERE is_deleted = false AND created_at >= $1 AND created_at < $2 \
         AND campaign_id = $3 GROUP BY day ORDER BY day ASC"
    } else {
        "SELECT date(created_at) AS day, count(*) AS count FROM leads \
         WHERE is_deleted = false AND created_at >= $1 AND created_at < $2 \
         GROUP BY day ORDER BY day ASC"
    };
    let daily_trend: Vec<DailyTrendRow> = if let Some(campaign_id) = query.campaign_id {
        diesel::sql_query(trend_sql)
            .bind::<Timestamptz, _>(start_at)
            .bind::<Timestamptz, _>(end_at)
            .bind::<SqlUuid, _>(campaign_id)
            .load(&mut conn)?
    } else {
        diesel::sql_query(trend_sql)
            .bind::<Timestamptz, _>(start_at)
            .bind::<Timestamptz, _>(end_at)
            .load(&mut conn)?
    };

    Ok(Json(serde_json::json!({
        "total_leads": total_leads,
        "by_status": by_status.into_iter().collect::<HashMap<String, i64>>(),
        "by_source": by_source.into_iter().collect::<HashMap<String, i64>>(),
        "disqualification_reasons": disqualification_reasons
            .into_iter()
            .map(|(reason, count)| serde_json::json!({ "reason": reason, "count": count }))
            .collect::<Vec<_>>(),
        "daily_trend": daily_trend,
        "date_range": { "start": start, "end": end },
    })))
}

pub async fn campaigns_overview(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut conn = state.conn.get()?;

    let all: Vec<Campaign> = campaigns::table
        .filter(campaigns::is_deleted.eq(false))
        .order(campaigns::created_at.desc())
        .load(&mut conn)?;

    // Counters on the campaign row can drift from the lead table; this
    // view recounts from leads so it stays truthful.
    let mut rows = Vec::with_capacity(all.len());
    for campaign in all {
        let base = || {
            leads::table
                .filter(leads::campaign_id.eq(campaign.id))
                .filter(leads::is_deleted.eq(false))
        };

        let total: i64 = base().count().get_result(&mut conn)?;
        let qualified: i64 = base()
            .filter(leads::status.eq(LeadStatus::Qualified.as_str()))
            .count()
            .get_result(&mut conn)?;
        let disqualified: i64 = base()
            .filter(leads::status.eq(LeadStatus::Disqualified.as_str()))
            .count()
            .get_result(&mut conn)?;

        let conversion_rate = if total == 0 {
            0.0
        } else {
            round2(qualified as f64 / total as f64 * 100.0)
        };
        let today_target = rollup::today_target(&mut conn, campaign.id)?;

        rows.push(serde_json::json!({
            "campaign_id": campaign.id,
            "name": campaign.name,
            "status": campaign.status,
            "total_leads": total,
            "qualified_leads": qualified,
            "disqualified_leads": disqualified,
            "conversion_rate": conversion_rate,
            "today_target": today_target,
        }));
    }

    Ok(Json(serde_json::json!({ "campaigns": rows })))
}

#[derive(Debug, QueryableByName)]
struct TeamPerformanceRow {
    #[diesel(sql_type = SqlUuid)]
    assigned_to: Uuid,
    #[diesel(sql_type = BigInt)]
    total: i64,
    #[diesel(sql_type = BigInt)]
    qualified: i64,
    #[diesel(sql_type = BigInt)]
    disqualified: i64,
    #[diesel(sql_type = BigInt)]
    contacted: i64,
}

#[derive(Debug, Deserialize)]
pub struct TeamPerformanceQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

pub async fn team_performance(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<TeamPerformanceQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    user.require_manager("view team performance")?;
    let mut conn = state.conn.get()?;

    let end = query.end_date.unwrap_or_else(|| Utc::now().date_naive());
    let start = query.start_date.unwrap_or(end - Duration::days(30));
    let start_at = start.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
    let end_at = (end + Duration::days(1))
        .and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc();

    let rows: Vec<TeamPerformanceRow> = diesel::sql_query(
        "SELECT assigned_to, count(*) AS total, \
         COALESCE(SUM(CASE WHEN status = 'qualified' THEN 1 ELSE 0 END), 0)::bigint AS qualified, \
         COALESCE(SUM(CASE WHEN status = 'disqualified' THEN 1 ELSE 0 END), 0)::bigint AS disqualified, \
         COALESCE(SUM(CASE WHEN status = 'contacted' THEN 1 ELSE 0 END), 0)::bigint AS contacted \
         FROM leads WHERE is_deleted = false AND assigned_to IS NOT NULL \
         AND created_at >= $1 AND created_at < $2 \
         GROUP BY assigned_to ORDER BY total DESC",
    )
    .bind::<Timestamptz, _>(start_at)
    .bind::<Timestamptz, _>(end_at)
    .load(&mut conn)?;

    let member_ids: Vec<Uuid> = rows.iter().map(|r| r.assigned_to).collect();
    let members: HashMap<Uuid, User> = users::table
        .filter(users::id.eq_any(&member_ids))
        .load::<User>(&mut conn)?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let performance: Vec<serde_json::Value> = rows
        .into_iter()
        .map(|row| {
            let (name, email) = members
                .get(&row.assigned_to)
                .map(|u| (u.display_name(), u.email.clone()))
                .unwrap_or_else(|| ("Unknown User".to_string(), String::new()));
            let conversion_rate = if row.total == 0 {
                0.0
            } else {
                round2(row.qualified as f64 / row.total as f64 * 100.0)
            };
            serde_json::json!({
                "user_id": row.assigned_to,
                "user_name": name,
                "user_email": email,
                "total_leads": row.total,
                "qualified_leads": row.qualified,
                "disqualified_leads": row.disqualified,
                "contacted_leads": row.contacted,
                "conversion_rate": conversion_rate,
            })
        })
        .collect();

    Ok(Json(serde_json::json!({ "team_performance": performance })))
}

#[derive(Debug, Deserialize)]
pub struct FunnelQuery {
    pub campaign_id: Option<Uuid>,
}

pub async fn conversion_funnel(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Query(query): Query<FunnelQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut conn = state.conn.get()?;

    let stages = [
        LeadStatus::New,
        LeadStatus::Contacted,
        LeadStatus::Qualified,
        LeadStatus::Disqualified,
        LeadStatus::Converted,
    ];

    let mut counts = [0i64; 5];
    for (i, stage) in stages.iter().enumerate() {
        let mut q = leads::table
            .filter(leads::is_deleted.eq(false))
            .filter(leads::status.eq(stage.as_str()))
            .into_boxed();
        if let Some(campaign_id) = query.campaign_id {
            q = q.filter(leads::campaign_id.eq(campaign_id));
        }
        counts[i] = q.count().get_result(&mut conn)?;
    }

    let percentages = funnel_percentages(&counts);
    let funnel: Vec<serde_json::Value> = stages
        .iter()
        .zip(counts.iter())
        .zip(percentages.iter())
        .map(|((stage, count), pct)| {
            serde_json::json!({
                "stage": stage.as_str(),
                "count": count,
                "percentage": pct,
            })
        })
        .collect();

    Ok(Json(serde_json::json!({
        "funnel": funnel,
        "total": counts.iter().sum::<i64>(),
    })))
}

pub fn configure_analytics_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/analytics/leads/overview", get(leads_overview))
        .route("/api/analytics/campaigns/overview", get(campaigns_overview))
        .route("/api/analytics/team/performance", get(team_performance))
        .route("/api/analytics/conversion-funnel", get(conversion_funnel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn funnel_empty_is_all_zero() {
        assert_eq!(funnel_percentages(&[0, 0, 0, 0, 0]), [0.0; 5]);
    }

    #[test]
    fn funnel_percentages_sum_to_one_hundred() {
        let pct = funnel_percentages(&[10, 5, 3, 1, 1]);
        let sum: f64 = pct.iter().sum();
        assert!((sum - 100.0).abs() < 0.05, "sum was {sum}");
    }

    #[test]
    fn funnel_single_stage_is_full_share() {
        let pct = funnel_percentages(&[0, 0, 7, 0, 0]);
        assert_eq!(pct, [0.0, 0.0, 100.0, 0.0, 0.0]);
    }

    #[test]
    fn funnel_rounds_to_two_decimals() {
        let pct = funnel_percentages(&[1, 1, 1, 0, 0]);
        assert_eq!(pct[0], 33.33);
    }
}
