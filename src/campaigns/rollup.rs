//! Per-campaign counters and the per-day target rows that back them.
//!
//! Target rows are keyed by (campaign_id, target_date) with a unique
//! constraint, so concurrent writers land on the same row instead of
//! growing duplicates. Counter bumps are single atomic UPDATEs.

use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::leads::types::LeadSource;
use crate::schema::{campaigns, daily_targets};
use crate::state::DbConn;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = daily_targets)]
pub struct DailyTarget {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub target_date: NaiveDate,
    pub data_target: i32,
    pub calling_target: i32,
    pub data_achieved: i32,
    pub calling_achieved: i32,
    pub qualified_data: i32,
    pub qualified_calling: i32,
    pub disqualified_data: i32,
    pub disqualified_calling: i32,
}

/// Inserts or updates the target row for a given day. Only the supplied
/// target columns are written on conflict; achieved and qualified
/// counters are never touched here.
pub fn upsert_target(
    conn: &mut DbConn,
    campaign_id: Uuid,
    date: NaiveDate,
    data_target: Option<i32>,
    calling_target: Option<i32>,
) -> Result<(), diesel::result::Error> {
    let row = DailyTarget {
        id: Uuid::new_v4(),
        campaign_id,
        target_date: date,
        data_target: data_target.unwrap_or(0),
        calling_target: calling_target.unwrap_or(0),
        data_achieved: 0,
        calling_achieved: 0,
        qualified_data: 0,
        qualified_calling: 0,
        disqualified_data: 0,
        disqualified_calling: 0,
    };

    let insert = diesel::insert_into(daily_targets::table)
        .values(&row)
        .on_conflict((daily_targets::campaign_id, daily_targets::target_date));

    match (data_target, calling_target) {
        (Some(d), Some(c)) => insert
            .do_update()
            .set((
                daily_targets::data_target.eq(d),
                daily_targets::calling_target.eq(c),
            ))
            .execute(conn)?,
        (Some(d), None) => insert
            .do_update()
            .set(daily_targets::data_target.eq(d))
            .execute(conn)?,
        (None, Some(c)) => insert
            .do_update()
            .set(daily_targets::calling_target.eq(c))
            .execute(conn)?,
        (None, None) => insert.do_nothing().execute(conn)?,
    };

    Ok(())
}

/// Records achieved counts against an existing target row. Updating a
/// day that has no target row is a silent no-op; achievements only make
/// sense against a declared target.
pub fn set_achieved(
    conn: &mut DbConn,
    campaign_id: Uuid,
    date: NaiveDate,
    data_achieved: Option<i32>,
    calling_achieved: Option<i32>,
) -> Result<usize, diesel::result::Error> {
    let target = daily_targets::table
        .filter(daily_targets::campaign_id.eq(campaign_id))
        .filter(daily_targets::target_date.eq(date));

    let mut touched = 0;
    if let Some(d) = data_achieved {
        touched += diesel::update(target)
            .set(daily_targets::data_achieved.eq(d))
            .execute(conn)?;
    }
    if let Some(c) = calling_achieved {
        touched += diesel::update(target)
            .set(daily_targets::calling_achieved.eq(c))
            .execute(conn)?;
    }
    Ok(touched)
}

pub fn increment_total_leads(
    conn: &mut DbConn,
    campaign_id: Uuid,
) -> Result<(), diesel::result::Error> {
    diesel::update(campaigns::table.filter(campaigns::id.eq(campaign_id)))
        .set(campaigns::total_leads.eq(campaigns::total_leads + 1))
        .execute(conn)?;
    Ok(())
}

pub fn increment_qualified_leads(
    conn: &mut DbConn,
    campaign_id: Uuid,
) -> Result<(), diesel::result::Error> {
    diesel::update(campaigns::table.filter(campaigns::id.eq(campaign_id)))
        .set(campaigns::qualified_leads.eq(campaigns::qualified_leads + 1))
        .execute(conn)?;
    Ok(())
}

pub fn increment_disqualified_leads(
    conn: &mut DbConn,
    campaign_id: Uuid,
) -> Result<(), diesel::result::Error> {
    diesel::update(campaigns::table.filter(campaigns::id.eq(campaign_id)))
        .set(campaigns::disqualified_leads.eq(campaigns::disqualified_leads + 1))
        .execute(conn)?;
    Ok(())
}

/// Bumps today's per-channel qualified counter. Only calling and
/// data_entry leads have a day channel; other sources are a no-op, as
/// is a day with no target row.
pub fn increment_today_qualified(
    conn: &mut DbConn,
    campaign_id: Uuid,
    source: LeadSource,
) -> Result<(), diesel::result::Error> {
    let today = daily_targets::table
        .filter(daily_targets::campaign_id.eq(campaign_id))
        .filter(daily_targets::target_date.eq(Utc::now().date_naive()));

    match source {
        LeadSource::Calling => {
            diesel::update(today)
                .set(daily_targets::qualified_calling.eq(daily_targets::qualified_calling + 1))
                .execute(conn)?;
        }
        LeadSource::DataEntry => {
            diesel::update(today)
                .set(daily_targets::qualified_data.eq(daily_targets::qualified_data + 1))
                .execute(conn)?;
        }
        _ => {}
    }
    Ok(())
}

pub fn increment_today_disqualified(
    conn: &mut DbConn,
    campaign_id: Uuid,
    source: LeadSource,
) -> Result<(), diesel::result::Error> {
    let today = daily_targets::table
        .filter(daily_targets::campaign_id.eq(campaign_id))
        .filter(daily_targets::target_date.eq(Utc::now().date_naive()));

    match source {
        LeadSource::Calling => {
            diesel::update(today)
                .set(
                    daily_targets::disqualified_calling
                        .eq(daily_targets::disqualified_calling + 1),
                )
                .execute(conn)?;
        }
        LeadSource::DataEntry => {
            diesel::update(today)
                .set(daily_targets::disqualified_data.eq(daily_targets::disqualified_data + 1))
                .execute(conn)?;
        }
        _ => {}
    }
    Ok(())
}

pub fn today_target(
    conn: &mut DbConn,
    campaign_id: Uuid,
) -> Result<Option<DailyTarget>, diesel::result::Error> {
    daily_targets::table
        .filter(daily_targets::campaign_id.eq(campaign_id))
        .filter(daily_targets::target_date.eq(Utc::now().date_naive()))
        .first(conn)
        .optional()
}

pub fn list_targets(
    conn: &mut DbConn,
    campaign_id: Uuid,
) -> Result<Vec<DailyTarget>, diesel::result::Error> {
    daily_targets::table
        .filter(daily_targets::campaign_id.eq(campaign_id))
        .order(daily_targets::target_date.asc())
        .load(conn)
}

/// Conversion percentage, rounded to two decimals. A campaign with no
/// leads converts at 0, not NaN.
pub fn conversion_rate(converted: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let pct = converted as f64 / total as f64 * 100.0;
    (pct * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn conversion_rate_zero_total_is_zero() {
        assert_eq!(conversion_rate(0, 0), 0.0);
        assert_eq!(conversion_rate(5, 0), 0.0);
    }

    #[test]
    fn conversion_rate_rounds_to_two_decimals() {
        assert_eq!(conversion_rate(1, 3), 33.33);
        assert_eq!(conversion_rate(2, 3), 66.67);
        assert_eq!(conversion_rate(50, 100), 50.0);
        assert_eq!(conversion_rate(100, 100), 100.0);
    }
}
