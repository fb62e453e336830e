use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use diesel::prelude::*;
use log::warn;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::schema::{tasks, users};
use crate::state::AppState;
use crate::tasks::Task;
use crate::users::User;

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
}

/// Streams the current task list as a CSV attachment.
pub async fn export_report(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ExportQuery>,
) -> Result<(HeaderMap, Vec<u8>), ApiError> {
    let format = query.format.unwrap_or_else(|| "csv".to_string());
    if format != "csv" {
        return Err(ApiError::Validation(format!(
            "Unsupported export format: {format}"
        )));
    }

    let mut conn = state.conn.get()?;

    let rows: Vec<Task> = tasks::table
        .filter(tasks::is_deleted.eq(false))
        .order(tasks::created_at.desc())
        .limit(1000)
        .load(&mut conn)?;

    // Assignee names are a nicety; an empty map still yields a valid report.
    let assignee_ids: Vec<Uuid> = rows.iter().filter_map(|t| t.assigned_to).collect();
    let names: HashMap<Uuid, String> = match users::table
        .filter(users::id.eq_any(&assignee_ids))
        .load::<User>(&mut conn)
    {
        Ok(found) => found
            .into_iter()
            .map(|u| {
                let name = u.display_name();
                (u.id, name)
            })
            .collect(),
        Err(e) => {
            warn!("report assignee lookup failed: {e}");
            HashMap::new()
        }
    };

    let body = render_tasks_csv(&rows, &names).map_err(|e| ApiError::Database(e.to_string()))?;

    let filename = format!("tasks_report_{}.csv", Utc::now().format("%Y%m%d_%H%M%S"));
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/csv; charset=utf-8"),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
            .map_err(|e| ApiError::Database(e.to_string()))?,
    );

    Ok((headers, body))
}

fn render_tasks_csv(
    rows: &[Task],
    names: &HashMap<Uuid, String>,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "Title",
        "Status",
        "Priority",
        "Due Date",
        "Assigned To",
        "Created At",
    ])?;

    for task in rows {
        let due = task
            .due_date
            .map(|d| d.to_rfc3339())
            .unwrap_or_default();
        let assignee = task
            .assigned_to
            .and_then(|id| names.get(&id).cloned())
            .unwrap_or_else(|| "Unassigned".to_string());
        writer.write_record([
            task.title.as_str(),
            task.status.as_str(),
            task.priority.as_str(),
            due.as_str(),
            assignee.as_str(),
            task.created_at.to_rfc3339().as_str(),
        ])?;
    }

    Ok(writer.into_inner()?)
}

pub fn configure_report_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/reports/export", get(export_report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn sample_task(assigned_to: Option<Uuid>) -> Task {
        let created = Utc.with_ymd_and_hms(2026, 1, 15, 9, 30, 0).unwrap();
        Task {
            id: Uuid::new_v4(),
            title: "Call back ACME".to_string(),
            description: None,
            status: "todo".to_string(),
            priority: "high".to_string(),
            due_date: None,
            assigned_to,
            created_by: Uuid::new_v4(),
            tags: vec![],
            time_logged: 0,
            lead_id: None,
            created_at: created,
            updated_at: created,
            is_deleted: false,
        }
    }

    #[test]
    fn csv_includes_header_and_rows() {
        let assignee = Uuid::new_v4();
        let mut names = HashMap::new();
        names.insert(assignee, "Dana Ops".to_string());

        let rows = vec![sample_task(Some(assignee)), sample_task(None)];
        let out = render_tasks_csv(&rows, &names).unwrap();
        let text = String::from_utf8(out).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "Title,Status,Priority,Due Date,Assigned To,Created At"
        );
        assert!(lines[1].contains("Dana Ops"));
        assert!(lines[2].contains("Unassigned"));
    }

    #[test]
    fn csv_empty_task_list_is_header_only() {
        let out = render_tasks_csv(&[], &HashMap::new()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
    }
}
