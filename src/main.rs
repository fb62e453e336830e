use axum::http::HeaderValue;
use axum::routing::get;
use axum::{Json, Router};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::info;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use leadserver::activity_logs::configure_activity_log_routes;
use leadserver::analytics::configure_analytics_routes;
use leadserver::auth::configure_auth_routes;
use leadserver::campaigns::configure_campaign_routes;
use leadserver::comments::configure_comment_routes;
use leadserver::config::AppConfig;
use leadserver::daily_metrics::configure_daily_metrics_routes;
use leadserver::leads::configure_lead_routes;
use leadserver::notifications::configure_notification_routes;
use leadserver::reports::configure_report_routes;
use leadserver::state::AppState;
use leadserver::tasks::configure_task_routes;
use leadserver::users::configure_user_routes;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

async fn root_info() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "leadserver",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = AppConfig::from_env()?;
    let bind_addr = config.bind_addr.clone();
    let cors_origins = config.cors_origins.clone();
    let state = Arc::new(AppState::new(config)?);

    {
        let mut conn = state.conn.get()?;
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|e| anyhow::anyhow!("failed to run migrations: {e}"))?;
        info!("database migrations are up to date");
    }

    let origins: Vec<HeaderValue> = cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(root_info))
        .route("/health", get(health))
        .merge(configure_auth_routes())
        .merge(configure_user_routes())
        .merge(configure_task_routes())
        .merge(configure_comment_routes())
        .merge(configure_notification_routes())
        .merge(configure_activity_log_routes())
        .merge(configure_lead_routes())
        .merge(configure_campaign_routes())
        .merge(configure_daily_metrics_routes())
        .merge(configure_analytics_routes())
        .merge(configure_report_routes())
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("listening on {bind_addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
