use diesel::r2d2::{ConnectionManager, Pool};
use diesel::PgConnection;

use crate::config::AppConfig;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;
pub type DbConn = diesel::r2d2::PooledConnection<ConnectionManager<PgConnection>>;

/// Shared application state. The pool is constructed once at startup and
/// handed to every handler through axum's `State`; there is no global
/// database handle anywhere in the crate.
pub struct AppState {
    pub conn: DbPool,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);
        let pool = Pool::builder().build(manager)?;
        Ok(Self { conn: pool, config })
    }
}
