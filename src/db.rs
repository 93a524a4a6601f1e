pub mod query_builder;

use std::time::{Duration, Instant};

use metrics::gauge;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend};
use sea_orm_migration::MigratorTrait;
use tracing::{debug, error, info};

use crate::config::AppConfig;
use crate::errors::ServiceError;

pub use query_builder::{QueryBuilder, SearchBuilder};

/// Type alias for a database connection pool
pub type DbPool = DatabaseConnection;

fn is_in_memory(url: &str) -> bool {
    url.starts_with("sqlite::memory:") || url.contains("mode=memory")
}

/// Pool options derived from the `db_*` settings. An in-memory SQLite
/// database lives inside a single connection, so its pool is pinned to one.
pub fn connect_options(cfg: &AppConfig) -> ConnectOptions {
    let url = cfg.database_url();
    let (max, min) = if is_in_memory(url) {
        (1, 1)
    } else {
        (cfg.db_max_connections, cfg.db_min_connections)
    };

    let mut opt = ConnectOptions::new(url.to_string());
    opt.max_connections(max)
        .min_connections(min)
        .connect_timeout(Duration::from_secs(cfg.db_connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(cfg.db_acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(cfg.db_idle_timeout_secs))
        .sqlx_logging(cfg.is_development());
    opt
}

/// Opens the catalog database
pub async fn connect(cfg: &AppConfig) -> Result<DbPool, ServiceError> {
    let opt = connect_options(cfg);
    debug!(
        max_connections = opt.get_max_connections(),
        "Configuring database connection"
    );
    if let Some(max) = opt.get_max_connections() {
        gauge!("iron_catalog_db.max_connections", max as f64);
    }

    let pool = Database::connect(opt).await.map_err(|e| {
        error!("Database connection establishment failed: {}", e);
        ServiceError::DatabaseError(e)
    })?;
    info!(backend = backend_name(&pool), "Database connection pool established");
    Ok(pool)
}

/// Creates or upgrades the catalog, lead, estimate and portal tables
pub async fn run_migrations(pool: &DbPool) -> Result<(), ServiceError> {
    let started = Instant::now();
    match crate::migrator::Migrator::up(pool, None).await {
        Ok(()) => {
            info!(elapsed_ms = started.elapsed().as_millis() as u64, "Database migrations applied");
            Ok(())
        }
        Err(e) => {
            error!("Database migrations failed: {}", e);
            Err(ServiceError::DatabaseError(e))
        }
    }
}

/// Round-trips a ping; used by `/health`
pub async fn check_connection(pool: &DbPool) -> Result<(), ServiceError> {
    pool.ping().await.map_err(|e| {
        error!("Database ping failed: {}", e);
        ServiceError::ServiceUnavailable("Database unavailable".to_string())
    })
}

pub fn backend_name(pool: &DbPool) -> &'static str {
    match pool.get_database_backend() {
        DbBackend::Postgres => "postgres",
        DbBackend::MySql => "mysql",
        DbBackend::Sqlite => "sqlite",
    }
}
