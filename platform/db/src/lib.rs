//! Database primitives: pool settings, connection, and the employee store.

mod store;

pub use store::{DbEmployeeStore, EmployeeDraft, EmployeeStore};

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use thiserror::Error;

/// Shared database connection handle.
pub type DbPool = DatabaseConnection;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database url missing; set DATABASE_URL")]
    MissingUrl,
    #[error(transparent)]
    Db(#[from] sea_orm::DbErr),
}

pub type DbResult<T> = Result<T, DbError>;

/// Environment-driven connection settings.
#[derive(Clone, Debug)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: u32,
}

impl DatabaseSettings {
    pub fn from_env() -> Self {
        let url = std::env::var("DATABASE_URL").ok();
        let max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(5);
        Self {
            url,
            max_connections,
        }
    }
}

/// Open a connection pool from settings.
pub async fn connect(settings: &DatabaseSettings) -> DbResult<DbPool> {
    let url = settings.url.as_deref().ok_or(DbError::MissingUrl)?;
    let mut options = ConnectOptions::new(url.to_owned());
    options
        .max_connections(settings.max_connections)
        .sqlx_logging(false);
    let pool = Database::connect(options).await?;
    Ok(pool)
}
