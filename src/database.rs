use sqlx::{postgres::PgPoolOptions, Pool, Postgres};
use std::time::Duration;
use tracing::info;

use crate::config::DatabaseConfig;

#[derive(Clone)]
pub struct Database {
    pub pool: Pool<Postgres>,
}

impl Database {
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect(&config.url)
            .await?;

        Ok(Database { pool })
    }

    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("./src/migrations")
            .run(&self.pool)
            .await?;
        info!("Migrations completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    const INIT_SQL: &str = include_str!("migrations/0001_init.sql");

    fn table_ddl(table: &str) -> &'static str {
        let start = INIT_SQL
            .find(&format!("CREATE TABLE IF NOT EXISTS {table} ("))
            .unwrap();
        let len = INIT_SQL[start..].find(");").unwrap();
        &INIT_SQL[start..start + len]
    }

    #[test]
    fn keeps_accept_gateway_accounts_without_a_local_row() {
        let keeps = table_ddl("keeps");
        assert!(!keeps.contains("REFERENCES accounts"));
        assert!(keeps.contains("REFERENCES venues(id)"));
    }

    #[test]
    fn floors_reserve_the_all_code() {
        assert!(table_ddl("floors").contains("CHECK (code <> 'ALL')"));
    }
}
