use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager, PooledConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("../migrations");

pub type DbPool = r2d2::Pool<ConnectionManager<PgConnection>>;

pub type DbConn = PooledConnection<ConnectionManager<PgConnection>>;

pub fn create_pool(database_url: &str) -> DbPool {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = r2d2::Pool::builder()
        .build(manager)
        .expect("Failed to create database pool");

    // Run pending migrations on startup
    let mut conn = pool
        .get()
        .expect("Failed to get DB connection for migrations");
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .expect("Failed to run database migrations");
    if !applied.is_empty() {
        tracing::info!(count = applied.len(), "applied database migrations");
    }

    pool
}

#[cfg(test)]
mod tests {
    const RECIPES_UP: &str =
        include_str!("../../migrations/2026-10-01-000100_create_recipes/up.sql");

    #[test]
    fn test_text_array_columns_reject_null_elements() {
        let schema = include_str!("schema.rs");
        for column in ["instructions", "tags"] {
            assert!(schema.contains(&format!("{column} -> Array<Text>")));
            assert!(
                RECIPES_UP.contains(&format!("CHECK (array_position({column}, NULL) IS NULL)")),
                "{column} allows NULL elements"
            );
        }
    }
}
