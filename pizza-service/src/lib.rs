use std::time::Duration;

use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::info;

pub mod error;
pub mod handlers;
pub mod models;
pub mod payloads;
pub mod schema;
pub mod serializer;
pub mod store;

pub use store::StoreError;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

pub const IN_MEMORY_DATABASE_URL: &str = ":memory:";

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

#[derive(Debug)]
struct SqlitePragmas;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        // SQLite ignores REFERENCES clauses unless enabled per connection.
        conn.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

pub fn establish_pool(database_url: &str) -> Result<DbPool, StoreError> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let builder = Pool::builder().connection_customizer(Box::new(SqlitePragmas));

    // Every connection to `:memory:` opens its own empty database, so the
    // pool must hold exactly one connection and never recycle it.
    let builder = if database_url == IN_MEMORY_DATABASE_URL {
        builder.max_size(1).idle_timeout(None).max_lifetime(None)
    } else {
        builder.connection_timeout(Duration::from_secs(10))
    };

    Ok(builder.build(manager)?)
}

pub fn run_migrations(conn: &mut SqliteConnection) -> Result<(), StoreError> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| StoreError::Migration(e.to_string()))?;
    for version in &applied {
        info!(%version, "applied migration");
    }
    Ok(())
}
