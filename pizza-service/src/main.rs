use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pizza_service::handlers::{app, AppState};
use pizza_service::{establish_pool, run_migrations, store, DbPool};

const DEFAULT_DATABASE_URL: &str = "app.db";

#[derive(Parser)]
#[command(version)]
struct Cli {
    /// SQLite database file, or `:memory:` [default: app.db]
    #[arg(long, env = "DATABASE_URL", global = true)]
    database_url: Option<String>,

    /// Older name for `--database-url`, used when that one is unset
    #[arg(long, env = "DB_URI", global = true, hide = true)]
    db_uri: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn database_url(&self) -> &str {
        self.database_url
            .as_deref()
            .or(self.db_uri.as_deref())
            .unwrap_or(DEFAULT_DATABASE_URL)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending migrations and serve the HTTP API
    Serve {
        #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:5555")]
        listen: SocketAddr,
    },
    /// Apply pending migrations and exit
    Migrate,
    /// Replace all rows with the sample restaurants and pizzas
    Seed,
}

async fn serve(pool: DbPool, listen: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    let app = app(AppState::new(pool));

    let listener = tokio::net::TcpListener::bind(listen).await?;
    info!("Pizza service listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
pub async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let pool = establish_pool(cli.database_url())?;
    {
        let conn = &mut pool.get()?;
        run_migrations(conn)?;
    }

    match cli.command {
        Commands::Serve { listen } => serve(pool, listen).await,
        Commands::Migrate => Ok(()),
        Commands::Seed => {
            let conn = &mut pool.get()?;
            store::seed(conn)?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_url_prefers_database_url_over_db_uri() {
        let cli = Cli::try_parse_from([
            "pizza-service",
            "--database-url",
            "primary.db",
            "--db-uri",
            "legacy.db",
            "migrate",
        ])
        .unwrap();
        assert_eq!(cli.database_url(), "primary.db");
    }

    #[test]
    fn test_database_url_falls_back_to_db_uri() {
        let cli = Cli {
            database_url: None,
            db_uri: Some("legacy.db".to_string()),
            command: Commands::Migrate,
        };
        assert_eq!(cli.database_url(), "legacy.db");

        let cli = Cli {
            database_url: None,
            db_uri: None,
            command: Commands::Seed,
        };
        assert_eq!(cli.database_url(), DEFAULT_DATABASE_URL);
    }

    #[test]
    fn test_migrate_then_seed_on_a_pooled_connection() {
        let pool = establish_pool(pizza_service::IN_MEMORY_DATABASE_URL).unwrap();
        {
            let conn = &mut pool.get().unwrap();
            run_migrations(conn).unwrap();
        }
        let conn = &mut pool.get().unwrap();
        store::seed(conn).unwrap();
        assert_eq!(store::list_restaurants(conn).unwrap().len(), 3);
    }
}
