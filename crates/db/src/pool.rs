use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const MAX_CONNECTIONS: u32 = 10;

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

/// File backing a `sqlite:` URL, or `None` for in-memory databases.
pub fn database_path(database_url: &str) -> Option<PathBuf> {
    if is_in_memory(database_url) {
        return None;
    }
    let rest = database_url.strip_prefix("sqlite:")?;
    let rest = rest.strip_prefix("//").unwrap_or(rest);
    let path = rest.split('?').next().unwrap_or(rest);
    (!path.is_empty()).then(|| PathBuf::from(path))
}

/// Opens the plan store. Missions and events are written with WAL and
/// `synchronous = NORMAL`, so a committed event survives a coordinator restart.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(10))
        .pragma("foreign_keys", "ON");

    // Every connection to an in-memory database sees its own empty schema.
    let max_connections = if is_in_memory(database_url) {
        1
    } else {
        MAX_CONNECTIONS
    };

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
        .connect_with(options)
        .await
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_path() {
        assert_eq!(
            database_path("sqlite:mission-control.db"),
            Some(PathBuf::from("mission-control.db"))
        );
        assert_eq!(
            database_path("sqlite:///var/lib/mc.db?mode=rwc"),
            Some(PathBuf::from("/var/lib/mc.db"))
        );
        assert_eq!(database_path("sqlite::memory:"), None);
        assert_eq!(database_path("postgres://localhost/db"), None);
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('missions', 'events')",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count.0, 2);
    }

    #[tokio::test]
    async fn test_file_database_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plans.db");
        let url = format!("sqlite:{}", path.display());

        let pool = create_pool(&url).await.unwrap();
        run_migrations(&pool).await.unwrap();

        assert_eq!(database_path(&url), Some(path.clone()));
        assert!(path.exists());
    }
}
