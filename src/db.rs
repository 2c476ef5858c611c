use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use tokio::fs;

pub type DbPool = sqlx::PgPool;
pub type OrmConn = DatabaseConnection;

const MIGRATIONS_DIR: &str = "migrations";

pub async fn create_orm_conn(database_url: &str) -> Result<OrmConn> {
    let conn = Database::connect(database_url)
        .await
        .context("failed to connect to database")?;
    Ok(conn)
}

/// The sqlx pool backing a SeaORM Postgres connection, for raw queries.
pub fn raw_pool(conn: &OrmConn) -> DbPool {
    conn.get_postgres_connection_pool().clone()
}

/// Replays every `migrations/*.sql` file in filename order.
///
/// Files must be idempotent (`IF NOT EXISTS`): they run on every start.
pub async fn run_migrations(conn: &OrmConn) -> Result<()> {
    let backend = conn.get_database_backend();

    for file in migration_files(Path::new(MIGRATIONS_DIR)).await? {
        tracing::debug!(file = %file.display(), "applying migration");
        let sql = fs::read_to_string(&file)
            .await
            .with_context(|| format!("failed to read {}", file.display()))?;
        // One prepared statement per command.
        for stmt in split_statements(&sql) {
            conn.execute(Statement::from_string(backend, format!("{stmt};")))
                .await
                .with_context(|| format!("migration {} failed", file.display()))?;
        }
    }

    Ok(())
}

async fn migration_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .await
        .with_context(|| format!("failed to open {}", dir.display()))?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "sql") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Non-empty `;`-separated statements of a migration file.
pub fn split_statements(sql: &str) -> impl Iterator<Item = &str> {
    sql.split(';').map(str::trim).filter(|stmt| !stmt.is_empty())
}
