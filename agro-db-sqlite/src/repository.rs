use std::str::FromStr;

use agro_core::{
    AgroRepository, CalculatorType, Client, NewReport, Report, ReportData, ReportPatch,
    RepositoryError, db::RECENT_REPORT_LIMIT,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::debug;

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Opens `database_url`, a file path, a `sqlite:` URL or `:memory:`.
    /// A missing database file is created.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database location: {}", database_url))?
            .create_if_missing(true);

        // every connection to an in-memory database sees its own copy, so
        // keep exactly one alive for the life of the pool
        let pool_options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_url))?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn db_err(e: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

fn row_to_client(row: &SqliteRow) -> Result<Client, RepositoryError> {
    Ok(Client {
        id: row.try_get("id").map_err(db_err)?,
        owner_id: row.try_get("owner_id").map_err(db_err)?,
        name: row.try_get("name").map_err(db_err)?,
        location: row.try_get("location").map_err(db_err)?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(|e| RepositoryError::Database(format!("Failed to get created_at: {}", e)))?,
    })
}

fn row_to_report(row: &SqliteRow) -> Result<Report, RepositoryError> {
    let calculator_type: String = row.try_get("calculator_type").map_err(db_err)?;
    let data: String = row.try_get("data").map_err(db_err)?;

    Ok(Report {
        id: row.try_get("id").map_err(db_err)?,
        owner_id: row.try_get("owner_id").map_err(db_err)?,
        calculator_type: CalculatorType::parse(&calculator_type).ok_or_else(|| {
            RepositoryError::Database(format!("Unknown calculator type '{}'", calculator_type))
        })?,
        title: row.try_get("title").map_err(db_err)?,
        client_name: row.try_get("client_name").map_err(db_err)?,
        data: serde_json::from_str::<ReportData>(&data)
            .map_err(|e| RepositoryError::Database(format!("Malformed report data: {}", e)))?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(|e| RepositoryError::Database(format!("Failed to get created_at: {}", e)))?,
        updated_at: row
            .try_get::<DateTime<Utc>, _>("updated_at")
            .map_err(|e| RepositoryError::Database(format!("Failed to get updated_at: {}", e)))?,
    })
}

fn encode_data(data: &ReportData) -> Result<String, RepositoryError> {
    serde_json::to_string(data).map_err(db_err)
}

const REPORT_COLUMNS: &str =
    "id, owner_id, calculator_type, title, client_name, data, created_at, updated_at";

#[async_trait]
impl AgroRepository for SqliteRepository {
    async fn save_client(
        &self,
        owner_id: &str,
        name: &str,
        location: Option<&str>,
    ) -> Result<i64, RepositoryError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO clients (owner_id, name, location, created_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT (owner_id, name)
             DO UPDATE SET location = COALESCE(excluded.location, clients.location)
             RETURNING id",
        )
        .bind(owner_id)
        .bind(name)
        .bind(location)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        debug!(id, "client upserted");
        Ok(id)
    }

    async fn get_clients(
        &self,
        owner_id: &str,
    ) -> Result<Vec<Client>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, owner_id, name, location, created_at
             FROM clients WHERE owner_id = ? ORDER BY name",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(row_to_client).collect()
    }

    async fn delete_client(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM clients WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn save_report(
        &self,
        report: NewReport,
    ) -> Result<i64, RepositoryError> {
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO reports (
                owner_id, calculator_type, title, client_name, data, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&report.owner_id)
        .bind(report.calculator_type.as_str())
        .bind(&report.title)
        .bind(&report.client_name)
        .bind(encode_data(&report.data)?)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        let id = result.last_insert_rowid();
        debug!(id, calculator = %report.calculator_type, "report created");
        Ok(id)
    }

    async fn update_report(
        &self,
        id: i64,
        patch: ReportPatch,
    ) -> Result<(), RepositoryError> {
        let data = patch.data.as_ref().map(encode_data).transpose()?;

        // a NULL parameter keeps the column; client_name needs a flag to tell
        // "leave alone" from "clear"
        let result = sqlx::query(
            "UPDATE reports SET
                title = COALESCE(?, title),
                client_name = CASE WHEN ? THEN ? ELSE client_name END,
                data = COALESCE(?, data),
                updated_at = ?
             WHERE id = ?",
        )
        .bind(patch.title)
        .bind(patch.client_name.is_some())
        .bind(patch.client_name.flatten())
        .bind(data)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        debug!(id, "report updated");
        Ok(())
    }

    async fn get_report_by_id(
        &self,
        id: i64,
    ) -> Result<Option<Report>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {} FROM reports WHERE id = ?", REPORT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(row_to_report).transpose()
    }

    async fn get_recent_reports(
        &self,
        owner_id: &str,
    ) -> Result<Vec<Report>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM reports WHERE owner_id = ?
             ORDER BY updated_at DESC, id DESC LIMIT ?",
            REPORT_COLUMNS
        ))
        .bind(owner_id)
        .bind(RECENT_REPORT_LIMIT as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(row_to_report).collect()
    }

    async fn delete_report(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM reports WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
