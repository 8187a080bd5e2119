use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Client, NewReport, Report, ReportPatch};

/// Most reports [`AgroRepository::get_recent_reports`] returns.
pub const RECENT_REPORT_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Persistence contract for clients and reports.
///
/// Every call is owner-scoped where it lists; lookups by id are not, the
/// caller already holds an id it was given.
#[async_trait]
pub trait AgroRepository: Send + Sync {
    // Clients

    /// Upserts by `(owner_id, name)` and returns the client id. An existing
    /// client keeps its id; a given `location` replaces the stored one.
    async fn save_client(
        &self,
        owner_id: &str,
        name: &str,
        location: Option<&str>,
    ) -> Result<i64, RepositoryError>;

    /// The owner's clients, by name.
    async fn get_clients(
        &self,
        owner_id: &str,
    ) -> Result<Vec<Client>, RepositoryError>;

    async fn delete_client(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError>;

    // Reports

    async fn save_report(
        &self,
        report: NewReport,
    ) -> Result<i64, RepositoryError>;

    /// Applies `patch` and bumps `updated_at`.
    async fn update_report(
        &self,
        id: i64,
        patch: ReportPatch,
    ) -> Result<(), RepositoryError>;

    async fn get_report_by_id(
        &self,
        id: i64,
    ) -> Result<Option<Report>, RepositoryError>;

    /// Up to [`RECENT_REPORT_LIMIT`] reports, most recently updated first.
    async fn get_recent_reports(
        &self,
        owner_id: &str,
    ) -> Result<Vec<Report>, RepositoryError>;

    async fn delete_report(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError>;
}
