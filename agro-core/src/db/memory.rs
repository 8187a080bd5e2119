//! In-process store, for tests and for running without a database file.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use super::factory::{DbConfig, RepositoryFactory};
use super::repository::{AgroRepository, RECENT_REPORT_LIMIT, RepositoryError};
use crate::models::{Client, NewReport, Report, ReportPatch};

#[derive(Debug, Default)]
struct Tables {
    next_client_id: i64,
    next_report_id: i64,
    clients: BTreeMap<i64, Client>,
    reports: BTreeMap<i64, Report>,
}

impl Tables {
    fn next_client_id(&mut self) -> i64 {
        self.next_client_id += 1;
        self.next_client_id
    }

    fn next_report_id(&mut self) -> i64 {
        self.next_report_id += 1;
        self.next_report_id
    }
}

#[derive(Debug, Default)]
pub struct MemoryRepository {
    tables: Mutex<Tables>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|e| RepositoryError::Database(e.to_string()))
    }
}

#[async_trait]
impl AgroRepository for MemoryRepository {
    async fn save_client(
        &self,
        owner_id: &str,
        name: &str,
        location: Option<&str>,
    ) -> Result<i64, RepositoryError> {
        let mut tables = self.tables()?;

        if let Some(existing) = tables
            .clients
            .values_mut()
            .find(|c| c.owner_id == owner_id && c.name == name)
        {
            if let Some(location) = location {
                existing.location = Some(location.to_string());
            }
            debug!(id = existing.id, "client already registered");
            return Ok(existing.id);
        }

        let id = tables.next_client_id();
        tables.clients.insert(
            id,
            Client {
                id,
                owner_id: owner_id.to_string(),
                name: name.to_string(),
                location: location.map(str::to_string),
                created_at: Utc::now(),
            },
        );
        debug!(id, "client created");
        Ok(id)
    }

    async fn get_clients(
        &self,
        owner_id: &str,
    ) -> Result<Vec<Client>, RepositoryError> {
        let tables = self.tables()?;
        let mut clients: Vec<Client> = tables
            .clients
            .values()
            .filter(|c| c.owner_id == owner_id)
            .cloned()
            .collect();
        clients.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(clients)
    }

    async fn delete_client(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        self.tables()?
            .clients
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    async fn save_report(
        &self,
        report: NewReport,
    ) -> Result<i64, RepositoryError> {
        let mut tables = self.tables()?;
        let id = tables.next_report_id();
        let now = Utc::now();
        tables.reports.insert(
            id,
            Report {
                id,
                owner_id: report.owner_id,
                calculator_type: report.calculator_type,
                title: report.title,
                client_name: report.client_name,
                data: report.data,
                created_at: now,
                updated_at: now,
            },
        );
        debug!(id, "report created");
        Ok(id)
    }

    async fn update_report(
        &self,
        id: i64,
        patch: ReportPatch,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        let report = tables.reports.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        patch.apply(report);
        report.updated_at = Utc::now();
        debug!(id, "report updated");
        Ok(())
    }

    async fn get_report_by_id(
        &self,
        id: i64,
    ) -> Result<Option<Report>, RepositoryError> {
        Ok(self.tables()?.reports.get(&id).cloned())
    }

    async fn get_recent_reports(
        &self,
        owner_id: &str,
    ) -> Result<Vec<Report>, RepositoryError> {
        let tables = self.tables()?;
        let mut reports: Vec<Report> = tables
            .reports
            .values()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect();
        reports.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        reports.truncate(RECENT_REPORT_LIMIT);
        Ok(reports)
    }

    async fn delete_report(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        self.tables()?
            .reports
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

const MEMORY_LOCATION: &str = ":memory:";

pub struct MemoryRepositoryFactory;

#[async_trait]
impl RepositoryFactory for MemoryRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn default_connection_string(&self) -> &'static str {
        MEMORY_LOCATION
    }

    /// Accepts `:memory:` only.
    fn validate(
        &self,
        connection_string: &str,
    ) -> Result<(), RepositoryError> {
        if connection_string == MEMORY_LOCATION {
            Ok(())
        } else {
            Err(RepositoryError::Configuration(format!(
                "the memory backend keeps nothing on disk and cannot open '{connection_string}'; \
                 use '{MEMORY_LOCATION}' or the sqlite backend"
            )))
        }
    }

    async fn create(
        &self,
        _config: &DbConfig,
    ) -> Result<Box<dyn AgroRepository>, RepositoryError> {
        Ok(Box::new(MemoryRepository::new()))
    }
}
