use async_trait::async_trait;

use agro_core::db::repository::{AgroRepository, RepositoryError};
use agro_core::db::{DbConfig, RepositoryFactory};

use crate::repository::SqliteRepository;

/// Database file opened when the config gives no location.
pub const DEFAULT_DATABASE_FILE: &str = "agrocalc.db";

/// [`RepositoryFactory`] for SQLite.
///
/// Register this with a [`agro_core::db::RepositoryRegistry`] to make the
/// `"sqlite"` backend available:
///
/// ```rust,no_run
/// use agro_core::db::RepositoryRegistry;
/// use agro_db_sqlite::SqliteRepositoryFactory;
///
/// let mut registry = RepositoryRegistry::new();
/// registry.register(Box::new(SqliteRepositoryFactory));
/// ```
pub struct SqliteRepositoryFactory;

#[async_trait]
impl RepositoryFactory for SqliteRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn default_connection_string(&self) -> &'static str {
        DEFAULT_DATABASE_FILE
    }

    /// Rejects URLs of other databases, e.g. `postgres://...`.
    fn validate(
        &self,
        connection_string: &str,
    ) -> Result<(), RepositoryError> {
        match connection_string.split_once("://") {
            Some((scheme, _)) if !scheme.eq_ignore_ascii_case("sqlite") => {
                Err(RepositoryError::Configuration(format!(
                    "'{connection_string}' is a {scheme} URL, not a SQLite database"
                )))
            }
            _ => Ok(()),
        }
    }

    /// Open the database described by `config.connection_string`, a bare
    /// file path (created if missing), a `sqlite:` URL or `":memory:"`, and
    /// bring its schema up to date.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn AgroRepository>, RepositoryError> {
        let repo = SqliteRepository::new(&config.connection_string)
            .await
            .map_err(|e| RepositoryError::Connection(format!("{e:#}")))?;
        repo.run_migrations()
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;
        tracing::info!(database = %config.connection_string, "sqlite repository ready");
        Ok(Box::new(repo))
    }
}
