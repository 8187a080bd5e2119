//! Store selection. A [`DbConfig`] may leave either field blank; the
//! [`RepositoryRegistry`] fills the blanks from its default backend and that
//! backend's default location, checks the location and opens the store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::debug;

use super::repository::{AgroRepository, RepositoryError};

/// Backend a fresh registry opens when the config names none.
pub const DEFAULT_BACKEND: &str = "sqlite";

/// Which store to open and where.
///
/// | backend  | connection_string                 | blank location means |
/// |----------|-----------------------------------|----------------------|
/// | `sqlite` | `agrocalc.db`, `sqlite:x.db`, `:memory:` | `agrocalc.db` |
/// | `memory` | `:memory:` only                   | `:memory:`           |
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DbConfig {
    /// Backend name, matched case-insensitively. Blank picks the registry
    /// default.
    pub backend: String,
    /// Backend-specific location. Blank picks the backend default.
    pub connection_string: String,
}

impl DbConfig {
    pub fn new(
        backend: impl Into<String>,
        connection_string: impl Into<String>,
    ) -> Self {
        Self {
            backend: backend.into(),
            connection_string: connection_string.into(),
        }
    }
}

/// One storage backend the binary can open.
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    /// Lowercase name configs refer to.
    fn backend_name(&self) -> &'static str;

    /// Location used when the config leaves `connection_string` blank.
    fn default_connection_string(&self) -> &'static str;

    /// Rejects a location this backend cannot open. Runs before `create`.
    fn validate(
        &self,
        _connection_string: &str,
    ) -> Result<(), RepositoryError> {
        Ok(())
    }

    /// Opens the store of an already resolved config.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn AgroRepository>, RepositoryError>;
}

/// The backends one binary ships, plus the one it opens by default.
pub struct RepositoryRegistry {
    factories: BTreeMap<&'static str, Box<dyn RepositoryFactory>>,
    default_backend: &'static str,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
            default_backend: DEFAULT_BACKEND,
        }
    }

    /// Adds a backend; a later factory with the same name wins.
    pub fn register(
        &mut self,
        factory: Box<dyn RepositoryFactory>,
    ) {
        self.factories.insert(factory.backend_name(), factory);
    }

    pub fn set_default_backend(
        &mut self,
        name: &'static str,
    ) {
        self.default_backend = name;
    }

    pub fn default_backend(&self) -> &'static str {
        self.default_backend
    }

    /// Registered backend names, sorted.
    pub fn available_backends(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }

    fn factory(
        &self,
        name: &str,
    ) -> Result<&dyn RepositoryFactory, RepositoryError> {
        self.factories.get(name).map(|f| f.as_ref()).ok_or_else(|| {
            RepositoryError::Configuration(format!(
                "unknown backend '{name}'; available: {:?}",
                self.available_backends()
            ))
        })
    }

    /// Fills the blanks in `config` and checks the location against the
    /// chosen backend.
    ///
    /// # Errors
    /// [`RepositoryError::Configuration`] for an unknown backend or a location
    /// the backend rejects.
    pub fn resolve(
        &self,
        config: &DbConfig,
    ) -> Result<DbConfig, RepositoryError> {
        let requested = config.backend.trim().to_ascii_lowercase();
        let name = if requested.is_empty() {
            self.default_backend
        } else {
            requested.as_str()
        };
        let factory = self.factory(name)?;

        let connection_string = match config.connection_string.trim() {
            "" => factory.default_connection_string(),
            given => given,
        };
        factory.validate(connection_string)?;

        Ok(DbConfig::new(factory.backend_name(), connection_string))
    }

    /// Resolves `config` and opens its store.
    pub async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn AgroRepository>, RepositoryError> {
        let resolved = self.resolve(config)?;
        debug!(
            backend = %resolved.backend,
            connection = %resolved.connection_string,
            "opening store"
        );
        self.factory(&resolved.backend)?.create(&resolved).await
    }
}

impl Default for RepositoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::db::{MemoryRepository, MemoryRepositoryFactory};

    /// Records the config it was asked to open.
    struct RecordingFactory {
        name: &'static str,
        opened: Arc<Mutex<Option<DbConfig>>>,
    }

    #[async_trait]
    impl RepositoryFactory for RecordingFactory {
        fn backend_name(&self) -> &'static str {
            self.name
        }

        fn default_connection_string(&self) -> &'static str {
            "farm.db"
        }

        async fn create(
            &self,
            config: &DbConfig,
        ) -> Result<Box<dyn AgroRepository>, RepositoryError> {
            *self.opened.lock().unwrap() = Some(config.clone());
            Ok(Box::new(MemoryRepository::new()))
        }
    }

    fn registry() -> (RepositoryRegistry, Arc<Mutex<Option<DbConfig>>>) {
        let opened = Arc::new(Mutex::new(None));
        let mut reg = RepositoryRegistry::new();
        reg.register(Box::new(RecordingFactory {
            name: "sqlite",
            opened: opened.clone(),
        }));
        reg.register(Box::new(MemoryRepositoryFactory));
        (reg, opened)
    }

    #[test]
    fn backends_are_listed_sorted() {
        let (reg, _) = registry();

        assert_eq!(reg.available_backends(), vec!["memory", "sqlite"]);
        assert!(RepositoryRegistry::new().available_backends().is_empty());
    }

    #[test]
    fn blank_config_resolves_to_defaults() {
        let (reg, _) = registry();

        assert_eq!(
            reg.resolve(&DbConfig::default()).unwrap(),
            DbConfig::new("sqlite", "farm.db")
        );
    }

    #[test]
    fn backend_names_ignore_case_and_padding() {
        let (reg, _) = registry();

        assert_eq!(
            reg.resolve(&DbConfig::new(" Memory ", "")).unwrap(),
            DbConfig::new("memory", ":memory:")
        );
    }

    #[test]
    fn default_backend_can_be_changed() {
        let (mut reg, _) = registry();
        reg.set_default_backend("memory");

        assert_eq!(reg.default_backend(), "memory");
        assert_eq!(reg.resolve(&DbConfig::default()).unwrap().backend, "memory");
    }

    #[test]
    fn memory_backend_rejects_a_file_location() {
        let (reg, _) = registry();

        let err = reg.resolve(&DbConfig::new("memory", "agrocalc.db")).unwrap_err();

        assert!(
            matches!(&err, RepositoryError::Configuration(msg) if msg.contains("agrocalc.db")),
            "{err:?}"
        );
    }

    #[test]
    fn unknown_backend_names_the_available_ones() {
        let (reg, _) = registry();

        match reg.resolve(&DbConfig::new("postgres", "")) {
            Err(RepositoryError::Configuration(msg)) => {
                assert!(msg.contains("postgres"));
                assert!(msg.contains("memory") && msg.contains("sqlite"));
            }
            other => panic!("expected Configuration error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_opens_the_resolved_config() {
        let (reg, opened) = registry();

        let repo = reg.create(&DbConfig::new("SQLITE", "  ")).await.unwrap();

        assert!(repo.get_clients("u1").await.unwrap().is_empty());
        assert_eq!(
            opened.lock().unwrap().clone(),
            Some(DbConfig::new("sqlite", "farm.db"))
        );
    }
}
