pub mod factory;
pub mod memory;
pub mod repository;

pub use factory::{DEFAULT_BACKEND, DbConfig, RepositoryFactory, RepositoryRegistry};
pub use memory::{MemoryRepository, MemoryRepositoryFactory};
pub use repository::{AgroRepository, RECENT_REPORT_LIMIT, RepositoryError};
