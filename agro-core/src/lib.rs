pub mod calculations;
pub mod db;
pub mod input;
pub mod lifecycle;
pub mod models;

pub use calculations::{Calculator, Evaluation, FormulaEngine};
pub use db::{AgroRepository, DbConfig, RepositoryError, RepositoryFactory, RepositoryRegistry};
pub use input::{FieldDefault, FieldSpec, FormInputs, InputValue, ResultSet, ResultValue};
pub use lifecycle::{LifecycleError, LifecycleState, PageRoute, ReportLifecycle};
pub use models::*;
