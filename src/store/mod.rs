//! Persistence layer: libSQL settings table holding the wizard record.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlStore;
pub use traits::{WizardStore, load_or_empty};
