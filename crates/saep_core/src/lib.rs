//! Persistence core for academic activity evaluation records.
//! This crate owns the document layout and the referential rules between
//! opinions, dossiers, resolutions and report types.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use config::{ConfigError, StoreConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::dossier::Dossier;
pub use model::evaluable::{ActivityReport, Evaluable, Score};
pub use model::opinion::{Note, Opinion};
pub use model::report_type::{Attribute, AttributeKind, ReportType};
pub use model::resolution::{Resolution, Rule, RuleKind};
pub use model::value::Value;
pub use model::ValidationError;
pub use repo::opinion_repo::{DocumentOpinionRepository, OpinionRepository};
pub use repo::resolution_repo::{DocumentResolutionRepository, ResolutionRepository};
pub use repo::{RepoError, RepoResult};
pub use service::maintenance::{MaintenanceService, OrphanPurge};
pub use service::opinion_service::{OpinionService, OpinionServiceError};
pub use store::{Collection, DocumentStore, SqliteDocumentStore, StoreError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
