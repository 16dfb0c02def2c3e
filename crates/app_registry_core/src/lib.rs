//! Core domain logic for the application registry.
//! This crate is the single source of truth for app identity invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod mapping;
pub mod model;
pub mod repo;
pub mod service;
pub mod validation;

pub use config::RegistryConfig;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use mapping::{batch_transform, transform, MappingError};
pub use model::app::{App, AppDto, AppId};
pub use repo::app_repo::{
    AppRepository, DeletedAppIdPolicy, PageRequest, RepoError, RepoResult, SqliteAppRepository,
};
pub use service::app_service::{AppService, AppServiceError, AppServiceResult};
pub use validation::{is_valid_cluster_namespace, INVALID_CLUSTER_NAMESPACE_MESSAGE};

/// Minimal health-check API for transport smoke tests.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
