//! App registry use-case service.
//!
//! # Responsibility
//! - Validate app identifiers before they reach storage.
//! - Enforce identifier uniqueness on create and immutability on update.
//! - Map records to transfer objects on every response path.
//!
//! # Invariants
//! - Create performs at most one store write and never writes an invalid id.
//! - A store-level uniqueness violation surfaces as the same `Conflict` as
//!   the service pre-check.
//! - Update with differing path/body identifiers never touches the store.
//! - Service layer remains storage-agnostic.

use crate::config::{RegistryConfig, MAX_PAGE_SIZE};
use crate::logging::sanitize_field;
use crate::mapping::{batch_transform, transform, MappingError};
use crate::model::app::{App, AppDto};
use crate::repo::app_repo::{AppRepository, PageRequest, RepoError};
use crate::validation::{invalid_identifier_message, is_valid_cluster_namespace};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

const APP_ALREADY_EXISTS: &str = "app already exist";
const APP_ID_MISMATCH: &str = "path and body identifier differ";

pub type AppServiceResult<T> = Result<T, AppServiceError>;

/// Service error for app registry use-cases.
#[derive(Debug)]
pub enum AppServiceError {
    /// Malformed identifier or path/body identifier mismatch.
    InvalidArgument(String),
    /// Identifier already held by another app.
    Conflict(String),
    /// Target app does not exist or is soft-deleted.
    NotFound(String),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Record/transfer conversion failure.
    Mapping(MappingError),
}

impl AppServiceError {
    /// HTTP-style status code for transports.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidArgument(_) => 400,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Repo(_) | Self::Mapping(_) => 500,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::Conflict(_) => "conflict",
            Self::NotFound(_) => "not_found",
            Self::Repo(_) => "repo_error",
            Self::Mapping(_) => "mapping_error",
        }
    }
}

impl Display for AppServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            Self::Conflict(message) => write!(f, "{message}"),
            Self::NotFound(message) => write!(f, "{message}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Mapping(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AppServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Mapping(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for AppServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Conflict(_) => Self::Conflict(APP_ALREADY_EXISTS.to_string()),
            RepoError::NotFound(app_id) => Self::NotFound(not_found_message(&app_id)),
            other => Self::Repo(other),
        }
    }
}

impl From<MappingError> for AppServiceError {
    fn from(value: MappingError) -> Self {
        Self::Mapping(value)
    }
}

/// App registry facade over repository implementations.
pub struct AppService<R: AppRepository> {
    repo: R,
    max_page_size: u32,
}

impl<R: AppRepository> AppService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            max_page_size: MAX_PAGE_SIZE,
        }
    }

    /// Creates a service whose paging limits follow `config`.
    pub fn with_config(repo: R, config: &RegistryConfig) -> Self {
        Self {
            repo,
            max_page_size: config.max_page_size,
        }
    }

    /// Registers a new app.
    ///
    /// # Errors
    /// - `InvalidArgument` when `dto.app_id` fails the shared naming rule.
    /// - `Conflict` when the identifier is already taken, whether detected by
    ///   the pre-check or by the store's unique index.
    pub fn create(&self, dto: &AppDto) -> AppServiceResult<AppDto> {
        let started_at = Instant::now();
        let result = self.create_inner(dto);
        log_outcome("app_create", &dto.app_id, started_at, &result);
        result
    }

    fn create_inner(&self, dto: &AppDto) -> AppServiceResult<AppDto> {
        if !is_valid_cluster_namespace(&dto.app_id) {
            return Err(AppServiceError::InvalidArgument(
                invalid_identifier_message("app id", &dto.app_id),
            ));
        }

        let entity: App = transform(dto)?;
        if self.repo.is_app_id_taken(&entity.app_id)? {
            return Err(AppServiceError::Conflict(APP_ALREADY_EXISTS.to_string()));
        }

        let saved = self.repo.insert(&entity)?;
        Ok(transform(&saved)?)
    }

    /// Soft-deletes an app, recording `operator` for audit.
    ///
    /// `operator` is expected to be non-empty; transports enforce that.
    pub fn delete(&self, app_id: &str, operator: &str) -> AppServiceResult<()> {
        let started_at = Instant::now();
        let result = self.delete_inner(app_id, operator);
        log_outcome("app_delete", app_id, started_at, &result);
        result
    }

    fn delete_inner(&self, app_id: &str, operator: &str) -> AppServiceResult<()> {
        if self.find_live(app_id)?.is_none() {
            return Err(AppServiceError::NotFound(not_found_message(app_id)));
        }
        self.repo.mark_deleted(app_id, operator)?;
        Ok(())
    }

    /// Rewrites the mutable fields of an existing app.
    ///
    /// No existence pre-check: a missing app surfaces from the store as
    /// `NotFound`.
    pub fn update(&self, app_id: &str, app: &App) -> AppServiceResult<()> {
        let started_at = Instant::now();
        let result = if app_id != app.app_id {
            Err(AppServiceError::InvalidArgument(APP_ID_MISMATCH.to_string()))
        } else {
            self.repo.update(app).map_err(AppServiceError::from)
        };
        log_outcome("app_update", app_id, started_at, &result);
        result
    }

    /// Lists apps.
    ///
    /// A blank `name` returns one page of live apps; otherwise every live app
    /// whose name matches exactly, ignoring `page`.
    pub fn find(&self, name: Option<&str>, page: PageRequest) -> AppServiceResult<Vec<AppDto>> {
        let started_at = Instant::now();
        let name = name.filter(|value| !value.trim().is_empty());
        let result = self.find_inner(name, page);
        log_outcome("app_find", name.unwrap_or(""), started_at, &result);
        if let Ok(apps) = &result {
            debug!(
                "event=app_find module=service by_name={} count={}",
                name.is_some(),
                apps.len()
            );
        }
        result
    }

    fn find_inner(&self, name: Option<&str>, page: PageRequest) -> AppServiceResult<Vec<AppDto>> {
        let apps = match name {
            Some(name) => self.repo.find_by_name(name)?,
            None => self.repo.find_all(&page.normalized(self.max_page_size))?,
        };
        Ok(batch_transform(&apps)?)
    }

    /// Gets one live app by identifier.
    pub fn get(&self, app_id: &str) -> AppServiceResult<AppDto> {
        let started_at = Instant::now();
        let result = self.get_inner(app_id);
        log_outcome("app_get", app_id, started_at, &result);
        result
    }

    fn get_inner(&self, app_id: &str) -> AppServiceResult<AppDto> {
        let app = self
            .find_live(app_id)?
            .ok_or_else(|| AppServiceError::NotFound(not_found_message(app_id)))?;
        Ok(transform(&app)?)
    }

    /// Advisory uniqueness check for client-side pre-submission checks.
    ///
    /// Not a reservation: a later `create` may still fail with `Conflict`.
    pub fn is_app_id_unique(&self, app_id: &str) -> AppServiceResult<bool> {
        let started_at = Instant::now();
        let result = self
            .repo
            .is_app_id_taken(app_id)
            .map(|taken| !taken)
            .map_err(AppServiceError::from);
        log_outcome("app_is_unique", app_id, started_at, &result);
        result
    }

    // Tombstones never leave the service, whatever the repository returns.
    fn find_live(&self, app_id: &str) -> AppServiceResult<Option<App>> {
        Ok(self
            .repo
            .find_by_app_id(app_id, false)?
            .filter(App::is_active))
    }
}

fn not_found_message(app_id: &str) -> String {
    format!("app not found for appId {app_id}")
}

fn log_outcome<T>(
    event: &str,
    app_id: &str,
    started_at: Instant,
    result: &AppServiceResult<T>,
) {
    let duration_ms = started_at.elapsed().as_millis();
    let app_id = sanitize_field(app_id);
    match result {
        Ok(_) => info!(
            "event={event} module=service status=ok app_id={app_id} duration_ms={duration_ms}"
        ),
        Err(err) => warn!(
            "event={event} module=service status=error app_id={app_id} duration_ms={duration_ms} error_code={} error={}",
            err.code(),
            sanitize_field(&err.to_string())
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::AppServiceError;
    use crate::repo::app_repo::RepoError;

    #[test]
    fn repo_conflict_maps_to_service_conflict() {
        let err = AppServiceError::from(RepoError::Conflict("ordertest".to_string()));
        assert!(matches!(err, AppServiceError::Conflict(ref message) if message == "app already exist"));
        assert_eq!(err.status_code(), 409);
    }

    #[test]
    fn repo_not_found_maps_to_service_not_found() {
        let err = AppServiceError::from(RepoError::NotFound("ordertest".to_string()));
        assert!(matches!(err, AppServiceError::NotFound(ref message) if message.contains("ordertest")));
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn repo_invalid_data_stays_infrastructure_error() {
        let err = AppServiceError::from(RepoError::InvalidData("bad row".to_string()));
        assert!(matches!(err, AppServiceError::Repo(_)));
        assert_eq!(err.status_code(), 500);
    }
}
