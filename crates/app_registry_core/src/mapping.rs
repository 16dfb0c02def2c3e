//! Structural copy between records and transfer objects.
//!
//! # Responsibility
//! - Copy same-named fields from one serde shape into another.
//! - Keep record/transfer conversions free of per-field mapping code.
//!
//! # Invariants
//! - Fields absent from the source take the target's `#[serde(default)]`.
//! - Fields absent from the target are dropped.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure to copy one shape into another.
#[derive(Debug)]
pub struct MappingError(serde_json::Error);

impl Display for MappingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "structural copy failed: {}", self.0)
    }
}

impl Error for MappingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

impl From<serde_json::Error> for MappingError {
    fn from(value: serde_json::Error) -> Self {
        Self(value)
    }
}

/// Copies every field of `source` that `T` also declares.
pub fn transform<S, T>(source: &S) -> Result<T, MappingError>
where
    S: Serialize,
    T: DeserializeOwned,
{
    let value = serde_json::to_value(source)?;
    Ok(serde_json::from_value(value)?)
}

/// Applies [`transform`] to every element, preserving order.
pub fn batch_transform<S, T>(sources: &[S]) -> Result<Vec<T>, MappingError>
where
    S: Serialize,
    T: DeserializeOwned,
{
    sources.iter().map(transform::<S, T>).collect()
}

#[cfg(test)]
mod tests {
    use super::{batch_transform, transform};
    use crate::model::app::{App, AppDto};

    #[test]
    fn record_to_dto_drops_store_only_fields() {
        let mut app = App::new("ordertest", "Order Test");
        app.id = 42;
        app.owner_name = "alice".to_string();
        app.data_change_created_time = Some(1_000);

        let dto: AppDto = transform(&app).unwrap();
        assert_eq!(dto.app_id, "ordertest");
        assert_eq!(dto.name, "Order Test");
        assert_eq!(dto.owner_name, "alice");
        assert_eq!(dto.data_change_created_time, Some(1_000));
    }

    #[test]
    fn dto_to_record_defaults_missing_fields() {
        let mut dto = AppDto::new("ordertest", "Order Test");
        dto.org_id = "TEST1".to_string();

        let app: App = transform(&dto).unwrap();
        assert_eq!(app.id, 0);
        assert_eq!(app.org_id, "TEST1");
        assert!(!app.is_deleted);
        assert!(app.deleted_by.is_none());
    }

    #[test]
    fn batch_preserves_order() {
        let apps = vec![App::new("b", "B"), App::new("a", "A")];
        let dtos: Vec<AppDto> = batch_transform(&apps).unwrap();
        let ids: Vec<&str> = dtos.iter().map(|dto| dto.app_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }
}
