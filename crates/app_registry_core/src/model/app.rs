//! App record and transfer object.
//!
//! # Responsibility
//! - Define the persisted app record including audit columns.
//! - Define the transfer object used on request/response boundaries.
//! - Expose tombstone state to read paths.
//!
//! # Invariants
//! - `app_id` never changes after the record is created.
//! - `is_deleted` is the source of truth for tombstone state.
//! - `AppDto` and `App` share field names so `mapping::transform` can copy
//!   between them structurally.

use serde::{Deserialize, Serialize};

/// Business key of an app. Shares its naming rule with clusters and namespaces.
pub type AppId = String;

/// Persisted app record.
///
/// Audit timestamps are epoch milliseconds assigned by the store; values
/// carried in on writes are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct App {
    /// Store-assigned surrogate key. `0` until persisted.
    pub id: i64,
    /// Globally unique business key.
    pub app_id: AppId,
    /// Human-readable display name, not unique.
    pub name: String,
    pub org_id: String,
    pub org_name: String,
    pub owner_name: String,
    pub owner_email: String,
    /// Soft delete tombstone. Deleted rows stay for audit history.
    pub is_deleted: bool,
    /// Operator recorded by the delete operation.
    pub deleted_by: Option<String>,
    pub deleted_at: Option<i64>,
    pub data_change_created_by: Option<String>,
    pub data_change_created_time: Option<i64>,
    pub data_change_last_modified_by: Option<String>,
    pub data_change_last_modified_time: Option<i64>,
}

impl App {
    /// Creates an unsaved app with the given business key and display name.
    pub fn new(app_id: impl Into<AppId>, name: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns whether this app should be visible to normal reads.
    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }
}

/// Wire-facing app representation.
///
/// Carries no surrogate key and no tombstone state; deleted apps are never
/// returned through this shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppDto {
    pub app_id: AppId,
    pub name: String,
    pub org_id: String,
    pub org_name: String,
    pub owner_name: String,
    pub owner_email: String,
    pub data_change_created_by: Option<String>,
    pub data_change_last_modified_by: Option<String>,
    pub data_change_created_time: Option<i64>,
    pub data_change_last_modified_time: Option<i64>,
}

impl AppDto {
    pub fn new(app_id: impl Into<AppId>, name: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            name: name.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{App, AppDto};

    #[test]
    fn tombstone_flag_drives_visibility() {
        let mut app = App::new("ordertest", "Order Test");
        assert!(app.is_active());

        app.is_deleted = true;
        assert!(!app.is_active());
    }

    #[test]
    fn dto_uses_camel_case_on_the_wire() {
        let dto: AppDto = serde_json::from_str(
            r#"{"appId":"ordertest","name":"Order Test","ownerEmail":"o@example.com"}"#,
        )
        .expect("dto should parse");
        assert_eq!(dto.app_id, "ordertest");
        assert_eq!(dto.owner_email, "o@example.com");
        assert!(dto.org_id.is_empty());
    }
}
