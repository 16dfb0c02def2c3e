//! Domain model for registry records and their transfer shapes.
//!
//! # Responsibility
//! - Define the canonical `App` record persisted by the store.
//! - Define the wire-facing `AppDto` exchanged with transports.
//!
//! # Invariants
//! - Every app is identified by a stable, format-checked `app_id`.
//! - Deletion is represented by soft-delete tombstones, not hard delete.

pub mod app;
