//! # Lansiaku - elderly resident registry for Kelurahan Cipamokolan
//!
//! Lansiaku keeps the registry of elderly residents (lansia) with their
//! health, social welfare, caregiver and daily-living records, and serves
//! the dashboards, map and bulk spreadsheet import the kelurahan staff
//! work with.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌─────────────┐     ┌─────────────┐     ┌────────────┐
//! │  Template    │────▶│    Sheet    │────▶│   Import    │────▶│ PostgreSQL │
//! │  (.xlsm)     │     │ (transpose) │     │ (all-or-    │     │ (5 tables) │
//! └──────────────┘     └─────────────┘     │  nothing)   │     └────────────┘
//!                                          └─────────────┘
//! ```
//!
//! Records arrive as *columns* of a transposed workbook: each sheet row
//! below the label row is one field, each column one resident. The import
//! validates every record and commits the whole batch only when every
//! record is clean.
//!
//! Age, age group and the ADL category are never stored. They are derived
//! against the reference date of each request.
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models and derived-field functions
//! - [`importer`] - Transposed-sheet reading and the import pipeline
//! - [`db`] - Connection setup and shared statements
//! - [`auth`] - Passwords, session tokens and the role scope
//! - [`geo`] - RW polygons for approximate map points
//! - [`seed`] - Development data seeding
//! - [`config`] - Environment configuration
//! - [`api`] - HTTP API server

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Import pipeline
pub mod importer;

// Persistence
pub mod db;

// Auth
pub mod auth;

// Map support
pub mod geo;

// Seeding
pub mod seed;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{ApiError, AuthError, ImportError, SheetError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    kategori_adl, kelompok_usia, usia, DailyLiving, Kesehatan, Kesejahteraan, Lansia,
    Pendamping, AGE_GROUPS,
};

// =============================================================================
// Re-exports - Importer
// =============================================================================

pub use importer::pipeline::{import_rows, ImportOutcome};
pub use importer::sheet::{rows_from_workbook, SheetRow, SHEET_HEADER};
pub use importer::FIELDS;

// =============================================================================
// Re-exports - Auth
// =============================================================================

pub use auth::{AuthUser, JwtKeys, RoleScope, ELEVATED_ROLES};

// =============================================================================
// Re-exports - Config
// =============================================================================

pub use config::Config;

// Server
pub mod server {
    pub use crate::api::server::start_server;
    pub use crate::api::AppState;
}
