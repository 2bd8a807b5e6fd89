//! HTTP API for the lansia registry.
//!
//! Submodules group handlers by concern:
//!
//! - [`server`] - router assembly and startup
//! - [`types`] - request/response DTOs
//! - [`auth`] - login, session checks and password reset
//! - [`lansia`] - resident CRUD, listing and bulk delete
//! - [`dashboard`] - scoped aggregate statistics
//! - [`upload`] - spreadsheet import and template download
//! - [`map`] - approximate resident locations

pub mod auth;
pub mod dashboard;
pub mod lansia;
pub mod map;
pub mod server;
pub mod types;
pub mod upload;

use sqlx::PgPool;

use crate::auth::JwtKeys;
use crate::config::Config;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub jwt: JwtKeys,
    pub config: Config,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Self {
        let jwt = JwtKeys::new(&config.jwt_secret);
        Self { pool, jwt, config }
    }
}
