//! Runtime configuration, read from the environment (a `.env` file is
//! honored via `dotenvy` in `main`).

use std::env;

/// Service settings.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Listen address, e.g. `0.0.0.0:5000`.
    pub bind: String,
    /// HS256 signing secret for session tokens.
    pub jwt_secret: String,
    /// GeoJSON file with the RW polygons used for approximate map points.
    pub geojson_path: String,
    /// Import template served by `/api/export-template`.
    pub template_path: String,
}

impl Config {
    /// Read settings from the environment. Only `DATABASE_URL` is
    /// required; everything else has a development default.
    pub fn from_env() -> Result<Self, String> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| "DATABASE_URL env var missing".to_string())?;
        Ok(Self {
            database_url,
            bind: env::var("BIND").unwrap_or_else(|_| "0.0.0.0:5000".to_string()),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "development-secret-change-me".to_string()),
            geojson_path: env::var("GEOJSON_PATH")
                .unwrap_or_else(|_| "static/data/rw_cipamokolan.geojson".to_string()),
            template_path: env::var("TEMPLATE_PATH")
                .unwrap_or_else(|_| "static/file/LansiaTemplate.xlsm".to_string()),
        })
    }
}
