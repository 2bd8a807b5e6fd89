//! Router assembly and server startup.
//!
//! # API Endpoints
//!
//! | Method | Path                                        | Description                       |
//! |--------|---------------------------------------------|-----------------------------------|
//! | GET    | `/health`                                   | Health check                      |
//! | POST   | `/api/login`                                | Issue a session token             |
//! | POST   | `/api/logout`                               | Stateless logout                  |
//! | GET    | `/api/check-auth`                           | Validate the current token        |
//! | POST   | `/api/forgot-password`                      | Issue a password reset token      |
//! | PUT    | `/api/reset-password`                       | Consume a reset token             |
//! | GET    | `/api/lansia`                               | List residents (scoped, filtered) |
//! | POST   | `/api/lansia`                               | Register a resident               |
//! | GET    | `/api/lansia/{id}`                          | Resident detail with children     |
//! | PUT    | `/api/lansia/{id}`                          | Wholesale update                  |
//! | DELETE | `/api/lansia/{id}`                          | Delete a resident                 |
//! | POST   | `/api/lansia/bulk-delete`                   | Delete a set of residents         |
//! | GET    | `/api/filter-options`                       | Distinct filter values            |
//! | GET    | `/api/lansia-locations`                     | Map points                        |
//! | GET    | `/api/dashboard/demographics`               | Demographic aggregates            |
//! | GET    | `/api/dashboard/health`                     | Health aggregates                 |
//! | GET    | `/api/dashboard/social-welfare`             | Welfare aggregates                |
//! | GET    | `/api/dashboard/needs-potential`            | BKL participation                 |
//! | GET    | `/api/dashboard/urgent-need-details/{need}` | Residents with an urgent need     |
//! | GET    | `/api/export-template`                      | Download the import template      |
//! | POST   | `/api/upload-excel`                         | Import a filled template          |

use axum::http::{header, Method};
use axum::response::Json;
use axum::routing::{get, post, put};
use axum::Router;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tracing::info;

use super::{auth, dashboard, lansia, map, upload, AppState};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/login", post(auth::login))
        .route("/api/logout", post(auth::logout))
        .route("/api/check-auth", get(auth::check_auth))
        .route("/api/forgot-password", post(auth::forgot_password))
        .route("/api/reset-password", put(auth::reset_password))
        .route("/api/lansia", get(lansia::list).post(lansia::create))
        .route(
            "/api/lansia/{id}",
            get(lansia::detail)
                .put(lansia::update)
                .delete(lansia::delete),
        )
        .route("/api/lansia/bulk-delete", post(lansia::bulk_delete))
        .route("/api/filter-options", get(lansia::filter_options))
        .route("/api/lansia-locations", get(map::lansia_locations))
        .route("/api/dashboard/demographics", get(dashboard::demographics))
        .route("/api/dashboard/health", get(dashboard::health_stats))
        .route(
            "/api/dashboard/social-welfare",
            get(dashboard::social_welfare_stats),
        )
        .route(
            "/api/dashboard/needs-potential",
            get(dashboard::needs_potential),
        )
        .route(
            "/api/dashboard/urgent-need-details/{need}",
            get(dashboard::urgent_need_details),
        )
        .route("/api/export-template", get(upload::export_template))
        .route("/api/upload-excel", post(upload::upload_excel))
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until shutdown.
pub async fn start_server(state: AppState) -> Result<(), Box<dyn std::error::Error>> {
    let bind = state.config.bind.clone();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!(%bind, "lansiaku server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "lansiaku",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use crate::config::Config;

    // A lazy pool never connects, so routes that fail before their
    // first query are testable without a database.
    fn test_state(template_path: &str) -> AppState {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/lansiaku_test")
            .unwrap();
        let config = Config {
            database_url: "postgres://localhost/lansiaku_test".to_string(),
            bind: "127.0.0.1:0".to_string(),
            jwt_secret: "test-secret".to_string(),
            geojson_path: "static/data/rw_cipamokolan.geojson".to_string(),
            template_path: template_path.to_string(),
        };
        AppState::new(pool, config)
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let app = router(test_state("static/file/LansiaTemplate.xlsm"));
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_export_template_requires_token() {
        let app = router(test_state("static/file/LansiaTemplate.xlsm"));
        let response = app
            .oneshot(
                Request::get("/api/export-template")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_export_template_serves_file_with_token() {
        let path = std::env::temp_dir().join("lansiaku-template-test.xlsm");
        std::fs::write(&path, b"workbook bytes").unwrap();

        let state = test_state(path.to_str().unwrap());
        let token = state.jwt.issue(1, "admin", "admin").unwrap();
        let app = router(state);

        let response = app
            .oneshot(
                Request::get("/api/export-template")
                    .header("authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response
            .headers()
            .get("content-disposition")
            .and_then(|v| v.to_str().ok())
            .unwrap();
        assert!(disposition.contains("attachment"));
    }

    #[tokio::test]
    async fn test_upload_requires_token() {
        let app = router(test_state("static/file/LansiaTemplate.xlsm"));
        let response = app
            .oneshot(
                Request::post("/api/upload-excel")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
