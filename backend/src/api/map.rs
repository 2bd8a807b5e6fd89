//! Resident distribution map.

use axum::extract::State;
use axum::Json;
use tracing::warn;

use super::types::MapPoint;
use super::AppState;
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::geo::RwPolygons;

/// `GET /api/lansia-locations`
///
/// One point per visible resident. Stored coordinates (`"lat,lon"`) are
/// used as-is; residents without them get a random point inside their
/// RW polygon, or the kelurahan-wide polygon as a fallback. Residents
/// for whom no point can be produced are skipped.
pub async fn lansia_locations(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<MapPoint>>> {
    let scope = user.scope();

    #[derive(sqlx::FromRow)]
    struct LocationRow {
        koordinat: Option<String>,
        rw: Option<String>,
    }

    let rows: Vec<LocationRow> = sqlx::query_as(
        "SELECT koordinat, rw FROM lansia l WHERE ($1::text IS NULL OR l.rw = $1)",
    )
    .bind(scope.rw())
    .fetch_all(&state.pool)
    .await?;

    let polygons = RwPolygons::load(&state.config.geojson_path).map_err(ApiError::Internal)?;
    let mut rng = rand::thread_rng();

    let mut points = Vec::with_capacity(rows.len());
    for row in &rows {
        if let Some(point) = parse_koordinat(row.koordinat.as_deref()) {
            points.push(point);
            continue;
        }
        let rw = row.rw.as_deref().unwrap_or("");
        match polygons.random_point_for_rw(rw, &mut rng) {
            Some((latitude, longitude)) => points.push(MapPoint {
                latitude,
                longitude,
            }),
            None => warn!(rw, "no polygon point for resident, skipping"),
        }
    }

    Ok(Json(points))
}

/// Parse a stored `"lat,lon"` coordinate string. `"-"` marks absence.
fn parse_koordinat(raw: Option<&str>) -> Option<MapPoint> {
    let raw = raw.filter(|s| !s.trim().is_empty() && s.trim() != "-")?;
    let (lat, lon) = raw.split_once(',')?;
    Some(MapPoint {
        latitude: lat.trim().parse().ok()?,
        longitude: lon.trim().parse().ok()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_koordinat() {
        let point = parse_koordinat(Some("-6.9553, 107.6686")).unwrap();
        assert!((point.latitude - -6.9553).abs() < 1e-9);
        assert!((point.longitude - 107.6686).abs() < 1e-9);
    }

    #[test]
    fn test_parse_koordinat_placeholder() {
        assert!(parse_koordinat(Some("-")).is_none());
        assert!(parse_koordinat(Some("")).is_none());
        assert!(parse_koordinat(None).is_none());
    }

    #[test]
    fn test_parse_koordinat_garbage() {
        assert!(parse_koordinat(Some("not,numbers")).is_none());
        assert!(parse_koordinat(Some("123")).is_none());
    }
}
