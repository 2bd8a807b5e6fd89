//! Scoped aggregate statistics for the dashboard pages.
//!
//! Every aggregate joins back to `lansia` so the caller's RW scope
//! applies, and array-valued fields (chronic diseases, urgent needs) are
//! unnested so each element counts once.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use super::types::ReferenceDate;
use super::AppState;
use crate::auth::AuthUser;
use crate::error::ApiResult;

#[derive(Debug, Serialize, sqlx::FromRow)]
struct LabelCount {
    label: Option<String>,
    count: i64,
}

impl LabelCount {
    fn entry(&self, key: &str) -> Value {
        json!({ key: self.label, "count": self.count })
    }
}

/// `GET /api/dashboard/demographics`
pub async fn demographics(
    State(state): State<AppState>,
    user: AuthUser,
    Query(reference): Query<ReferenceDate>,
) -> ApiResult<Json<Value>> {
    let scope = user.scope();
    let reference = reference.or_today();

    let total: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM lansia l WHERE ($1::text IS NULL OR l.rw = $1)")
            .bind(scope.rw())
            .fetch_one(&state.pool)
            .await?;

    let by_gender: Vec<LabelCount> = sqlx::query_as(
        r#"
        SELECT jenis_kelamin AS label, COUNT(*) AS count
        FROM lansia l
        WHERE ($1::text IS NULL OR l.rw = $1)
        GROUP BY jenis_kelamin
        "#,
    )
    .bind(scope.rw())
    .fetch_all(&state.pool)
    .await?;

    let by_age_group: Vec<LabelCount> = sqlx::query_as(
        r#"
        SELECT CASE
            WHEN l.tanggal_lahir IS NULL THEN NULL
            WHEN EXTRACT(YEAR FROM age($2::date, l.tanggal_lahir)) < 60 THEN 'Belum Lansia'
            WHEN EXTRACT(YEAR FROM age($2::date, l.tanggal_lahir)) < 70 THEN 'Lansia Muda'
            WHEN EXTRACT(YEAR FROM age($2::date, l.tanggal_lahir)) < 80 THEN 'Lansia Madya'
            ELSE 'Lansia Tua'
        END AS label, COUNT(*) AS count
        FROM lansia l
        WHERE ($1::text IS NULL OR l.rw = $1)
        GROUP BY 1
        "#,
    )
    .bind(scope.rw())
    .bind(reference)
    .fetch_all(&state.pool)
    .await?;

    #[derive(sqlx::FromRow)]
    struct LocationCount {
        rt: Option<String>,
        rw: Option<String>,
        count: i64,
    }

    let by_location: Vec<LocationCount> = sqlx::query_as(
        r#"
        SELECT rt, rw, COUNT(*) AS count
        FROM lansia l
        WHERE ($1::text IS NULL OR l.rw = $1)
        GROUP BY rt, rw
        "#,
    )
    .bind(scope.rw())
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(json!({
        "total_lansia": total,
        "by_gender": by_gender.iter().map(|r| r.entry("gender")).collect::<Vec<_>>(),
        "by_age_group": by_age_group.iter().map(|r| r.entry("group")).collect::<Vec<_>>(),
        "by_location": by_location
            .iter()
            .map(|r| json!({ "rt": r.rt, "rw": r.rw, "count": r.count }))
            .collect::<Vec<_>>(),
    })))
}

/// `GET /api/dashboard/health`
pub async fn health_stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Value>> {
    let scope = user.scope();

    let conditions: Vec<LabelCount> = sqlx::query_as(
        r#"
        SELECT k.kondisi_kesehatan_umum AS label, COUNT(*) AS count
        FROM kesehatan_lansia k
        JOIN lansia l ON l.id = k.lansia_id
        WHERE ($1::text IS NULL OR l.rw = $1) AND k.kondisi_kesehatan_umum IS NOT NULL
        GROUP BY k.kondisi_kesehatan_umum
        "#,
    )
    .bind(scope.rw())
    .fetch_all(&state.pool)
    .await?;

    let chronic: Vec<LabelCount> = sqlx::query_as(
        r#"
        SELECT unnest(k.riwayat_penyakit_kronis) AS label, COUNT(*) AS count
        FROM kesehatan_lansia k
        JOIN lansia l ON l.id = k.lansia_id
        WHERE ($1::text IS NULL OR l.rw = $1) AND k.riwayat_penyakit_kronis IS NOT NULL
        GROUP BY 1
        ORDER BY count DESC
        "#,
    )
    .bind(scope.rw())
    .fetch_all(&state.pool)
    .await?;

    let nutrition: Vec<LabelCount> = sqlx::query_as(
        r#"
        SELECT k.status_gizi AS label, COUNT(*) AS count
        FROM kesehatan_lansia k
        JOIN lansia l ON l.id = k.lansia_id
        WHERE ($1::text IS NULL OR l.rw = $1) AND k.status_gizi IS NOT NULL
        GROUP BY k.status_gizi
        "#,
    )
    .bind(scope.rw())
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(json!({
        "health_conditions": conditions.iter().map(|r| r.entry("condition")).collect::<Vec<_>>(),
        "chronic_diseases": chronic.iter().map(|r| r.entry("disease")).collect::<Vec<_>>(),
        "nutrition_status": nutrition.iter().map(|r| r.entry("status")).collect::<Vec<_>>(),
    })))
}

/// `GET /api/dashboard/social-welfare`
pub async fn social_welfare_stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Value>> {
    let scope = user.scope();

    let housing: Vec<LabelCount> = sqlx::query_as(
        r#"
        SELECT ks.kondisi_rumah AS label, COUNT(*) AS count
        FROM kesejahteraan_sosial ks
        JOIN lansia l ON l.id = ks.lansia_id
        WHERE ($1::text IS NULL OR l.rw = $1) AND ks.kondisi_rumah IS NOT NULL
        GROUP BY ks.kondisi_rumah
        "#,
    )
    .bind(scope.rw())
    .fetch_all(&state.pool)
    .await?;

    let urgent: Vec<LabelCount> = sqlx::query_as(
        r#"
        SELECT unnest(ks.kebutuhan_mendesak) AS label, COUNT(*) AS count
        FROM kesejahteraan_sosial ks
        JOIN lansia l ON l.id = ks.lansia_id
        WHERE ($1::text IS NULL OR l.rw = $1) AND ks.kebutuhan_mendesak IS NOT NULL
        GROUP BY 1
        ORDER BY count DESC
        "#,
    )
    .bind(scope.rw())
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(json!({
        "housing_conditions": housing.iter().map(|r| r.entry("condition")).collect::<Vec<_>>(),
        "urgent_needs": urgent.iter().map(|r| r.entry("need")).collect::<Vec<_>>(),
    })))
}

/// `GET /api/dashboard/needs-potential`
pub async fn needs_potential(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Value>> {
    let scope = user.scope();

    let participation: Vec<LabelCount> = sqlx::query_as(
        r#"
        SELECT p.partisipasi_program_bkl AS label, COUNT(*) AS count
        FROM keluarga_pendamping p
        JOIN lansia l ON l.id = p.lansia_id
        WHERE ($1::text IS NULL OR l.rw = $1) AND p.partisipasi_program_bkl IS NOT NULL
        GROUP BY p.partisipasi_program_bkl
        "#,
    )
    .bind(scope.rw())
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(json!({
        "participation": participation.iter().map(|r| r.entry("group")).collect::<Vec<_>>(),
    })))
}

/// `GET /api/dashboard/urgent-need-details/{need}`
///
/// Residents whose urgent-need list contains the given entry.
pub async fn urgent_need_details(
    State(state): State<AppState>,
    user: AuthUser,
    Path(need): Path<String>,
) -> ApiResult<Json<Value>> {
    let scope = user.scope();

    #[derive(Serialize, sqlx::FromRow)]
    struct NeedRow {
        id: i32,
        nama_lengkap: String,
        nik: String,
        alamat_lengkap: Option<String>,
        rt: Option<String>,
        rw: Option<String>,
        kebutuhan: Option<Vec<String>>,
    }

    let rows: Vec<NeedRow> = sqlx::query_as(
        r#"
        SELECT l.id, l.nama_lengkap, l.nik, l.alamat_lengkap, l.rt, l.rw,
               ks.kebutuhan_mendesak AS kebutuhan
        FROM lansia l
        JOIN kesejahteraan_sosial ks ON ks.lansia_id = l.id
        WHERE ($1::text IS NULL OR l.rw = $1)
          AND ks.kebutuhan_mendesak @> ARRAY[$2]
        ORDER BY l.nama_lengkap
        "#,
    )
    .bind(scope.rw())
    .bind(&need)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(json!(rows)))
}
