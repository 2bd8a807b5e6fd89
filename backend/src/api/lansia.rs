//! Resident CRUD, listing and bulk delete.
//!
//! Every read goes through the caller's [`RoleScope`]: the scope's RW is
//! bound as an optional parameter and checked as
//! `($n::text IS NULL OR l.rw = $n)`, so elevated roles see all rows and
//! RW-scoped roles only their own. Age-group filtering happens in SQL
//! against the request's reference date, since age is never stored.
//!
//! [`RoleScope`]: crate::auth::RoleScope

use axum::extract::{Path, Query, State};
use axum::{http::StatusCode, Json};
use chrono::NaiveDate;
use serde_json::{json, Value};
use tracing::info;

use super::types::{
    BulkDeleteRequest, CreateLansiaRequest, FilterOptions, LansiaListQuery, LansiaListResponse,
    LansiaSummary, ReferenceDate, UpdateLansiaRequest,
};
use super::AppState;
use crate::auth::AuthUser;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    kategori_adl, kelompok_usia, usia, DailyLiving, Kesehatan, Kesejahteraan, Lansia, Pendamping,
    AGE_GROUPS,
};

/// Age-group bucket label computed in SQL, `$A` standing for the
/// reference-date placeholder.
const KELOMPOK_USIA_SQL: &str = r#"
    CASE
        WHEN l.tanggal_lahir IS NULL THEN NULL
        WHEN EXTRACT(YEAR FROM age($A::date, l.tanggal_lahir)) < 60 THEN 'Belum Lansia'
        WHEN EXTRACT(YEAR FROM age($A::date, l.tanggal_lahir)) < 70 THEN 'Lansia Muda'
        WHEN EXTRACT(YEAR FROM age($A::date, l.tanggal_lahir)) < 80 THEN 'Lansia Madya'
        ELSE 'Lansia Tua'
    END
"#;

/// Shared WHERE clause of the list and count queries. Binds:
/// `$1` scope RW, `$2` search pattern, `$3` gender, `$4` RW filter,
/// `$5` age group, `$6` reference date.
fn list_where() -> String {
    format!(
        r#"
        WHERE ($1::text IS NULL OR l.rw = $1)
          AND ($2::text IS NULL
               OR l.nama_lengkap ILIKE $2
               OR l.nik ILIKE $2
               OR l.alamat_lengkap ILIKE $2)
          AND ($3::text IS NULL OR l.jenis_kelamin = $3)
          AND ($4::text IS NULL OR l.rw = $4)
          AND ($5::text IS NULL OR {} = $5)
        "#,
        KELOMPOK_USIA_SQL.replace("$A", "$6")
    )
}

#[derive(sqlx::FromRow)]
struct ListRow {
    id: i32,
    nama_lengkap: String,
    nik: String,
    jenis_kelamin: Option<String>,
    tanggal_lahir: Option<NaiveDate>,
    rt: Option<String>,
    rw: Option<String>,
    status_perkawinan: Option<String>,
    koordinat: Option<String>,
    adl_total: Option<i32>,
}

impl ListRow {
    fn into_summary(self, reference: NaiveDate) -> LansiaSummary {
        let age = self.tanggal_lahir.map(|b| usia(b, reference));
        LansiaSummary {
            id: self.id,
            nama_lengkap: self.nama_lengkap,
            nik: self.nik,
            jenis_kelamin: self.jenis_kelamin,
            usia: age,
            rt: self.rt,
            rw: self.rw,
            kelompok_usia: age.map(kelompok_usia),
            nilai_adl: self.adl_total.map(kategori_adl),
            status_perkawinan: self.status_perkawinan,
            koordinat: self.koordinat,
        }
    }
}

/// `GET /api/lansia`
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<LansiaListQuery>,
) -> ApiResult<Json<LansiaListResponse>> {
    let scope = user.scope();
    let reference = query.reference();
    let (per_page, offset) = query.window();
    let search = query.search.as_ref().map(|s| format!("%{s}%"));

    // Sorting by age means sorting by birth date in the opposite
    // direction.
    let (column, flip) = match query.sort_by.as_str() {
        "nik" => ("l.nik", false),
        "usia" => ("l.tanggal_lahir", true),
        "jenis_kelamin" => ("l.jenis_kelamin", false),
        "rt" => ("l.rt", false),
        "rw" => ("l.rw", false),
        _ => ("l.nama_lengkap", false),
    };
    let descending = query.sort_order.eq_ignore_ascii_case("desc") != flip;
    let direction = if descending { "DESC" } else { "ASC" };

    let where_clause = list_where();
    let total: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM lansia l {where_clause}"
    ))
    .bind(scope.rw())
    .bind(&search)
    .bind(&query.gender)
    .bind(&query.rw)
    .bind(&query.age_group)
    .bind(reference)
    .fetch_one(&state.pool)
    .await?;

    let rows: Vec<ListRow> = sqlx::query_as(&format!(
        r#"
        SELECT l.id, l.nama_lengkap, l.nik, l.jenis_kelamin, l.tanggal_lahir,
               l.rt, l.rw, l.status_perkawinan, l.koordinat,
               d.total AS adl_total
        FROM lansia l
        LEFT JOIN daily_living d ON d.lansia_id = l.id
        {where_clause}
        ORDER BY {column} {direction} NULLS LAST, l.id ASC
        LIMIT $7 OFFSET $8
        "#
    ))
    .bind(scope.rw())
    .bind(&search)
    .bind(&query.gender)
    .bind(&query.rw)
    .bind(&query.age_group)
    .bind(reference)
    .bind(per_page)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(LansiaListResponse {
        data: rows
            .into_iter()
            .map(|r| r.into_summary(reference))
            .collect(),
        total,
        pages: (total + per_page - 1) / per_page,
        current_page: query.page.max(1),
        per_page,
    }))
}

/// `POST /api/lansia`
pub async fn create(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(req): Json<CreateLansiaRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let nik = req
        .lansia
        .nik
        .as_deref()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Error: NIK wajib diisi".to_string()))?;
    if req
        .lansia
        .nama_lengkap
        .as_deref()
        .filter(|n| !n.is_empty())
        .is_none()
    {
        return Err(ApiError::BadRequest(
            "Error: Nama lengkap wajib diisi".to_string(),
        ));
    }

    if db::nik_exists(&state.pool, nik).await? {
        return Err(ApiError::BadRequest(format!(
            "Error: NIK {nik} sudah terdaftar"
        )));
    }

    let mut txn = state.pool.begin().await?;
    let id = db::insert_lansia(&mut *txn, &req.lansia).await?;
    db::upsert_kesehatan(&mut *txn, id, &req.kesehatan).await?;
    db::upsert_kesejahteraan(&mut *txn, id, &req.kesejahteraan).await?;
    db::upsert_pendamping(&mut *txn, id, &req.pendamping).await?;
    db::upsert_daily_living(&mut *txn, id, &req.daily_living).await?;
    txn.commit().await?;

    info!(id, nik, "lansia created");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Data lansia berhasil ditambahkan", "id": id })),
    ))
}

/// `GET /api/lansia/{id}`
pub async fn detail(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
    Query(reference): Query<ReferenceDate>,
) -> ApiResult<Json<Value>> {
    let scope = user.scope();
    let reference = reference.or_today();

    let lansia: Option<Lansia> = sqlx::query_as(
        r#"
        SELECT id, nama_lengkap, nik, jenis_kelamin, tanggal_lahir, alamat_lengkap,
               koordinat, rt, rw, status_perkawinan, agama, pendidikan_terakhir,
               pekerjaan_terakhir, sumber_penghasilan
        FROM lansia l
        WHERE id = $1 AND ($2::text IS NULL OR l.rw = $2)
        "#,
    )
    .bind(id)
    .bind(scope.rw())
    .fetch_optional(&state.pool)
    .await?;

    let lansia =
        lansia.ok_or_else(|| ApiError::NotFound("Data lansia tidak ditemukan".to_string()))?;

    let kesehatan: Option<Kesehatan> = sqlx::query_as(
        r#"
        SELECT kondisi_kesehatan_umum, riwayat_penyakit_kronis, penggunaan_obat_rutin,
               alat_bantu, aktivitas_fisik, status_gizi, riwayat_imunisasi
        FROM kesehatan_lansia WHERE lansia_id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&state.pool)
    .await?;

    let kesejahteraan: Option<Kesejahteraan> = sqlx::query_as(
        r#"
        SELECT dukungan_keluarga, kondisi_rumah, kebutuhan_mendesak, hobi_minat,
               kondisi_psikologis
        FROM kesejahteraan_sosial WHERE lansia_id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&state.pool)
    .await?;

    let keluarga: Option<Pendamping> = sqlx::query_as(
        r#"
        SELECT nama_pendamping, hubungan_dengan_lansia, tanggal_lahir_pendamping,
               pendidikan_pendamping, ketersediaan_waktu, partisipasi_program_bkl,
               riwayat_partisipasi_bkl, keterlibatan_data
        FROM keluarga_pendamping WHERE lansia_id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&state.pool)
    .await?;

    let daily_living: Option<DailyLiving> = sqlx::query_as(
        r#"
        SELECT bab, bak, membersihkan_diri, toilet, makan, pindah_tempat,
               mobilitas, berpakaian, naik_turun_tangga, mandi, total
        FROM daily_living WHERE lansia_id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&state.pool)
    .await?;

    let keluarga_json = keluarga.map(|k| {
        json!({
            "nama_pendamping": k.nama_pendamping,
            "hubungan_dengan_lansia": k.hubungan_dengan_lansia,
            "tanggal_lahir_pendamping": k.tanggal_lahir_pendamping,
            "usia": k.usia(reference),
            "pendidikan_pendamping": k.pendidikan_pendamping,
            "ketersediaan_waktu": k.ketersediaan_waktu,
            "partisipasi_program_bkl": k.partisipasi_program_bkl,
            "riwayat_partisipasi_bkl": k.riwayat_partisipasi_bkl,
            "keterlibatan_data": k.keterlibatan_data,
        })
    });

    let daily_living_json = daily_living.map(|d| {
        json!({
            "bab": d.bab,
            "bak": d.bak,
            "membersihkan_diri": d.membersihkan_diri,
            "toilet": d.toilet,
            "makan": d.makan,
            "pindah_tempat": d.pindah_tempat,
            "mobilitas": d.mobilitas,
            "berpakaian": d.berpakaian,
            "naik_turun_tangga": d.naik_turun_tangga,
            "mandi": d.mandi,
            "total": d.total,
            "kategori": d.kategori(),
        })
    });

    Ok(Json(json!({
        "id": lansia.id,
        "nama_lengkap": lansia.nama_lengkap,
        "nik": lansia.nik,
        "jenis_kelamin": lansia.jenis_kelamin,
        "tanggal_lahir": lansia.tanggal_lahir,
        "usia": lansia.usia(reference),
        "kelompok_usia": lansia.kelompok_usia(reference),
        "alamat_lengkap": lansia.alamat_lengkap,
        "koordinat": lansia.koordinat,
        "rt": lansia.rt,
        "rw": lansia.rw,
        "status_perkawinan": lansia.status_perkawinan,
        "agama": lansia.agama,
        "pendidikan_terakhir": lansia.pendidikan_terakhir,
        "pekerjaan_terakhir": lansia.pekerjaan_terakhir,
        "sumber_penghasilan": lansia.sumber_penghasilan,
        "kesehatan": kesehatan,
        "kesejahteraan": kesejahteraan,
        "keluarga": keluarga_json,
        "daily_living": daily_living_json,
    })))
}

/// `PUT /api/lansia/{id}`
///
/// Overwrites the resident record and replaces every supplied child
/// record wholesale. The ADL total is recomputed, never taken from the
/// payload.
pub async fn update(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i32>,
    Json(req): Json<UpdateLansiaRequest>,
) -> ApiResult<Json<Value>> {
    let nik = req
        .lansia
        .nik
        .as_deref()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Error: Terdapat data yang kosong".to_string()))?;
    if req
        .lansia
        .nama_lengkap
        .as_deref()
        .filter(|n| !n.is_empty())
        .is_none()
    {
        return Err(ApiError::BadRequest(
            "Error: Terdapat data yang kosong".to_string(),
        ));
    }

    let taken: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM lansia WHERE nik = $1 AND id <> $2)")
            .bind(nik)
            .bind(id)
            .fetch_one(&state.pool)
            .await?;
    if taken {
        return Err(ApiError::BadRequest(format!(
            "Error: NIK {nik} sudah terdaftar"
        )));
    }

    let mut txn = state.pool.begin().await?;
    if !db::update_lansia(&mut *txn, id, &req.lansia).await? {
        return Err(ApiError::NotFound("Data lansia tidak ditemukan".to_string()));
    }
    db::upsert_kesehatan(&mut *txn, id, &req.kesehatan).await?;
    db::upsert_kesejahteraan(&mut *txn, id, &req.kesejahteraan).await?;
    db::upsert_pendamping(&mut *txn, id, &req.keluarga).await?;
    db::upsert_daily_living(&mut *txn, id, &req.daily_living).await?;
    txn.commit().await?;

    info!(id, "lansia updated");
    Ok(Json(json!({ "message": "Data lansia berhasil diperbarui", "id": id })))
}

/// `DELETE /api/lansia/{id}`
pub async fn delete(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i32>,
) -> ApiResult<Json<Value>> {
    let result = sqlx::query("DELETE FROM lansia WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Data lansia tidak ditemukan".to_string()));
    }
    info!(id, "lansia deleted");
    Ok(Json(json!({ "message": "Data lansia berhasil dihapus" })))
}

/// `POST /api/lansia/bulk-delete`
pub async fn bulk_delete(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(req): Json<BulkDeleteRequest>,
) -> ApiResult<Json<Value>> {
    if req.ids.is_empty() {
        return Err(ApiError::BadRequest("No IDs provided".to_string()));
    }

    let result = sqlx::query("DELETE FROM lansia WHERE id = ANY($1)")
        .bind(&req.ids)
        .execute(&state.pool)
        .await?;
    let deleted = result.rows_affected();

    info!(deleted, "lansia bulk delete");
    Ok(Json(json!({
        "message": format!("{deleted} data lansia berhasil dihapus"),
        "deleted_count": deleted,
    })))
}

/// `GET /api/filter-options`
pub async fn filter_options(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<FilterOptions>> {
    let scope = user.scope();

    let genders: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT DISTINCT jenis_kelamin FROM lansia l
        WHERE ($1::text IS NULL OR l.rw = $1) AND jenis_kelamin IS NOT NULL
        ORDER BY jenis_kelamin
        "#,
    )
    .bind(scope.rw())
    .fetch_all(&state.pool)
    .await?;

    let rws: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT DISTINCT rw FROM lansia l
        WHERE ($1::text IS NULL OR l.rw = $1) AND rw IS NOT NULL
        ORDER BY rw
        "#,
    )
    .bind(scope.rw())
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(FilterOptions {
        genders,
        age_groups: AGE_GROUPS.to_vec(),
        rws,
    }))
}
